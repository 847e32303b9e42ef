//! Job scheduler.
//!
//! A single coordinator loop owns all run state. Each job runs as its own
//! task holding one slot of a fixed-size budget; the coordinator polls the
//! task handles, reclassifies finished jobs, refills free slots in input
//! order, and tears everything down when the stop signal or a run window
//! demands a hard stop.

mod budget;
mod progress;
mod run;
mod state;
mod summary;

pub use budget::{SlotBudget, SlotGuard};
pub use progress::ProgressStats;
pub use run::{Scheduler, SchedulerSettings};
pub use state::JobState;
pub use summary::{StopReason, Summary, Termination};

#[cfg(test)]
mod tests;
