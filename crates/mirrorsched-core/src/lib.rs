pub mod config;
pub mod logging;

pub mod catalog;
pub mod control;
pub mod job;
pub mod plan;
pub mod runner;
pub mod scheduler;
pub mod throttle;
pub mod window;
