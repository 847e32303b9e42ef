//! `mirrorsched window` – is running permitted right now?

use mirrorsched_core::config::MirrorConfig;
use mirrorsched_core::window::{self, Clock, SystemClock};

pub fn run_window(cfg: &MirrorConfig) {
    let now = SystemClock.now();
    let stamp = now.format("%a %Y-%m-%d %H:%M:%S");
    if cfg.run_windows.is_empty() {
        println!("{}: permitted (no run windows configured)", stamp);
        return;
    }
    match window::blocking_window(&cfg.run_windows, now) {
        Some(w) => println!("{}: blocked by window {}", stamp, w),
        None => println!("{}: permitted", stamp),
    }
}
