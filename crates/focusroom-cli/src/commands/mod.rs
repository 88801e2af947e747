pub mod config;
pub mod sessions;
pub mod settings;
pub mod stats;
pub mod timer;

/// `25:00` style countdown.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
