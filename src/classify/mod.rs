//! Process classification for annotating reports.

pub mod chrome;

// Re-export main types
pub use chrome::{format_browser_groups, BrowserGroup, ChromeProcessMap};

/// Maps a process id to a short category such as `renderer` or `gpu-process`
pub trait ProcessClassifier {
    fn category(&self, pid: u32) -> Option<&str>;
}
