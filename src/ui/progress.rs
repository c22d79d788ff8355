use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use crate::collector::PageProgress;

pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = if console::Term::stdout().is_term() && !crate::output::is_quiet() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    pub fn set_message(&self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }

    pub fn finish_and_clear(&self) {
        self.pb.finish_and_clear();
    }
}

/// Page-by-page bar for a collection run, bounded by the page cap
pub struct PageBar {
    pb: ProgressBar,
}

impl PageBar {
    pub fn new(category: &str, max_pages: u32) -> Self {
        let pb = if console::Term::stdout().is_term() && !crate::output::is_quiet() {
            ProgressBar::new(max_pages as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) =
            ProgressStyle::with_template("{spinner} {msg} [{bar:30}] page {pos}/{len}")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb.set_message(format!("Collecting {}", category));
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    pub fn update(&self, progress: PageProgress) {
        self.pb.set_position(progress.page as u64);
        self.pb.set_message(format!("{} records", progress.total_records));
    }

    pub fn finish_and_clear(&self) {
        self.pb.finish_and_clear();
    }
}
