//! Progress bar for batch calls.

use filehandler_core::Progress;
use indicatif::{ProgressBar, ProgressStyle};

/// `indicatif` bar driven by the dispatch core.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    /// A visible bar on stderr.
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("template is compile-time constant")
                .progress_chars("█▓▒░  "),
        );
        Self { bar }
    }

    /// A bar that draws nothing.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl Progress for BarProgress {
    fn start(&self, total: usize, label: &str) {
        self.bar.reset();
        self.bar.set_length(total as u64);
        self.bar.set_message(label.to_string());
    }

    fn advance(&self) {
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
