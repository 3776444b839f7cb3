//! Terminal progress bars for job phases.

use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use vlmap_core::Progress;

/// Renders each job phase as its own progress bar (or spinner when the
/// number of steps is unknown).
#[derive(Default)]
pub struct BarProgress {
    current: RefCell<Option<(String, ProgressBar)>>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Progress for BarProgress {
    fn start(&self, phase: &str, total: Option<u64>) {
        let pb = match total {
            Some(total) => create_progress_bar(total),
            None => create_spinner(),
        };
        pb.set_message(phase.to_string());
        if let Some((_, previous)) = self.current.replace(Some((phase.to_string(), pb))) {
            previous.finish_and_clear();
        }
    }

    fn advance(&self, n: u64) {
        if let Some((_, pb)) = self.current.borrow().as_ref() {
            pb.inc(n);
        }
    }

    fn finish(&self, summary: &str) {
        if let Some((phase, pb)) = self.current.borrow_mut().take() {
            pb.finish_with_message(format!("{phase}: {summary}"));
        }
    }
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}

fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb
}
