//! Progress bar display for installation runs

use indicatif::{ProgressBar, ProgressStyle};

/// Progress display for the top-level installation steps
pub struct ProgressDisplay {
    /// One tick per step
    step_pb: ProgressBar,
}

impl ProgressDisplay {
    /// Create a new progress display with total step count
    pub fn new(total_steps: u64) -> Self {
        let step_style = ProgressStyle::default_bar()
            .template("Progress: |{bar:30.cyan/blue}| {pos}/{len} {percent}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉-");

        let step_pb = ProgressBar::new(total_steps);
        step_pb.set_style(step_style);

        Self { step_pb }
    }

    /// Show the step currently running
    pub fn start_step(&self, description: &str, current: usize) {
        self.step_pb.set_position(current.saturating_sub(1) as u64);
        self.step_pb.set_message(description.to_string());
    }

    /// Count the step as done
    pub fn finish_step(&self, current: usize) {
        self.step_pb.set_position(current as u64);
    }

    /// Run `f` with the bar hidden so printed lines do not tear it
    pub fn suspend<F: FnOnce()>(&self, f: F) {
        self.step_pb.suspend(f);
    }

    pub fn finish(&self) {
        self.step_pb.finish_with_message("Complete");
    }

    /// Abandon on error
    pub fn abandon(&self) {
        self.step_pb.abandon();
    }
}
