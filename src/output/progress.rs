use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_yellow};

/// Progress tracking for the two fetch phases
pub struct PhaseProgress {
    pb: ProgressBar,
}

impl PhaseProgress {
    pub fn start_listing(project: &str) -> Self {
        eprintln!("{}  {}", bright("⚙️"), bright(project).underlined());
        let pb = create_spinner(bright_yellow("Phase 1/2: Listing pipelines").to_string());
        Self { pb }
    }

    pub fn finish_listing_start_details(self, pipeline_count: usize) -> Self {
        self.pb.finish_with_message(
            bright_green(format!("Phase 1/2: Found {pipeline_count} pipelines ✓")).to_string(),
        );
        let pb = create_spinner(
            bright_yellow("Phase 2/2: Fetching details, commits and jobs").to_string(),
        );
        Self { pb }
    }

    pub fn finish_details(self) {
        self.pb.finish_with_message(
            bright_green("Phase 2/2: Pipeline details fetched ✓").to_string(),
        );
        eprintln!();
    }

    pub fn abandon(self) {
        self.pb.abandon();
        eprintln!();
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::default_spinner().template("  {msg} {spinner}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
