mod exports;
mod progress;
mod styling;
mod summary;
mod tables;

pub use exports::{export_json, export_to_dir};
pub use progress::PhaseProgress;
pub use styling::{bright_green, bright_red};
use styling::{dim, magenta_bold};
pub use summary::{print_analysis, print_batch_summary, print_history, print_pipelines};

/// Prints the `pipemon` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🚦 pipemon"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("GitLab Pipeline Monitor")
    );
}
