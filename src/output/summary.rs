use std::fmt::Write;

use comfy_table::Cell;

use crate::analysis::AnalysisView;
use crate::insights::BatchSummary;
use crate::model::{CanonicalStatus, Pipeline, RepositoryCredential};

use super::styling::{bright, bright_red, bright_yellow, cyan, dim, status_badge};
use super::tables::{create_table, cyan_header, optional_cell, status_cell};

const STARTED_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Prints one card per pipeline, each with its stage table.
pub fn print_pipelines(pipelines: &[Pipeline]) {
    println!("{}", render_pipelines(pipelines));
}

/// Prints status counts, versions and failure reasons for a batch.
pub fn print_batch_summary(summary: &BatchSummary) {
    println!("{}", render_batch_summary(summary));
}

pub fn print_analysis(view: &AnalysisView<'_>) {
    println!("{}", render_analysis(view));
}

pub fn print_history(credentials: &[RepositoryCredential]) {
    println!("{}", render_history(credentials));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn render_author(pipeline: &Pipeline) -> String {
    match &pipeline.commit.email {
        Some(email) => format!("{} <{email}>", pipeline.commit.author),
        None => pipeline.commit.author.clone(),
    }
}

fn render_card(output: &mut String, pipeline: &Pipeline) {
    let _ = writeln!(
        output,
        "{} {}  {}",
        bright("📦"),
        bright(&pipeline.name).underlined(),
        status_badge(pipeline.status)
    );
    let _ = writeln!(
        output,
        "  {} {} {}\n  {} {}\n  {} {}\n  {} {}",
        dim("Commit:  "),
        cyan(pipeline.commit.short_id()),
        pipeline.commit.title(),
        dim("Author:  "),
        render_author(pipeline),
        dim("Started: "),
        pipeline.started_at.format(STARTED_FORMAT),
        dim("Duration:"),
        bright_yellow(&pipeline.duration),
    );
    if let Some(version) = &pipeline.version_tag {
        let _ = writeln!(output, "  {} {}", dim("Version: "), version);
    }
    if let Some(url) = &pipeline.url {
        let _ = writeln!(output, "  {} {}", dim("URL:     "), url);
    }

    if pipeline.stages.is_empty() {
        let _ = writeln!(output, "  {}", dim("No jobs recorded"));
    } else {
        let mut stages = create_table();
        stages.set_header(cyan_header(&["Stage", "Status", "Failure Reason"]));
        for stage in &pipeline.stages {
            stages.add_row(vec![
                Cell::new(&stage.name),
                status_cell(stage.status),
                optional_cell(stage.failure_reason.as_deref(), "-"),
            ]);
        }
        let _ = writeln!(output, "{stages}");
    }

    for stage in &pipeline.stages {
        if let Some(reason) = &stage.failure_reason {
            let _ = writeln!(
                output,
                "  {} {}",
                bright_red(format!("❌ {} failed:", stage.name)),
                reason
            );
        }
    }
}

fn render_pipelines(pipelines: &[Pipeline]) -> String {
    let mut output = String::new();

    if pipelines.is_empty() {
        let _ = writeln!(output, "{}", bright_yellow("No pipelines found."));
        return output;
    }

    for pipeline in pipelines {
        render_card(&mut output, pipeline);
        output.push('\n');
    }

    output
}

fn render_batch_summary(summary: &BatchSummary) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Overview");
    let _ = writeln!(
        output,
        "  {} {}",
        dim("Pipelines:"),
        bright_yellow(summary.total_pipelines)
    );
    for status in CanonicalStatus::ALL {
        let count = summary.count(status);
        if count > 0 {
            let _ = writeln!(output, "  {} {}", status_badge(status), count);
        }
    }
    if !summary.versions.is_empty() {
        let _ = writeln!(
            output,
            "  {} {}",
            dim("Versions:"),
            summary.versions.join(", ")
        );
    }
    output.push('\n');

    if !summary.failure_reasons.is_empty() {
        add_section_header(&mut output, "❌", "Failure Reasons");
        let mut table = create_table();
        table.set_header(cyan_header(&["Reason", "Pipelines"]));
        for (reason, count) in &summary.failure_reasons {
            table.add_row(vec![Cell::new(reason), Cell::new(count)]);
        }
        let _ = writeln!(output, "{table}\n");
    }

    output
}

fn render_analysis(view: &AnalysisView<'_>) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📋", "Pipelines");

    if view.rows.is_empty() {
        let _ = writeln!(
            output,
            "{}",
            bright_yellow("No pipelines match the current filters.")
        );
        return output;
    }

    let mut table = create_table();
    table.set_header(cyan_header(&[
        "Pipeline", "Version", "Status", "Started", "Duration",
    ]));
    for pipeline in &view.rows {
        table.add_row(vec![
            Cell::new(&pipeline.name),
            optional_cell(pipeline.version_tag.as_deref(), "N/A"),
            status_cell(pipeline.status),
            Cell::new(pipeline.started_at.format(STARTED_FORMAT)),
            Cell::new(&pipeline.duration),
        ]);
    }

    let _ = writeln!(output, "{table}");
    let _ = writeln!(
        output,
        "  {}",
        dim(format!(
            "Page {} of {} ({} pipelines)",
            view.page,
            view.page_count.max(1),
            view.total
        ))
    );

    output
}

fn render_history(credentials: &[RepositoryCredential]) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "🕘", "Recent Repositories");

    if credentials.is_empty() {
        let _ = writeln!(output, "{}", bright_yellow("No repositories analyzed yet."));
        return output;
    }

    let mut table = create_table();
    table.set_header(cyan_header(&["#", "Repository", "Token"]));
    for (idx, credential) in credentials.iter().enumerate() {
        table.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(&credential.url),
            Cell::new(credential.token.masked()),
        ]);
    }
    let _ = writeln!(output, "{table}");

    output
}
