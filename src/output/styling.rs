use console::style;

use crate::model::CanonicalStatus;

/// Styling helpers for terminal output
pub fn bright_yellow(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn bright_green(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn bright_red(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().red()
}

pub fn cyan(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).cyan()
}

pub fn dim(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn bright(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright()
}

pub fn magenta_bold(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

pub fn status_badge(status: CanonicalStatus) -> console::StyledObject<String> {
    match status {
        CanonicalStatus::Success => bright_green(status.capitalized()),
        CanonicalStatus::Error => bright_red(status.capitalized()),
        CanonicalStatus::Warning | CanonicalStatus::Pending => bright_yellow(status.capitalized()),
        CanonicalStatus::Running => cyan(status.capitalized()),
        CanonicalStatus::Skipped => dim(status.capitalized()),
    }
}
