//! Filter, sort and paginate over an already-fetched pipeline batch.
//!
//! The view state only changes through [`AnalysisState::reduce`], and
//! [`AnalysisState::view`] never mutates the source batch, so clearing a
//! filter or sort always yields the original order again.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::model::{CanonicalStatus, Pipeline};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Version,
    Status,
    StartedAt,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "version" => Ok(Self::Version),
            "status" => Ok(Self::Status),
            "started" | "started-at" => Ok(Self::StartedAt),
            other => Err(format!(
                "unknown sort field '{other}' (expected name, version, status or started)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig {
    pub field: SortField,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    /// Case-insensitive substring of the pipeline name
    pub name: String,
    pub status: Option<CanonicalStatus>,
    /// Case-insensitive substring of the version tag
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisState {
    pub filters: Filters,
    pub sort: Option<SortConfig>,
    /// 1-based
    pub page: usize,
}

impl Default for AnalysisState {
    fn default() -> Self {
        Self {
            filters: Filters::default(),
            sort: None,
            page: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetNameFilter(String),
    SetStatusFilter(Option<CanonicalStatus>),
    SetVersionFilter(String),
    SortBy(SortField),
    GoToPage(usize),
    Reset,
}

/// One page of the filtered, sorted batch.
#[derive(Debug)]
pub struct AnalysisView<'a> {
    pub rows: Vec<&'a Pipeline>,
    /// Pipelines left after filtering
    pub total: usize,
    /// Page actually shown, after clamping
    pub page: usize,
    pub page_count: usize,
}

impl AnalysisState {
    #[must_use]
    pub fn reduce(self, action: Action) -> Self {
        match action {
            Action::SetNameFilter(name) => Self {
                filters: Filters { name, ..self.filters },
                page: 1,
                ..self
            },
            Action::SetStatusFilter(status) => Self {
                filters: Filters {
                    status,
                    ..self.filters
                },
                page: 1,
                ..self
            },
            Action::SetVersionFilter(version) => Self {
                filters: Filters {
                    version,
                    ..self.filters
                },
                page: 1,
                ..self
            },
            Action::SortBy(field) => {
                let direction = match self.sort {
                    Some(current) if current.field == field => current.direction.toggled(),
                    _ => SortDirection::Ascending,
                };
                Self {
                    sort: Some(SortConfig { field, direction }),
                    ..self
                }
            }
            Action::GoToPage(page) => Self { page, ..self },
            Action::Reset => Self::default(),
        }
    }

    /// Pipelines matching every active filter, in sort order (source order
    /// when unsorted).
    pub fn filtered<'a>(&self, source: &'a [Pipeline]) -> Vec<&'a Pipeline> {
        let name = self.filters.name.to_lowercase();
        let version = self.filters.version.to_lowercase();

        let mut rows: Vec<&Pipeline> = source
            .iter()
            .filter(|p| name.is_empty() || p.name.to_lowercase().contains(&name))
            .filter(|p| self.filters.status.map_or(true, |status| p.status == status))
            .filter(|p| {
                version.is_empty()
                    || p.version_tag
                        .as_deref()
                        .is_some_and(|tag| tag.to_lowercase().contains(&version))
            })
            .collect();

        if let Some(sort) = self.sort {
            // sort_by is stable: equal keys keep their source order
            rows.sort_by(|a, b| {
                let ordering = compare(a, b, sort.field);
                match sort.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        rows
    }

    /// Filters, sorts and slices out the requested page.
    ///
    /// Out-of-range pages clamp to `[1, page_count]`; an empty result still
    /// reports page 1.
    pub fn view<'a>(&self, source: &'a [Pipeline], page_size: usize) -> AnalysisView<'a> {
        let page_size = page_size.max(1);
        let rows = self.filtered(source);
        let total = rows.len();
        let page_count = total.div_ceil(page_size);
        let page = self.page.clamp(1, page_count.max(1));

        let rows = rows
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();

        AnalysisView {
            rows,
            total,
            page,
            page_count,
        }
    }
}

fn compare(a: &Pipeline, b: &Pipeline, field: SortField) -> Ordering {
    match field {
        SortField::Name => a.name.cmp(&b.name),
        SortField::Version => a.version_tag.cmp(&b.version_tag),
        SortField::Status => a.status.as_str().cmp(b.status.as_str()),
        SortField::StartedAt => a.started_at.cmp(&b.started_at),
    }
}
