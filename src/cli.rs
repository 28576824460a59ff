use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use log::info;
use std::io;
use std::path::{Path, PathBuf};

use crate::analysis::{Action, AnalysisState, SortField};
use crate::auth::Token;
use crate::config::Config;
use crate::insights::BatchSummary;
use crate::model::{CanonicalStatus, Pipeline};
use crate::output::{
    bright_green, bright_red, export_json, export_to_dir, print_analysis, print_batch_summary,
    print_history, print_pipelines,
};
use crate::providers::DateWindow;
use crate::session::Session;
use crate::store::{CredentialStore, FileBackend};

#[derive(Parser)]
#[command(name = "pipemon")]
#[command(author, version, about = "GitLab Pipeline Monitor", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./pipemon.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch recent pipelines of one repository
    Fetch {
        /// Repository URL, e.g. https://gitlab.com/group/project.git
        url: String,

        /// Access token; falls back to the stored token for this URL
        #[arg(short, long, env = "GITLAB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Only pipelines updated on or after this day (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Only pipelines updated on or before this day (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        #[arg(short, long)]
        limit: Option<usize>,

        /// Pipelines whose details are fetched at once
        #[arg(long)]
        concurrency: Option<usize>,

        /// Write a CSV export (pipelines_YYYY-MM-DD.csv) into DIR
        /// (config export-dir or . when omitted)
        #[arg(short, long, value_name = "DIR", num_args = 0..=1)]
        export: Option<Option<PathBuf>>,

        /// Print the normalized pipelines as JSON instead of cards
        #[arg(long, default_value_t = false)]
        json: bool,

        #[arg(short, long, default_value_t = false)]
        pretty: bool,
    },
    /// Fetch every stored repository and filter, sort and page the result
    Analyze {
        /// Case-insensitive substring of the pipeline name
        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        status: Option<CanonicalStatus>,

        /// Case-insensitive substring of the version tag
        #[arg(short, long)]
        version: Option<String>,

        /// name, version, status or started; repeat a field to reverse it
        #[arg(long)]
        sort: Vec<SortField>,

        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long)]
        page_size: Option<usize>,

        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,

        /// Write the filtered pipelines as a CSV export (pipelines_YYYY-MM-DD.csv) into DIR
        #[arg(short, long, value_name = "DIR", num_args = 0..=1)]
        export: Option<Option<PathBuf>>,

        /// Print the current page as JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,

        #[arg(short, long, default_value_t = false)]
        pretty: bool,
    },
    /// List previously analyzed repositories
    History,
}

/// Folds the command-line options into an analysis state the same way
/// interactive edits would be applied.
fn analysis_state(
    name: Option<&str>,
    status: Option<CanonicalStatus>,
    version: Option<&str>,
    sort: &[SortField],
    page: usize,
) -> AnalysisState {
    let mut state = AnalysisState::default();

    if let Some(name) = name {
        state = state.reduce(Action::SetNameFilter(name.to_string()));
    }
    if status.is_some() {
        state = state.reduce(Action::SetStatusFilter(status));
    }
    if let Some(version) = version {
        state = state.reduce(Action::SetVersionFilter(version.to_string()));
    }
    for field in sort {
        state = state.reduce(Action::SortBy(*field));
    }

    state.reduce(Action::GoToPage(page))
}

fn date_window(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<DateWindow> {
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            bail!("--from ({from}) must not be after --to ({to})");
        }
    }

    Ok(DateWindow {
        from: from.map(|day| Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))),
        to: to
            .and_then(|day| day.and_hms_opt(23, 59, 59))
            .map(|end| Utc.from_utc_datetime(&end)),
    })
}

fn open_store(config: &Config) -> Result<CredentialStore<FileBackend>> {
    let backend = match &config.store.path {
        Some(path) => FileBackend::new(path),
        None => FileBackend::default_location()?,
    };
    info!("Using credential store at {}", backend.path().display());
    CredentialStore::open(backend).context("Failed to open credential store")
}

fn export_dir<'a>(requested: &'a Option<Option<PathBuf>>, config: &'a Config) -> Option<&'a Path> {
    match requested {
        Some(Some(dir)) => Some(dir.as_path()),
        Some(None) => Some(config.output.export_dir.as_deref().unwrap_or(Path::new("."))),
        None => None,
    }
}

fn write_export(dir: &Path, pipelines: &[Pipeline]) -> Result<()> {
    let path = export_to_dir(dir, pipelines, Local::now().date_naive(), &Local)?;
    eprintln!("{} {}", bright_green("✓ Exported"), path.display());
    Ok(())
}

impl Cli {
    #[allow(clippy::too_many_arguments)]
    async fn execute_fetch(
        &self,
        config: &Config,
        url: &str,
        token: Option<&str>,
        window: DateWindow,
        limit: Option<usize>,
        concurrency: Option<usize>,
        export: Option<&Path>,
        json: bool,
        pretty: bool,
    ) -> Result<()> {
        let store = open_store(config)?;

        let token = match token {
            Some(token) => Token::from(token),
            None => match store.get(url.trim()) {
                Some(credential) => credential.token.clone(),
                None => bail!("No token given for {url}; pass --token or set GITLAB_TOKEN"),
            },
        };

        let mut settings = config.gitlab.fetch_settings();
        if let Some(limit) = limit {
            settings.limit = limit;
        }
        if let Some(concurrency) = concurrency {
            settings.concurrency = concurrency;
        }

        let mut session = Session::new(store, config.gitlab.api_url.clone(), settings);
        let pipelines = session.fetch(url, token, &window).await?;

        if json {
            export_json(&pipelines, pretty || config.output.pretty, &mut io::stdout())?;
        } else {
            print_pipelines(&pipelines);
            print_batch_summary(&BatchSummary::from_pipelines(&pipelines));
        }

        if let Some(dir) = export {
            write_export(dir, &pipelines)?;
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute_analyze(
        &self,
        config: &Config,
        state: AnalysisState,
        page_size: Option<usize>,
        window: DateWindow,
        export: Option<&Path>,
        json: bool,
        pretty: bool,
    ) -> Result<()> {
        let session = Session::new(
            open_store(config)?,
            config.gitlab.api_url.clone(),
            config.gitlab.fetch_settings(),
        );
        if session.store().list().is_empty() {
            bail!("No stored repositories yet; run `pipemon fetch <URL>` first");
        }

        let outcome = session.fetch_all(&window).await;

        for (url, e) in &outcome.failures {
            eprintln!("{} {url}: {e}", bright_red("✗"));
        }

        let view = state.view(
            &outcome.pipelines,
            page_size.unwrap_or(config.output.page_size),
        );

        if json {
            let rows: Vec<Pipeline> = view.rows.iter().map(|p| (*p).clone()).collect();
            export_json(&rows, pretty || config.output.pretty, &mut io::stdout())?;
        } else {
            print_batch_summary(&BatchSummary::from_pipelines(&outcome.pipelines));
            print_analysis(&view);
        }

        if let Some(dir) = export {
            let filtered: Vec<Pipeline> = state
                .filtered(&outcome.pipelines)
                .into_iter()
                .cloned()
                .collect();
            write_export(dir, &filtered)?;
        }

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::Fetch {
                url,
                token,
                from,
                to,
                limit,
                concurrency,
                export,
                json,
                pretty,
            } => {
                let window = date_window(*from, *to)?;
                self.execute_fetch(
                    &config,
                    url,
                    token.as_deref(),
                    window,
                    *limit,
                    *concurrency,
                    export_dir(export, &config),
                    *json,
                    *pretty,
                )
                .await
            }
            Commands::Analyze {
                name,
                status,
                version,
                sort,
                page,
                page_size,
                from,
                to,
                export,
                json,
                pretty,
            } => {
                let state =
                    analysis_state(name.as_deref(), *status, version.as_deref(), sort, *page);
                let window = date_window(*from, *to)?;
                self.execute_analyze(
                    &config,
                    state,
                    *page_size,
                    window,
                    export_dir(export, &config),
                    *json,
                    *pretty,
                )
                .await
            }
            Commands::History => {
                let store = open_store(&config)?;
                print_history(store.list());
                Ok(())
            }
        }
    }
}
