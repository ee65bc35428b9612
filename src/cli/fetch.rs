//! Fetch command implementation.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cli::args::{Cli, FetchArgs, OutputFormat};
use crate::core::fetch_plan::FetchOutcome;
use crate::core::http::HttpClient;
use crate::core::models::{AnyRecord, SourcePayload};
use crate::core::pipeline::{FetchContext, fetch_sources};
use crate::core::source::{Source, SourceSelection};
use crate::error::{Result, StatError};
use crate::render;
use crate::storage::cache::{FileStore, KeyValueStore};
use crate::storage::config::{ResolvedConfig, SourceConfig, identity_env_var};
use crate::util::time::from_epoch_ms;

/// Rendered payloads plus per-source failures.
#[derive(Debug)]
pub struct FetchResults {
    pub payloads: Vec<SourcePayload>,
    pub failures: Vec<(Source, StatError)>,
}

impl FetchResults {
    /// `source: message` lines for output.
    #[must_use]
    pub fn error_lines(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|(source, e)| format!("{source}: {e}"))
            .collect()
    }

    /// Collapse failures into the command's result.
    ///
    /// A single failed source surfaces its own error (and exit code).
    fn into_result(self) -> Result<()> {
        let failed = self.failures.len();
        match (self.payloads.is_empty(), self.failures.into_iter().next()) {
            (_, None) => Ok(()),
            (true, Some((_, error))) if failed == 1 => Err(error),
            _ => Err(StatError::PartialFailure { failed }),
        }
    }
}

/// Execute the fetch command.
///
/// # Errors
///
/// Returns the single source's error, or `PartialFailure` when several
/// sources ran and any failed.
pub async fn execute(cli: &Cli, args: &FetchArgs) -> Result<()> {
    args.validate()?;
    let selection = SourceSelection::from_args(&args.sources)?;
    let cfg = ResolvedConfig::resolve(cli, Some(args))?;

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("Interrupted; cancelling in-flight fetches");
                cancel.cancel();
            }
        })
    };

    let results = fetch(&cfg, &selection, args.refresh, cancel).await;
    interrupt.abort();
    let results = results?;

    let errors = results.error_lines();
    let output = render::render_fetch(
        &results.payloads,
        &errors,
        cfg.format,
        cfg.pretty,
        cfg.no_color,
    )?;
    if !output.is_empty() {
        println!("{}", output.trim_end());
    }
    if cfg.format == OutputFormat::Human && results.payloads.len() + results.failures.len() > 1 {
        for error in &errors {
            eprintln!("Error: {error}");
        }
    }

    results.into_result()
}

/// Pick the sources to run.
///
/// `all` means every source with an identity; naming a source explicitly
/// runs it even without one, so the missing identity is reported.
///
/// # Errors
///
/// Returns `Config` when `all` is requested and nothing is configured.
pub fn plan(cfg: &ResolvedConfig, selection: &SourceSelection) -> Result<Vec<(Source, SourceConfig)>> {
    let mut requests = Vec::new();
    for source in selection.sources() {
        let settings = cfg.source(source)?;
        if matches!(selection, SourceSelection::All) && settings.identity.is_none() {
            tracing::debug!(source = %source, "No identity configured; skipping");
            continue;
        }
        requests.push((source, settings.clone()));
    }

    if requests.is_empty() {
        let hint = Source::ALL
            .iter()
            .map(|s| identity_env_var(*s))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(StatError::Config(format!(
            "no source has an identity configured (set --identity, {hint}, or [sources.<name>] identity)"
        )));
    }
    Ok(requests)
}

/// Run the selected sources against the configured cache directory.
///
/// # Errors
///
/// Returns an error only for setup failures; per-source failures are
/// collected in the results.
pub async fn fetch(
    cfg: &ResolvedConfig,
    selection: &SourceSelection,
    refresh: bool,
    cancel: CancellationToken,
) -> Result<FetchResults> {
    let requests = plan(cfg, selection)?;
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(cfg.records_dir()));
    let client = HttpClient::new(cfg.timeout)?;
    let mut ctx = FetchContext::new(store, client).with_force_refresh(refresh);
    ctx.cancel = cancel;

    tracing::debug!(
        sources = ?requests.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
        cache_dir = %cfg.cache_dir.display(),
        refresh,
        "Starting fetch"
    );

    let outcomes = fetch_sources(&requests, &ctx).await;
    Ok(collect(&requests, outcomes))
}

fn collect(
    requests: &[(Source, SourceConfig)],
    outcomes: Vec<FetchOutcome<AnyRecord>>,
) -> FetchResults {
    let mut payloads = Vec::new();
    let mut failures = Vec::new();

    for ((_, settings), outcome) in requests.iter().zip(outcomes) {
        match outcome.result {
            Ok(resolved) => {
                let summary = match &resolved.record {
                    AnyRecord::Activity(activity) => activity.summary(),
                    AnyRecord::Profile(_) => None,
                };
                payloads.push(SourcePayload {
                    source: outcome.source,
                    identity: settings.identity.clone().unwrap_or_default(),
                    origin: resolved.origin,
                    fetched_at: from_epoch_ms(resolved.fetched_at),
                    data: resolved.record,
                    summary,
                });
            }
            Err(e) => failures.push((outcome.source, e)),
        }
    }

    FetchResults { payloads, failures }
}
