use crate::config::Config;
use crate::domain::Domain;
use crate::merge::merge;
use crate::model::{
    export_to_json, export_to_markdown, write_lines, Candidate, Report, SourceResult, SourceStatus,
};
use crate::modules::subdomains::{self, SubdomainModule};
use crate::modules::{self, Module};
use crate::normalize::normalize;
use crate::report::summarize;
use crate::{Error, Result};
use futures::{stream, StreamExt};
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::signal;
use tracing::{debug, error, info, instrument, warn};

// region:        --- Engine

/// Runs every source of a registry against one domain.
pub struct Engine {
    concurrency: usize,
}

impl Engine {
    pub fn new(config: &Config) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
        }
    }

    /// One result per source, in registry order, whatever happened to each source.
    #[instrument(name = "engine", level = "info", skip_all, fields(domain = %domain))]
    pub async fn run_all(
        &self,
        domain: &Domain,
        sources: &[Arc<dyn SubdomainModule>],
    ) -> Vec<SourceResult> {
        info!("{} sources, {} at a time", sources.len(), self.concurrency);

        let mut results: Vec<(usize, SourceResult)> = stream::iter(sources.iter().enumerate())
            .map(|(index, module)| run_isolated(index, module.clone(), domain.clone()))
            .buffer_unordered(self.concurrency)
            .inspect(|(_, result)| log_result(result))
            .collect()
            .await;

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, result)| result).collect()
    }
}

/// Run a source in its own task so a panicking source only takes itself down.
async fn run_isolated(
    index: usize,
    module: Arc<dyn SubdomainModule>,
    domain: Domain,
) -> (usize, SourceResult) {
    let name = module.name();
    let format = module.format();

    let result = match tokio::spawn(subdomains::run(module, domain)).await {
        Ok(result) => result,
        Err(err) => SourceResult::degraded(
            &name,
            format,
            SourceStatus::Failed,
            String::new(),
            format!("source task aborted: {}", err),
            Duration::ZERO,
        ),
    };
    (index, result)
}

fn log_result(result: &SourceResult) {
    match result.status {
        SourceStatus::Success => info!(
            "{}: done in {:.1}s ({} bytes)",
            result.source,
            result.elapsed.as_secs_f32(),
            result.raw.len()
        ),
        status => warn!(
            "{}: {:?}, {}",
            result.source,
            status,
            result.error.as_deref().unwrap_or("no detail")
        ),
    }
}

// endregion:     --- Engine

// region:        --- Scan main function

#[tokio::main]
#[instrument(name = "scan", level = "info", skip_all)]
pub async fn scan(config: &Config) -> Result<Report> {
    tokio::select! {
        res = enumerate(config) => res,
        _ = signal::ctrl_c() => {
            error!("Scan interrupted by user");
            Err(Error::Interrupted)
        }
    }
}

pub async fn enumerate(config: &Config) -> Result<Report> {
    let http_client = Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    debug!("HTTP Client created: {:?}", http_client);

    let sources = modules::registry(config, &http_client)?;
    enumerate_with(config, &sources).await
}

/// Whole pipeline over the given sources: run, normalize, merge, report, write artifacts.
pub async fn enumerate_with(
    config: &Config,
    sources: &[Arc<dyn SubdomainModule>],
) -> Result<Report> {
    modules::check_dependencies(sources)?;

    let started_at = OffsetDateTime::now_utc().format(&Rfc3339)?;
    let started = Instant::now();
    info!("Starting subdomain enumeration for: {}", config.domain);

    let results = Engine::new(config).run_all(&config.domain, sources).await;

    // normalize per source
    let per_source: Vec<Vec<Candidate>> = results.iter().map(normalize).collect();
    for (result, candidates) in results.iter().zip(&per_source) {
        let path = config.run_dir.join(format!("{}.txt", result.source));
        write_lines(candidates.iter().map(|c| c.name.as_str()), &path)?;

        // kept aside, never merged
        if result.status == SourceStatus::TimedOut && !result.raw.is_empty() {
            let path = config.run_dir.join(format!("{}.partial.txt", result.source));
            let count = write_lines(result.raw.lines(), &path)?;
            info!("{}: {} lines of partial output in {}", result.source, count, path.display());
        }
    }

    // merge
    let candidates: Vec<Candidate> = per_source.into_iter().flatten().collect();
    let final_set = merge(&candidates, &config.domain);
    write_lines(
        final_set.subdomains.iter().map(String::as_str),
        &config.run_dir.join("final.txt"),
    )?;

    let report = summarize(
        &config.domain,
        &final_set,
        &results,
        started_at,
        started.elapsed(),
    );
    export_report(config, &report)?;

    Ok(report)
}

fn export_report(config: &Config, report: &Report) -> Result<()> {
    if config.export.json() {
        export_to_json(report, &config.run_dir.join("report.json"))?;
    }
    if config.export.markdown() {
        export_to_markdown(report, &config.run_dir.join("report.md"))?;
    }
    Ok(())
}

// endregion:     --- Scan main function
