pub mod assetfinder;
pub mod crtsh;
pub mod findomain;
pub mod github;
pub mod subfinder;
pub mod web_archive;

use super::Module;
use crate::domain::Domain;
use crate::model::{SourceKind, SourceResult, SourceStatus};
use crate::normalize::OutputFormat;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

// time left to a cancelled producer before it is dropped
const CANCEL_GRACE_MS: u64 = 2000;

#[async_trait]
pub trait SubdomainModule: Module + Send + Sync {
    fn kind(&self) -> SourceKind;

    fn format(&self) -> OutputFormat;

    fn budget(&self) -> Duration;

    /// Program that must be installed before any source runs.
    fn required_program(&self) -> Option<&str> {
        None
    }

    /// Reason not to run at all this time, e.g. a missing credential.
    fn skip_reason(&self) -> Option<String> {
        None
    }

    /// Raw output for `domain`. Implementations stop when `cancel` fires and
    /// return what they have in `Error::SourceTimeout`.
    async fn produce(&self, domain: &Domain, cancel: &CancellationToken) -> Result<String>;
}

/// Run one source within its budget. Every failure ends up in the returned result.
#[instrument(name = "source", level = "info", fields(module = %module.name()), skip_all)]
pub async fn run(module: Arc<dyn SubdomainModule>, domain: Domain) -> SourceResult {
    let name = module.name();
    let format = module.format();

    if let Some(reason) = module.skip_reason() {
        return SourceResult::skipped(&name, format, reason);
    }

    let budget = module.budget();
    let cancel = CancellationToken::new();
    let started = Instant::now();

    let deadline = async {
        sleep(budget).await;
        debug!("Budget of {:?} exhausted, cancelling", budget);
        cancel.cancel();
        sleep(Duration::from_millis(CANCEL_GRACE_MS)).await;
    };

    let outcome = tokio::select! {
        res = module.produce(&domain, &cancel) => Some(res),
        _ = deadline => None,
    };
    let elapsed = started.elapsed();

    match outcome {
        Some(Ok(raw)) => SourceResult::success(&name, format, raw, elapsed),
        Some(Err(Error::SourceTimeout { partial })) => SourceResult::degraded(
            &name,
            format,
            SourceStatus::TimedOut,
            partial,
            format!("budget of {}s exceeded", budget.as_secs_f32()),
            elapsed,
        ),
        Some(Err(err)) => SourceResult::degraded(
            &name,
            format,
            SourceStatus::Failed,
            String::new(),
            err.to_string(),
            elapsed,
        ),
        None => {
            warn!("Producer ignored cancellation, dropped");
            SourceResult::degraded(
                &name,
                format,
                SourceStatus::TimedOut,
                String::new(),
                format!("budget of {}s exceeded", budget.as_secs_f32()),
                elapsed,
            )
        }
    }
}
