use super::SubdomainModule;
use crate::domain::Domain;
use crate::model::SourceKind;
use crate::modules::{fetch_text, Module};
use crate::normalize::OutputFormat;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

const BUDGET_SECS: u64 = 90;

// region:        --- Module info

pub struct WebArchive {
    http_client: Client,
    base_url: String,
    budget: Duration,
}

impl WebArchive {
    pub fn new(http_client: Client, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            budget: Duration::from_secs(BUDGET_SECS),
        }
    }
}

impl Module for WebArchive {
    fn name(&self) -> String {
        "webarchive".to_string()
    }

    fn description(&self) -> String {
        "Use web.archive.org to find subdomains".to_string()
    }
}

// endregion:     --- Module info

#[async_trait]
impl SubdomainModule for WebArchive {
    fn kind(&self) -> SourceKind {
        SourceKind::Http
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::UrlLines
    }

    fn budget(&self) -> Duration {
        self.budget
    }

    #[instrument(name = "produce", level = "debug", fields(module = %self.name()), skip_all)]
    async fn produce(&self, domain: &Domain, cancel: &CancellationToken) -> Result<String> {
        let url = format!(
            "{}/cdx/search/cdx?url=*.{}/*&output=text&fl=original&collapse=urlkey",
            self.base_url, domain
        );
        let body = fetch_text(&self.http_client, &url, self.budget, cancel).await?;

        debug!("{} archived urls", body.lines().count());
        Ok(body)
    }
}
