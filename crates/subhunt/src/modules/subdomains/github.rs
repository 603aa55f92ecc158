use super::SubdomainModule;
use crate::domain::Domain;
use crate::model::SourceKind;
use crate::modules::{find_program, run_tool, Module};
use crate::normalize::OutputFormat;
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

const PROGRAM: &str = "github-subdomains";
const BUDGET_SECS: u64 = 120;

// region:        --- Module info

/// Optional source: runs only with a GitHub token and the tool installed.
pub struct GithubSubdomains {
    token: Option<String>,
    program: String,
    budget: Duration,
}

impl GithubSubdomains {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|token| !token.trim().is_empty()),
            program: PROGRAM.to_string(),
            budget: Duration::from_secs(BUDGET_SECS),
        }
    }
}

impl Module for GithubSubdomains {
    fn name(&self) -> String {
        "github".to_string()
    }

    fn description(&self) -> String {
        "Search GitHub code for subdomains (needs GITHUB_TOKEN)".to_string()
    }
}

// endregion:     --- Module info

#[async_trait]
impl SubdomainModule for GithubSubdomains {
    fn kind(&self) -> SourceKind {
        SourceKind::LocalTool
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Lines
    }

    fn budget(&self) -> Duration {
        self.budget
    }

    fn skip_reason(&self) -> Option<String> {
        if self.token.is_none() {
            return Some("GITHUB_TOKEN not set, skipping GitHub enumeration".to_string());
        }
        if find_program(&self.program).is_none() {
            return Some(format!(
                "{} not found, skipping GitHub enumeration",
                self.program
            ));
        }
        None
    }

    #[instrument(name = "produce", level = "debug", fields(module = %self.name()), skip_all)]
    async fn produce(&self, domain: &Domain, cancel: &CancellationToken) -> Result<String> {
        let token = self.token.clone().unwrap_or_default();
        let args = vec![
            "-d".to_string(),
            domain.to_string(),
            "-t".to_string(),
            token,
        ];
        run_tool(&self.program, &args, cancel).await
    }
}
