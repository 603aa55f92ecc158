use super::SubdomainModule;
use crate::domain::Domain;
use crate::model::SourceKind;
use crate::modules::{run_tool, Module};
use crate::normalize::OutputFormat;
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

const PROGRAM: &str = "findomain";
const BUDGET_SECS: u64 = 240;

// region:        --- Module info

pub struct Findomain {
    budget: Duration,
}

impl Findomain {
    pub fn new() -> Self {
        Self {
            budget: Duration::from_secs(BUDGET_SECS),
        }
    }
}

impl Module for Findomain {
    fn name(&self) -> String {
        "findomain".to_string()
    }

    fn description(&self) -> String {
        "Run findomain in quiet mode".to_string()
    }
}

// endregion:     --- Module info

#[async_trait]
impl SubdomainModule for Findomain {
    fn kind(&self) -> SourceKind {
        SourceKind::LocalTool
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Lines
    }

    fn budget(&self) -> Duration {
        self.budget
    }

    fn required_program(&self) -> Option<&str> {
        Some(PROGRAM)
    }

    #[instrument(name = "produce", level = "debug", fields(module = %self.name()), skip_all)]
    async fn produce(&self, domain: &Domain, cancel: &CancellationToken) -> Result<String> {
        let args = vec!["-t".to_string(), domain.to_string(), "--quiet".to_string()];
        run_tool(PROGRAM, &args, cancel).await
    }
}
