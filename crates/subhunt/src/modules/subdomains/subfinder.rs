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

const PROGRAM: &str = "subfinder";
const BUDGET_SECS: u64 = 300;

// region:        --- Module info

pub struct Subfinder {
    budget: Duration,
}

impl Subfinder {
    pub fn new() -> Self {
        Self {
            budget: Duration::from_secs(BUDGET_SECS),
        }
    }

    fn args(&self, domain: &Domain) -> Vec<String> {
        vec![
            "-d".to_string(),
            domain.to_string(),
            "-all".to_string(),
            "-recursive".to_string(),
            "-silent".to_string(),
        ]
    }
}

impl Module for Subfinder {
    fn name(&self) -> String {
        "subfinder".to_string()
    }

    fn description(&self) -> String {
        "Run subfinder with every passive source, recursively".to_string()
    }
}

// endregion:     --- Module info

#[async_trait]
impl SubdomainModule for Subfinder {
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
        run_tool(PROGRAM, &self.args(domain), cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_domain_and_flags() {
        let domain = Domain::validate("example.com").unwrap();
        assert_eq!(
            Subfinder::new().args(&domain),
            ["-d", "example.com", "-all", "-recursive", "-silent"]
        );
    }
}
