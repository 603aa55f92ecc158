use crate::domain::Domain;
use std::path::{Path, PathBuf};

// concurrency numbers
pub const SUBDOMAINS_ENUMERATION_CONCURRENCY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Markdown,
    Both,
    None,
}

impl ExportFormat {
    pub fn from_arg(arg: &str) -> Self {
        match arg {
            "json" => ExportFormat::Json,
            "md" => ExportFormat::Markdown,
            "none" => ExportFormat::None,
            _ => ExportFormat::Both,
        }
    }

    pub fn json(&self) -> bool {
        matches!(self, ExportFormat::Json | ExportFormat::Both)
    }

    pub fn markdown(&self) -> bool {
        matches!(self, ExportFormat::Markdown | ExportFormat::Both)
    }
}

/// Everything one run needs, fixed before the first source starts.
#[derive(Debug, Clone)]
pub struct Config {
    pub domain: Domain,
    pub run_dir: PathBuf,
    pub github_token: Option<String>,
    pub sources: Option<Vec<String>>,
    pub concurrency: usize,
    pub export: ExportFormat,
    pub save_logs: bool,
}

impl Config {
    pub fn new(domain: Domain, output_root: &Path) -> Self {
        let run_dir = output_root.join(format!("results_{}", domain));
        Self {
            domain,
            run_dir,
            github_token: None,
            sources: None,
            concurrency: SUBDOMAINS_ENUMERATION_CONCURRENCY,
            export: ExportFormat::Both,
            save_logs: false,
        }
    }

    /// Whether the source named `name` takes part in this run.
    pub fn wants(&self, name: &str) -> bool {
        self.sources
            .as_ref()
            .map_or(true, |sources| sources.iter().any(|source| source == name))
    }
}
