use crate::normalize::OutputFormat;
use crate::Result;
use serde::Serialize;
use serde_json::to_string_pretty;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as FmtWrite;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

// region:        --- Models

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    LocalTool,
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Success,
    TimedOut,
    Failed,
    Skipped,
}

/// Outcome of one source against one domain. `error` is set iff status is not success.
#[derive(Debug, Clone)]
pub struct SourceResult {
    pub source: String,
    pub format: OutputFormat,
    pub status: SourceStatus,
    pub raw: String,
    pub error: Option<String>,
    pub elapsed: Duration,
}

impl SourceResult {
    pub fn success(source: &str, format: OutputFormat, raw: String, elapsed: Duration) -> Self {
        Self {
            source: source.to_string(),
            format,
            status: SourceStatus::Success,
            raw,
            error: None,
            elapsed,
        }
    }

    pub fn degraded(
        source: &str,
        format: OutputFormat,
        status: SourceStatus,
        raw: String,
        error: String,
        elapsed: Duration,
    ) -> Self {
        Self {
            source: source.to_string(),
            format,
            status,
            raw,
            error: Some(error),
            elapsed,
        }
    }

    pub fn skipped(source: &str, format: OutputFormat, reason: String) -> Self {
        Self::degraded(
            source,
            format,
            SourceStatus::Skipped,
            String::new(),
            reason,
            Duration::ZERO,
        )
    }

    pub fn is_success(&self) -> bool {
        self.status == SourceStatus::Success
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub source: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FinalSet {
    pub subdomains: BTreeSet<String>,
    pub raw_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct SourceReport {
    pub name: String,
    pub status: SourceStatus,
    pub raw_count: usize,
    pub elapsed_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub domain: String,
    pub started_at: String,
    pub duration_ms: u128,
    pub total: usize,
    pub sources: Vec<SourceReport>,
    pub subdomains: Vec<String>,
}

impl Report {
    pub fn degraded_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources
            .iter()
            .filter(|source| source.status != SourceStatus::Success)
    }
}

// endregion:     --- Models

// region:        --- Exporting utils

pub fn ensure_dir(dir: &Path) -> Result<bool> {
    if dir.is_dir() {
        Ok(false)
    } else {
        fs::create_dir_all(dir)?;
        Ok(true)
    }
}

pub fn write_lines<'a>(lines: impl IntoIterator<Item = &'a str>, path: &Path) -> Result<usize> {
    let mut content = String::new();
    let mut count = 0;
    for line in lines {
        writeln!(&mut content, "{}", line)?;
        count += 1;
    }

    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(count)
}

pub fn export_to_json(report: &Report, path: &Path) -> Result<()> {
    let json = to_string_pretty(report)?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

pub fn export_to_markdown(report: &Report, path: &Path) -> Result<()> {
    let mut md_content = String::new();
    writeln!(&mut md_content, "# Subdomains of `{}`", report.domain)?;
    writeln!(&mut md_content)?;
    writeln!(
        &mut md_content,
        "Run started at {} and took {:.1}s, **{}** unique subdomains found.",
        report.started_at,
        report.duration_ms as f64 / 1000.0,
        report.total
    )?;

    writeln!(&mut md_content)?;
    writeln!(&mut md_content, "## Sources")?;
    writeln!(&mut md_content)?;
    writeln!(&mut md_content, "| Source | Status | Candidates | Detail |")?;
    writeln!(&mut md_content, "|---|---|---|---|")?;
    for source in &report.sources {
        writeln!(
            &mut md_content,
            "| {} | {:?} | {} | {} |",
            source.name,
            source.status,
            source.raw_count,
            source.error.as_deref().unwrap_or("")
        )?;
    }

    writeln!(&mut md_content)?;
    writeln!(&mut md_content, "## Subdomains")?;
    if report.subdomains.is_empty() {
        writeln!(&mut md_content)?;
        writeln!(&mut md_content, "No subdomain found for this domain")?;
    } else {
        writeln!(&mut md_content)?;
        for subdomain in &report.subdomains {
            writeln!(&mut md_content, "- {}", subdomain)?;
        }
    }

    let mut file = File::create(path)?;
    file.write_all(md_content.as_bytes())?;
    Ok(())
}

// endregion:     --- Exporting utils
