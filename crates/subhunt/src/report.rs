use crate::domain::Domain;
use crate::model::{FinalSet, Report, SourceReport, SourceResult};
use std::time::Duration;

/// Build the run report. Every source that ran appears, with 0 when it contributed nothing.
pub fn summarize(
    domain: &Domain,
    final_set: &FinalSet,
    results: &[SourceResult],
    started_at: String,
    duration: Duration,
) -> Report {
    let sources = results
        .iter()
        .map(|result| SourceReport {
            name: result.source.clone(),
            status: result.status,
            raw_count: final_set
                .raw_counts
                .get(&result.source)
                .copied()
                .unwrap_or(0),
            elapsed_ms: result.elapsed.as_millis(),
            error: result.error.clone(),
        })
        .collect();

    Report {
        domain: domain.to_string(),
        started_at,
        duration_ms: duration.as_millis(),
        total: final_set.subdomains.len(),
        sources,
        subdomains: final_set.subdomains.iter().cloned().collect(),
    }
}
