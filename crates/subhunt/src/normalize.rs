use crate::model::{Candidate, SourceResult};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{trace, warn};

/// Shape of the raw output a source produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One name per line.
    Lines,
    /// crt.sh JSON array, names in `name_value` (possibly several per entry).
    CrtShJson,
    /// One URL per line, host is the candidate.
    UrlLines,
}

/// Turn a source result into its distinct candidates, in first-seen order.
pub fn normalize(result: &SourceResult) -> Vec<Candidate> {
    if !result.is_success() {
        return Vec::new();
    }

    let raw_names: Vec<String> = match result.format {
        OutputFormat::Lines => result.raw.lines().map(str::to_string).collect(),
        OutputFormat::UrlLines => result.raw.lines().map(|url| host_of(url).to_string()).collect(),
        // entries without a string `name_value` are skipped one by one
        OutputFormat::CrtShJson => match serde_json::from_str::<Vec<Value>>(&result.raw) {
            Ok(entries) => entries
                .iter()
                .filter_map(|entry| entry.get("name_value")?.as_str())
                .flat_map(str::lines)
                .map(str::to_string)
                .collect(),
            Err(err) => {
                warn!("{}: unreadable JSON output ({})", result.source, err);
                Vec::new()
            }
        },
    };

    let mut seen = HashSet::new();
    raw_names
        .iter()
        .filter_map(|name| canonical(name))
        .filter(|name| seen.insert(name.clone()))
        .inspect(|name| trace!("{}: {}", result.source, name))
        .map(|name| Candidate {
            name,
            source: result.source.clone(),
        })
        .collect()
}

/// Host part of a URL-shaped line: no scheme, path, query or port.
fn host_of(url: &str) -> &str {
    let url = url.trim();
    let url = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let end = url.find(['/', '?', '#']).unwrap_or(url.len());
    let host = &url[..end];
    match host.find(':') {
        Some(port) => &host[..port],
        None => host,
    }
}

fn canonical(name: &str) -> Option<String> {
    let mut name = name.trim();
    while let Some(rest) = name.strip_prefix("*.") {
        name = rest;
    }

    let mut name = name.to_ascii_lowercase();
    if let Some(rest) = name.strip_prefix("www.") {
        if rest.contains('.') {
            name = rest.to_string();
        }
    }

    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceStatus;
    use std::time::Duration;

    fn result(format: OutputFormat, raw: &str) -> SourceResult {
        SourceResult::success("test", format, raw.to_string(), Duration::ZERO)
    }

    fn names(candidates: Vec<Candidate>) -> Vec<String> {
        candidates.into_iter().map(|c| c.name).collect()
    }

    #[test]
    fn lines_are_trimmed_and_blank_lines_dropped() {
        let res = result(OutputFormat::Lines, "  a.example.com \n\n\tb.example.com\n   \n");
        assert_eq!(names(normalize(&res)), ["a.example.com", "b.example.com"]);
    }

    #[test]
    fn wildcards_are_stripped() {
        let res = result(OutputFormat::Lines, "*.api.example.com\n*.*.deep.example.com");
        assert_eq!(
            names(normalize(&res)),
            ["api.example.com", "deep.example.com"]
        );
    }

    #[test]
    fn names_are_case_folded_and_deduplicated() {
        let res = result(OutputFormat::Lines, "API.Example.com\napi.example.com\nwww.example.com");
        let candidates = normalize(&res);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].name, "api.example.com");
        assert_eq!(candidates[0].source, "test");
        assert_eq!(candidates[1].name, "example.com");
    }

    #[test]
    fn crtsh_entries_are_split_and_missing_fields_ignored() {
        let raw = r#"[
            {"name_value": "*.b.example.com"},
            {"issuer_name": "C=US, O=Let's Encrypt"},
            {"name_value": "c.example.com\nd.example.com"},
            {"name_value": null}
        ]"#;
        let res = result(OutputFormat::CrtShJson, raw);
        assert_eq!(
            names(normalize(&res)),
            ["b.example.com", "c.example.com", "d.example.com"]
        );
    }

    #[test]
    fn odd_crtsh_entries_do_not_hide_good_ones() {
        let raw = r#"[
            {"name_value": "a.example.com"},
            {"name_value": 5},
            "junk",
            {"name_value": ["x.example.com"]},
            {"name_value": "e.example.com"}
        ]"#;
        let res = result(OutputFormat::CrtShJson, raw);
        assert_eq!(names(normalize(&res)), ["a.example.com", "e.example.com"]);
    }

    #[test]
    fn www_is_kept_when_only_a_tld_would_remain() {
        let res = result(OutputFormat::Lines, "www.com
WWW.shop.example.com
www.
");
        assert_eq!(
            names(normalize(&res)),
            ["www.com", "shop.example.com", "www."]
        );
    }

    #[test]
    fn malformed_json_yields_nothing() {
        let res = result(OutputFormat::CrtShJson, "<html>502 Bad Gateway</html>");
        assert!(normalize(&res).is_empty());
    }

    #[test]
    fn urls_are_reduced_to_hosts() {
        let raw = "https://www.example.com/path\n\
                   http://api.example.com:8080/x?y=1\n\
                   ftp.example.com/file\n\
                   http://cdn.example.com?q\n";
        let res = result(OutputFormat::UrlLines, raw);
        assert_eq!(
            names(normalize(&res)),
            [
                "example.com",
                "api.example.com",
                "ftp.example.com",
                "cdn.example.com"
            ]
        );
    }

    #[test]
    fn degraded_results_yield_nothing() {
        for status in [
            SourceStatus::TimedOut,
            SourceStatus::Failed,
            SourceStatus::Skipped,
        ] {
            let res = SourceResult::degraded(
                "test",
                OutputFormat::Lines,
                status,
                "partial.example.com\n".to_string(),
                "boom".to_string(),
                Duration::ZERO,
            );
            assert!(normalize(&res).is_empty());
        }
    }
}
