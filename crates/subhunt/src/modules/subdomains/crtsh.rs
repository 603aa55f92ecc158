use super::SubdomainModule;
use crate::domain::Domain;
use crate::model::SourceKind;
use crate::modules::{fetch_text, Module};
use crate::normalize::OutputFormat;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

const BUDGET_SECS: u64 = 60;

// region:        --- Module info

pub struct CrtSh {
    http_client: Client,
    base_url: String,
    budget: Duration,
}

impl CrtSh {
    pub fn new(http_client: Client, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            budget: Duration::from_secs(BUDGET_SECS),
        }
    }
}

impl Module for CrtSh {
    fn name(&self) -> String {
        "crtsh".to_string()
    }

    fn description(&self) -> String {
        "Use crt.sh/ certificate transparency logs to find subdomains".to_string()
    }
}

// endregion:     --- Module info

#[async_trait]
impl SubdomainModule for CrtSh {
    fn kind(&self) -> SourceKind {
        SourceKind::Http
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::CrtShJson
    }

    fn budget(&self) -> Duration {
        self.budget
    }

    #[instrument(name = "produce", level = "debug", fields(module = %self.name()), skip_all)]
    async fn produce(&self, domain: &Domain, cancel: &CancellationToken) -> Result<String> {
        let url = format!("{}/?q=%25.{}&output=json", self.base_url, domain);
        let body = fetch_text(&self.http_client, &url, self.budget, cancel).await?;

        // crt.sh answers HTML error pages with a 200 under load
        let entries = serde_json::from_str::<Vec<serde_json::Value>>(&body).map_err(|_| {
            Error::InvalidHttpResponse(format!("{}: body is not a JSON array", self.name()))
        })?;

        debug!("{} entries", entries.len());
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceStatus;
    use crate::modules::subdomains::run;
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn example() -> Domain {
        Domain::validate("example.com").unwrap()
    }

    #[tokio::test]
    async fn returns_json_body() {
        let mock_server = MockServer::start().await;
        let body = r#"[{"name_value":"*.b.example.com"},{"name_value":"c.example.com"}]"#;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("q", "%.example.com"))
            .and(query_param("output", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        let module = CrtSh::new(Client::new(), &mock_server.uri());
        let result = run(Arc::new(module), example()).await;

        assert_eq!(result.status, SourceStatus::Success);
        assert_eq!(result.raw, body);
    }

    #[tokio::test]
    async fn retries_transient_statuses() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&mock_server)
            .await;

        let module = CrtSh::new(Client::new(), &mock_server.uri());
        let result = run(Arc::new(module), example()).await;

        assert_eq!(result.status, SourceStatus::Success);
        assert_eq!(result.raw, "[]");
    }

    #[tokio::test]
    async fn gives_up_after_retries() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(4)
            .mount(&mock_server)
            .await;

        let module = CrtSh::new(Client::new(), &mock_server.uri());
        let result = run(Arc::new(module), example()).await;

        assert_eq!(result.status, SourceStatus::Failed);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn html_body_is_a_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .mount(&mock_server)
            .await;

        let module = CrtSh::new(Client::new(), &mock_server.uri());
        let result = run(Arc::new(module), example()).await;

        assert_eq!(result.status, SourceStatus::Failed);
        assert!(result.error.unwrap().contains("not a JSON array"));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("[]")
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&mock_server)
            .await;

        let mut module = CrtSh::new(Client::new(), &mock_server.uri());
        module.budget = Duration::from_millis(200);
        let result = run(Arc::new(module), example()).await;

        assert_eq!(result.status, SourceStatus::TimedOut);
        assert!(result.elapsed < Duration::from_secs(5));
    }
}
