pub mod subdomains;

use self::subdomains::assetfinder::Assetfinder;
use self::subdomains::crtsh::CrtSh;
use self::subdomains::findomain::Findomain;
use self::subdomains::github::GithubSubdomains;
use self::subdomains::subfinder::Subfinder;
use self::subdomains::web_archive::WebArchive;
use self::subdomains::SubdomainModule;
use crate::config::Config;
use crate::{Error, Result};
use reqwest::{Client, Response, StatusCode};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use std::{env, fs};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

// region:        --- Constants

pub const CRTSH_URL: &str = "https://crt.sh";
pub const WEB_ARCHIVE_URL: &str = "http://web.archive.org";

// retries after the first attempt
const HTTP_RETRIES: usize = 3;
const HTTP_RETRY_DELAY_MS: u64 = 500;

// endregion:     --- Constants

pub trait Module {
    fn name(&self) -> String;
    fn description(&self) -> String;
}

// region:        --- Registry

pub fn subdomains_modules(
    http_client: &Client,
    github_token: Option<String>,
) -> Vec<Arc<dyn SubdomainModule>> {
    vec![
        Arc::new(Subfinder::new()),
        Arc::new(Assetfinder::new()),
        Arc::new(Findomain::new()),
        Arc::new(CrtSh::new(http_client.clone(), CRTSH_URL)),
        Arc::new(WebArchive::new(http_client.clone(), WEB_ARCHIVE_URL)),
        Arc::new(GithubSubdomains::new(github_token)),
    ]
}

/// Sources taking part in the run described by `config`.
pub fn registry(config: &Config, http_client: &Client) -> Result<Vec<Arc<dyn SubdomainModule>>> {
    let modules = subdomains_modules(http_client, config.github_token.clone());

    if let Some(wanted) = &config.sources {
        let known: Vec<String> = modules.iter().map(|module| module.name()).collect();
        let unknown: Vec<&String> = wanted.iter().filter(|name| !known.contains(*name)).collect();
        if !unknown.is_empty() {
            return Err(Error::CliUsage(format!(
                "Unknown sources {:?}, available: {}",
                unknown,
                known.join(", ")
            )));
        }
    }

    Ok(modules
        .into_iter()
        .filter(|module| config.wants(&module.name()))
        .collect())
}

pub fn display_all() {
    let http_client = Client::new();
    let token = env::var("GITHUB_TOKEN").ok();
    println!("\nSubdomains modules");
    for module in subdomains_modules(&http_client, token) {
        println!(
            "- {:14}{:12}{:>5}s  {}",
            module.name(),
            format!("{:?}", module.kind()),
            module.budget().as_secs(),
            module.description()
        );
    }
}

/// Fail fast when a program some source cannot run without is not installed.
pub fn check_dependencies(modules: &[Arc<dyn SubdomainModule>]) -> Result<()> {
    let missing: Vec<String> = modules
        .iter()
        .filter_map(|module| module.required_program())
        .filter(|program| find_program(program).is_none())
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        error!("Missing dependencies: {}", missing.join(" "));
        Err(Error::MissingDependency(missing))
    }
}

// endregion:     --- Registry

// region:        --- HTTP requests

#[instrument(name = "HTTP_request", level = "info", skip_all, fields(url = url))]
pub async fn http_request(http_client: &Client, url: &str, timeout: Duration) -> Result<Response> {
    info!("Sending request");
    match http_client.get(url).timeout(timeout).send().await {
        Ok(res) => {
            info!("Receive with status: {}", res.status());
            debug!("Response: {:?}", res);
            let status = res.status();
            if status == StatusCode::REQUEST_TIMEOUT
                || status == StatusCode::TOO_MANY_REQUESTS
                || status.is_server_error()
            {
                return Err(Error::TransientStatus(status.as_u16()));
            }
            Ok(res)
        }
        Err(err) => {
            error!("Reason: {}", err);
            Err(Error::Reqwest(err))
        }
    }
}

/// GET `url` with retries on transient failures, until `cancel` fires.
pub async fn fetch_text(
    http_client: &Client,
    url: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<String> {
    let fetch = async {
        let strategy = FixedInterval::from_millis(HTTP_RETRY_DELAY_MS).take(HTTP_RETRIES);
        let res = RetryIf::spawn(
            strategy,
            || http_request(http_client, url, timeout),
            Error::is_transient,
        )
        .await?;

        if !res.status().is_success() {
            return Err(Error::InvalidHttpResponse(format!(
                "{} answered {}",
                url,
                res.status()
            )));
        }
        Ok(res.text().await?)
    };

    tokio::select! {
        res = fetch => res,
        _ = cancel.cancelled() => Err(Error::SourceTimeout { partial: String::new() }),
    }
}

// endregion:     --- HTTP requests

// region:        --- Local tools

/// Locate `program` the way a shell would, through `PATH`.
pub fn find_program(program: &str) -> Option<PathBuf> {
    if program.contains('/') {
        let path = PathBuf::from(program);
        return is_executable(&path).then_some(path);
    }

    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Run `program` and collect its stdout. When `cancel` fires the process is
/// killed and what was read so far comes back in `Error::SourceTimeout`.
#[instrument(name = "tool", level = "info", skip_all, fields(program = program))]
pub async fn run_tool(
    program: &str,
    args: &[String],
    cancel: &CancellationToken,
) -> Result<String> {
    info!("Spawning");
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;

    let stdout = child.stdout.take().ok_or_else(|| Error::ToolExit {
        program: program.to_string(),
        code: None,
    })?;
    // raw bytes, tools may print names that are not valid UTF-8
    let mut reader = BufReader::new(stdout);
    let mut output: Vec<u8> = Vec::new();

    loop {
        tokio::select! {
            read = reader.read_until(b'\n', &mut output) => {
                if read? == 0 {
                    break;
                }
            },
            _ = cancel.cancelled() => {
                if let Err(err) = child.kill().await {
                    warn!("Unable to kill {}: {}", program, err);
                }
                return Err(Error::SourceTimeout { partial: lossy(output) });
            }
        }
    }

    let status = tokio::select! {
        status = child.wait() => status?,
        _ = cancel.cancelled() => {
            if let Err(err) = child.kill().await {
                warn!("Unable to kill {}: {}", program, err);
            }
            return Err(Error::SourceTimeout { partial: lossy(output) });
        }
    };

    debug!("Exited with {}", status);
    if !status.success() {
        return Err(Error::ToolExit {
            program: program.to_string(),
            code: status.code(),
        });
    }

    Ok(lossy(output))
}

fn lossy(bytes: Vec<u8>) -> String {
    String::from_utf8_lossy(&bytes).into_owned()
}

// endregion:     --- Local tools
