mod config;
mod domain;
mod error;
mod log;
mod merge;
mod model;
mod modules;
mod normalize;
mod report;
mod scan;

pub use error::{Error, Result};

use crate::config::{Config, ExportFormat};
use crate::domain::Domain;
use crate::log::init_tracing_subscriber;
use crate::model::ensure_dir;
use clap::{Arg, ArgAction, Command};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};

fn main() -> Result<()> {
    let cli = Command::new(clap::crate_name!())
        .version(clap::crate_version!())
        .about("Subdomain enumeration across local tools and passive sources")
        .subcommand(Command::new("modules").about("List all subdomain sources"))
        .subcommand(
            Command::new("scan")
                .about("Enumerate the subdomains of a target")
                .arg(
                    Arg::new("target")
                        .help("The domain name to enumerate")
                        .value_name("TARGET")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Directory receiving the results_<TARGET> run directory")
                        .value_name("DIR")
                        .default_value("."),
                )
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .help("Report format")
                        .value_name("FORMAT")
                        .value_parser(["json", "md", "both", "none"])
                        .default_value("both"),
                )
                .arg(
                    Arg::new("logs")
                        .short('s')
                        .long("logs")
                        .action(ArgAction::SetTrue)
                        .help("Save logs into a .log file"),
                )
                .arg(
                    Arg::new("concurrency")
                        .short('c')
                        .long("concurrency")
                        .help("Sources running at the same time, 1 runs them in sequence")
                        .value_name("N")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("20"),
                )
                .arg(
                    Arg::new("sources")
                        .long("sources")
                        .help("Only run these sources (comma separated)")
                        .value_name("NAMES")
                        .value_delimiter(','),
                )
                .arg(
                    Arg::new("github-token")
                        .long("github-token")
                        .help("Token for the GitHub source")
                        .value_name("TOKEN")
                        .env("GITHUB_TOKEN")
                        .hide_env_values(true),
                ),
        )
        .arg_required_else_help(true)
        .get_matches();

    match cli.subcommand() {
        Some(("modules", _)) => modules::display_all(),
        Some(("scan", args)) => {
            let target = args
                .get_one::<String>("target")
                .ok_or_else(|| Error::CliUsage("No domain specified".into()))?;
            let domain = Domain::validate(target)?;

            let output_root = args
                .get_one::<String>("output")
                .map(String::as_str)
                .unwrap_or(".");
            let mut config = Config::new(domain, Path::new(output_root));
            config.github_token = args.get_one::<String>("github-token").cloned();
            config.sources = args
                .get_many::<String>("sources")
                .map(|names| names.cloned().collect());
            if let Some(concurrency) = args.get_one::<usize>("concurrency") {
                config.concurrency = *concurrency;
            }
            if let Some(format) = args.get_one::<String>("format") {
                config.export = ExportFormat::from_arg(format);
            }
            config.save_logs = args.get_flag("logs");

            // create output dir
            let created = ensure_dir(&config.run_dir)?;

            let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
            init_tracing_subscriber(config.save_logs, &config.run_dir, &timestamp.to_string())?;

            if !created {
                warn!(
                    "Output directory {} already exists. Previous results may be overwritten.",
                    config.run_dir.display()
                );
            }
            info!("Results will be saved in: {}", config.run_dir.display());

            let report = scan::scan(&config)?;

            let degraded = report.degraded_sources().count();
            if degraded > 0 {
                warn!(
                    "{} of {} sources did not complete, see the report",
                    degraded,
                    report.sources.len()
                );
            }
            info!("Enumeration completed!");
            info!("Total unique subdomains found: {}", report.total);
            info!(
                "Final subdomains saved to: {}",
                config.run_dir.join("final.txt").display()
            );
            info!("Results by source:");
            for source in &report.sources {
                info!("  {}: {} subdomains", source.name, source.raw_count);
            }
        }

        // fallback if a cmd is not handled (should not possible)
        _ => {
            error!("{:12} - Command not handled, exit program", "CLI ERROR");
            return Err(Error::CliUsage("Command not handled".into()));
        }
    }

    Ok(())
}
