use std::path::PathBuf;

use browser_testkit::{BrowserKind, ExecutionTarget, HarnessConfig, TestHarness};
use clap::{Arg, ArgAction, Command};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let matches = Command::new("testkit-smoke")
        .about("Drives a page through the harness as a provisioning smoke check")
        .arg(
            Arg::new("url")
                .long("url")
                .required(true)
                .help("Page to navigate to"),
        )
        .arg(
            Arg::new("browser")
                .long("browser")
                .default_value("chrome")
                .help("chrome, edge, firefox or safari"),
        )
        .arg(
            Arg::new("headless")
                .long("headless")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .default_value("local")
                .help("local or remote"),
        )
        .arg(
            Arg::new("remote-host")
                .long("remote-host")
                .default_value("localhost"),
        )
        .arg(
            Arg::new("remote-port")
                .long("remote-port")
                .default_value("4444"),
        )
        .arg(
            Arg::new("capture-dir")
                .long("capture-dir")
                .help("Directory for screenshot evidence"),
        )
        .get_matches();

    let defaults = HarnessConfig::default();
    let config = HarnessConfig {
        browser: matches
            .get_one::<String>("browser")
            .expect("defaulted")
            .parse::<BrowserKind>()?,
        target: matches
            .get_one::<String>("target")
            .expect("defaulted")
            .parse::<ExecutionTarget>()?,
        headless: matches.get_flag("headless"),
        remote_host: matches
            .get_one::<String>("remote-host")
            .expect("defaulted")
            .clone(),
        remote_port: matches
            .get_one::<String>("remote-port")
            .expect("defaulted")
            .parse()?,
        capture_dir: matches
            .get_one::<String>("capture-dir")
            .map(PathBuf::from)
            .unwrap_or(defaults.capture_dir.clone()),
        ..defaults
    };

    let url = matches.get_one::<String>("url").expect("required").clone();

    info!(browser = config.browser.name(), url = %url, "starting smoke run");
    let harness = TestHarness::start_with_capture(config).await?;
    harness.actions().navigate(&url).await?;
    harness.finish().await?;
    info!("smoke run complete");

    Ok(())
}
