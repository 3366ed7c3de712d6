//! Command line login for CBN cable routers
//!
//! Establishes an authenticated session with the device and prints the
//! session id to stdout. Repeat runs reuse the persisted SID and skip the
//! credential handshake entirely.
//!
//! # Usage
//!
//! ```bash
//! CBN_USR=admin CBN_PW=secret cbn-login
//! cbn-login --username admin --password secret --url http://192.168.100.1
//! ```
//!
//! # Output
//!
//! The SID on stdout; all logging goes to stderr.

use std::path::PathBuf;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cbn_agent::{CbnAgent, Settings, utils::get_version};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "cbn-login")]
#[command(disable_version_flag = true)]
struct Cli {
    /// Device base URL
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Admin interface username
    #[arg(short, long, value_name = "USERNAME")]
    username: Option<String>,

    /// Admin interface password
    #[arg(short, long, value_name = "PASSWORD")]
    password: Option<String>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SID file path; an empty value disables persistence
    #[arg(long, value_name = "FILE")]
    sid_file: Option<String>,

    /// Proxy URL for device traffic, e.g. socks5://127.0.0.1:1080
    /// to watch the exchange through mitmproxy
    #[arg(long, value_name = "PROXY")]
    proxy: Option<String>,

    /// Show version information
    #[arg(long)]
    version: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Handle version flag early
    if cli.version {
        println!("{}", get_version());
        return Ok(());
    }

    init_logging(cli.verbose);
    debug!("cbn-login v{}", get_version());

    let settings = apply_cli_overrides(Settings::load(cli.config.as_deref())?, &cli);
    debug!(?settings, "effective configuration");

    let mut agent = CbnAgent::new(settings)?;
    agent.authenticate().await?;

    match agent.sid() {
        Some(sid) => println!("{sid}"),
        None => anyhow::bail!("login finished without a session id"),
    }
    Ok(())
}

/// Logging goes to stderr; stdout only carries the SID.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Apply command line flags on top of the loaded settings. Flags win over
/// both the config file and the environment.
fn apply_cli_overrides(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(url) = &cli.url {
        settings.device.base_url = url.clone();
    }
    if let Some(username) = &cli.username {
        settings.auth.username = username.clone();
    }
    if let Some(password) = &cli.password {
        settings.auth.password = password.clone();
    }
    if let Some(sid_file) = &cli.sid_file {
        settings.session.sid_file = if sid_file.is_empty() {
            None
        } else {
            Some(PathBuf::from(sid_file))
        };
    }
    if let Some(proxy) = &cli.proxy {
        settings.network.proxy = if proxy.is_empty() {
            None
        } else {
            Some(proxy.clone())
        };
    }
    settings
}
