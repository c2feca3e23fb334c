//! assistant-bootstrap entry point: CLI dispatch, logging, bootstrap run.

mod app;
mod bootstrap;
mod config;
mod daemon;
mod system;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use app::cli::{Args, HELP_TEXT};
use app::logging::{init_tracing, resolve_log_filter, select_log_level};
use bootstrap::{Bootstrap, HostFacts};
use config::persistence::{default_config_path, load_config, save_config};
use config::types::BootstrapConfig;
use daemon::status::run_health_check;
use daemon::systemd::uninstall_systemd_service;
use daemon::unit::ServiceUnit;
use system::executor::SystemRunner;
use system::identity::Identity;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse arguments with custom error handling
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            if err.kind() == clap::error::ErrorKind::DisplayHelp {
                print!("{}", HELP_TEXT);
                std::process::exit(0);
            }
            if err.kind() == clap::error::ErrorKind::DisplayVersion {
                println!("\x1b[32massistant-bootstrap {} ({})\x1b[0m", env!("CARGO_PKG_VERSION"), std::env::consts::ARCH);
                std::process::exit(0);
            }

            eprintln!("{}", err);
            print!("{}", HELP_TEXT);
            std::process::exit(2);
        }
    };

    // Setup logging
    // Priority: 1. --log-level flag, 2. LOG_LEVEL env, 3. config file (applied after load), 4. default (info)
    let env_level = std::env::var("LOG_LEVEL").ok();
    let log_level = select_log_level(args.log_level.as_deref(), env_level.as_deref(), None);
    let filter = resolve_log_filter(&log_level).unwrap_or_else(|| {
        eprintln!("Invalid log level '{}'. Using INFO. Valid levels: TRACE, DEBUG, INFO, WARN, ERROR, CRITICAL", log_level);
        "info"
    });
    let reload_handle = init_tracing(filter);

    let config_path = match args.config_file.clone() {
        Some(path) => path,
        None => default_config_path()?,
    };

    if args.init_config {
        if config_path.exists() {
            eprintln!("ERROR: Config file already exists: {:?}", config_path);
            std::process::exit(1);
        }
        save_config(&BootstrapConfig::default(), &config_path).await?;
        println!("✅ Default configuration written to: {:?}", config_path);
        return Ok(());
    }

    let mut config = load_config(&config_path).await?;
    if args.reinstall {
        config.daemon.reinstall = true;
    }
    if let Err(e) = config.validate() {
        eprintln!("ERROR: Invalid configuration ({:?}): {}", config_path, e);
        std::process::exit(1);
    }

    // Config-file level only applies when neither the flag nor the env var chose one
    if args.log_level.is_none() && env_level.is_none() {
        match resolve_log_filter(&config.logging.log_level) {
            Some(filter) if filter != "info" => {
                if let Err(e) = reload_handle.reload(EnvFilter::new(filter)) {
                    error!("Failed to apply log level from config: {}", e);
                }
            }
            Some(_) => {}
            None => warn!(
                "Invalid log level '{}' in config. Using INFO.",
                config.logging.log_level
            ),
        }
    }

    // Captured once: every step and report below uses the same identity
    let identity = Identity::detect(config.service.user.as_deref())?;
    let host = HostFacts::detect();
    let runner = SystemRunner;

    if args.config {
        println!("\n{}", serde_json::to_string_pretty(&config)?);
        println!("\n# {} (User={})", config.service.unit_path.display(), identity.user);
        print!("{}", ServiceUnit::for_daemon(&config, &identity).render());
        return Ok(());
    }

    let work_dir = std::env::current_dir().context("Cannot determine working directory")?;

    if args.check {
        let healthy = run_health_check(&config, &identity, &runner, host, &work_dir).await?;
        std::process::exit(if healthy { 0 } else { 1 });
    }

    if args.uninstall_service {
        return uninstall_systemd_service(&runner, &config).await;
    }

    let hostname = hostname::get()
        .unwrap_or_else(|_| std::ffi::OsString::from("unknown"))
        .to_string_lossy()
        .to_string();
    info!(
        "assistant-bootstrap v{} on {} (user: {}, model: {})",
        env!("CARGO_PKG_VERSION"),
        hostname,
        identity.user,
        config.model.name
    );
    if !host.is_root {
        warn!("Not running as root: writing the systemd unit and managing the service will fail");
    }

    let bootstrap = Bootstrap::new(&config, identity, &runner, host, work_dir);
    match bootstrap.run().await {
        Ok(_) => {
            println!("\n✨ Setup complete!");
            println!("   Model: {}", config.model.name);
            println!("   Script: {}", config.scaffold.script_path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("\n✗ {}", e);
            eprintln!("  Fix the problem above and re-run; steps already done will be skipped.");
            std::process::exit(1);
        }
    }
}
