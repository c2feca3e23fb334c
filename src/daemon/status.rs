use std::path::Path;

use anyhow::Result;

use crate::bootstrap::steps::model_listed;
use crate::bootstrap::HostFacts;
use crate::config::types::BootstrapConfig;
use crate::daemon::systemd::{is_active, is_enabled, needs_daemon_reload, unit_is_current};
use crate::daemon::unit::ServiceUnit;
use crate::system::executor::{CommandRunner, CommandSpec};
use crate::system::identity::Identity;

/// Run health check to verify what a bootstrap left behind.
/// Returns true when every check passed.
pub async fn run_health_check(
    config: &BootstrapConfig,
    identity: &Identity,
    runner: &dyn CommandRunner,
    host: HostFacts,
    work_dir: &Path,
) -> Result<bool> {
    let hostname = hostname::get()
        .unwrap_or_else(|_| std::ffi::OsString::from("unknown"))
        .to_string_lossy()
        .to_string();

    println!("\x1b[32massistant-bootstrap v{} ({})\x1b[0m", env!("CARGO_PKG_VERSION"), std::env::consts::ARCH);
    println!("Health Check: {}", hostname);
    println!("============\n");

    let mut all_ok = true;

    // Daemon binary
    let binary = &config.daemon.binary_path;
    let has_binary = binary.exists();
    if has_binary {
        println!("✓ Ollama binary: {}", binary.display());
    } else {
        println!("✗ Ollama binary: NOT FOUND at {}", binary.display());
        all_ok = false;
    }

    // Systemd unit
    if host.has_systemd {
        let unit_path = &config.service.unit_path;
        let unit = config.service.unit_name();
        let rendered = ServiceUnit::for_daemon(config, identity).render();

        if !unit_path.exists() {
            println!("✗ Systemd unit: NOT INSTALLED ({})", unit_path.display());
            all_ok = false;
        } else if unit_is_current(unit_path, &rendered).await {
            println!("✓ Systemd unit: {} (User={})", unit_path.display(), identity.user);
        } else {
            println!("⚠ Systemd unit: {} differs from the current rendering", unit_path.display());
            println!("  Re-run: sudo assistant-bootstrap");
            all_ok = false;
        }

        match needs_daemon_reload(runner, &unit).await {
            Ok(false) => {}
            Ok(true) => {
                println!("⚠ Systemd unit: changed on disk but not reloaded");
                println!("  Run: sudo systemctl daemon-reload && sudo systemctl restart {}", unit);
                all_ok = false;
            }
            Err(e) => {
                println!("✗ Systemd unit: cannot query load state ({})", e);
                all_ok = false;
            }
        }

        match is_enabled(runner, &unit).await {
            Ok(true) => println!("✓ Service enabled: {}", unit),
            Ok(false) => {
                println!("⚠ Service enabled: NO");
                println!("  Run: sudo systemctl enable {}", unit);
                all_ok = false;
            }
            Err(e) => {
                println!("✗ Service enabled: cannot query ({})", e);
                all_ok = false;
            }
        }

        match is_active(runner, &unit).await {
            Ok(true) => println!("✓ Service status: Running"),
            Ok(false) => {
                println!("✗ Service status: Not running");
                println!("  Run: sudo systemctl restart {}", unit);
                all_ok = false;
            }
            Err(e) => {
                println!("✗ Service status: cannot query ({})", e);
                all_ok = false;
            }
        }
    } else {
        println!("✗ Systemd: Not available on this system");
        all_ok = false;
    }

    // Model
    let model = &config.model.name;
    if has_binary {
        let listing = runner
            .probe(&CommandSpec::new(binary.to_string_lossy()).arg("list"))
            .await;
        match listing {
            Ok(out) if out.success && model_listed(&out.stdout, model) => println!("✓ Model: {}", model),
            Ok(_) => {
                println!("✗ Model: {} NOT PULLED", model);
                println!("  Run: {} pull {}", binary.display(), model);
                all_ok = false;
            }
            Err(e) => {
                println!("✗ Model: cannot query {} ({})", binary.display(), e);
                all_ok = false;
            }
        }
    } else {
        println!("- Model: skipped (no Ollama binary)");
    }

    // Scaffold
    let script = work_dir.join(&config.scaffold.script_path);
    if script.exists() {
        println!("✓ Assistant script: {}", script.display());
    } else {
        println!("⚠ Assistant script: NOT FOUND in {}", work_dir.display());
        all_ok = false;
    }

    let package = config.scaffold.package.as_str();
    let shown = runner
        .probe(&CommandSpec::new(config.scaffold.installer.as_str()).args(["show", package]))
        .await;
    match shown {
        Ok(out) if out.success => println!("✓ Python package: {}", package),
        Ok(_) => {
            println!("✗ Python package: {} NOT INSTALLED", package);
            all_ok = false;
        }
        Err(e) => {
            println!("✗ Python package: cannot query {} ({})", config.scaffold.installer, e);
            all_ok = false;
        }
    }

    println!();
    if all_ok {
        println!("\x1b[32m✓ All checks passed!\x1b[0m");
    } else {
        println!("\x1b[33m⚠ Some issues found - see above\x1b[0m");
    }

    Ok(all_ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::testing::StubRunner;
    use tempfile::tempdir;

    const HOST: HostFacts = HostFacts {
        is_root: false,
        has_systemd: true,
    };

    #[tokio::test]
    async fn healthy_host_passes() {
        let dir = tempdir().unwrap();
        let identity = Identity::from_user("alice");
        let mut config = BootstrapConfig::default();
        config.daemon.binary_path = dir.path().join("ollama");
        config.service.unit_path = dir.path().join("ollama.service");

        std::fs::write(&config.daemon.binary_path, "").unwrap();
        std::fs::write(
            &config.service.unit_path,
            ServiceUnit::for_daemon(&config, &identity).render(),
        )
        .unwrap();
        std::fs::write(dir.path().join("kali_assistant.py"), "").unwrap();

        let runner = StubRunner::new()
            .probe_ok("systemctl is-enabled", "")
            .probe_ok("systemctl is-active", "")
            .probe_ok(
                &format!("{} list", config.daemon.binary_path.display()),
                "NAME ID SIZE MODIFIED\ndeepseek-coder:latest x 1 now\n",
            )
            .probe_ok("pip3 show requests", "Name: requests\n");

        assert!(run_health_check(&config, &identity, &runner, HOST, dir.path()).await.unwrap());
    }

    #[tokio::test]
    async fn empty_host_fails_without_touching_anything() {
        let dir = tempdir().unwrap();
        let identity = Identity::from_user("alice");
        let mut config = BootstrapConfig::default();
        config.daemon.binary_path = dir.path().join("ollama");
        config.service.unit_path = dir.path().join("ollama.service");

        let runner = StubRunner::new();

        assert!(!run_health_check(&config, &identity, &runner, HOST, dir.path()).await.unwrap());
        assert!(runner.calls().iter().all(|c| c.contains(" is-") || c.contains(" show ")));
        assert!(!config.service.unit_path.exists());
    }

    #[tokio::test]
    async fn unrunnable_tools_are_reported_not_raised() {
        let dir = tempdir().unwrap();
        let identity = Identity::from_user("alice");
        let mut config = BootstrapConfig::default();
        config.daemon.binary_path = dir.path().join("ollama");
        config.service.unit_path = dir.path().join("ollama.service");
        std::fs::write(&config.daemon.binary_path, "").unwrap();

        let runner = StubRunner::new()
            .missing("systemctl")
            .missing(&config.daemon.binary_path.display().to_string())
            .missing("pip3");

        let healthy = run_health_check(&config, &identity, &runner, HOST, dir.path()).await;
        assert!(!healthy.unwrap());
        // Every query was still attempted after the first spawn failure
        assert_eq!(runner.count("systemctl is-"), 2);
        assert_eq!(runner.count("pip3 show"), 1);
    }

    #[tokio::test]
    async fn unit_waiting_for_reload_is_flagged() {
        let dir = tempdir().unwrap();
        let identity = Identity::from_user("alice");
        let mut config = BootstrapConfig::default();
        config.daemon.binary_path = dir.path().join("ollama");
        config.service.unit_path = dir.path().join("ollama.service");
        std::fs::write(&config.daemon.binary_path, "").unwrap();
        std::fs::write(
            &config.service.unit_path,
            ServiceUnit::for_daemon(&config, &identity).render(),
        )
        .unwrap();
        std::fs::write(dir.path().join("kali_assistant.py"), "").unwrap();

        let runner = StubRunner::new()
            .probe_ok("systemctl show", "yes\n")
            .probe_ok("systemctl is-enabled", "")
            .probe_ok("systemctl is-active", "")
            .probe_ok(
                &format!("{} list", config.daemon.binary_path.display()),
                "NAME ID SIZE MODIFIED\ndeepseek-coder:latest x 1 now\n",
            )
            .probe_ok("pip3 show requests", "Name: requests\n");

        assert!(!run_health_check(&config, &identity, &runner, HOST, dir.path()).await.unwrap());
    }
}
