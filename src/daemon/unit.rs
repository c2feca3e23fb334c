//! systemd unit definition for the daemon.

use std::fmt::Write as _;

use crate::config::types::BootstrapConfig;
use crate::system::identity::Identity;

pub const UNIT_AFTER: &str = "network-online.target";
pub const UNIT_RESTART: &str = "always";
pub const UNIT_RESTART_SEC: u32 = 3;
pub const UNIT_WANTED_BY: &str = "default.target";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUnit {
    pub description: String,
    pub after: String,
    pub exec_start: String,
    pub user: String,
    pub group: String,
    pub restart: String,
    pub restart_sec: u32,
    pub path_env: String,
    pub wanted_by: String,
}

impl ServiceUnit {
    pub fn for_daemon(config: &BootstrapConfig, identity: &Identity) -> Self {
        Self {
            description: config.service.description.clone(),
            after: UNIT_AFTER.to_string(),
            exec_start: format!("{} serve", config.daemon.binary_path.display()),
            user: identity.user.clone(),
            group: identity.group.clone(),
            restart: UNIT_RESTART.to_string(),
            restart_sec: UNIT_RESTART_SEC,
            path_env: config.service.path_env.clone(),
            wanted_by: UNIT_WANTED_BY.to_string(),
        }
    }

    /// Render the complete unit file. Output depends only on the fields, so the
    /// same inputs always produce byte-identical content.
    pub fn render(&self) -> String {
        let mut out = String::new();

        // Writing into a String cannot fail
        let _ = writeln!(out, "[Unit]");
        let _ = writeln!(out, "Description={}", self.description);
        let _ = writeln!(out, "After={}", self.after);
        let _ = writeln!(out);
        let _ = writeln!(out, "[Service]");
        let _ = writeln!(out, "ExecStart={}", self.exec_start);
        let _ = writeln!(out, "User={}", self.user);
        let _ = writeln!(out, "Group={}", self.group);
        let _ = writeln!(out, "Restart={}", self.restart);
        let _ = writeln!(out, "RestartSec={}", self.restart_sec);
        let _ = writeln!(out, "Environment=\"PATH={}\"", self.path_env);
        let _ = writeln!(out);
        let _ = writeln!(out, "[Install]");
        let _ = writeln!(out, "WantedBy={}", self.wanted_by);

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_for(user: &str) -> String {
        ServiceUnit::for_daemon(&BootstrapConfig::default(), &Identity::from_user(user)).render()
    }

    #[test]
    fn renders_expected_unit() {
        let expected = "\
[Unit]
Description=Ollama Service
After=network-online.target

[Service]
ExecStart=/usr/local/bin/ollama serve
User=alice
Group=alice
Restart=always
RestartSec=3
Environment=\"PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin\"

[Install]
WantedBy=default.target
";
        assert_eq!(render_for("alice"), expected);
    }

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(render_for("kali"), render_for("kali"));
    }

    #[test]
    fn user_and_group_carry_the_identity() {
        let unit = render_for("svc-user");
        assert!(unit.lines().any(|l| l == "User=svc-user"));
        assert!(unit.lines().any(|l| l == "Group=svc-user"));
    }
}
