//! Invoking-user identity and privilege checks.

use anyhow::{anyhow, Result};

/// The account the daemon will run as. Captured once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user: String,
    pub group: String,
}

impl Identity {
    /// The group carries the user's name, matching a per-user primary group.
    pub fn from_user(user: impl Into<String>) -> Self {
        let user = user.into();
        Self {
            group: user.clone(),
            user,
        }
    }

    /// Resolve the invoking user.
    /// Priority: 1. explicit override, 2. SUDO_USER, 3. USER, 4. passwd entry of the effective uid
    pub fn detect(override_user: Option<&str>) -> Result<Self> {
        resolve_user(
            override_user,
            std::env::var("SUDO_USER").ok(),
            std::env::var("USER").ok(),
            effective_user_name,
        )
        .map(Self::from_user)
        .ok_or_else(|| anyhow!("Cannot determine the invoking user (set USER or service.user in the config)"))
    }
}

fn resolve_user(
    override_user: Option<&str>,
    sudo_user: Option<String>,
    user: Option<String>,
    passwd: impl FnOnce() -> Option<String>,
) -> Option<String> {
    let non_empty = |value: String| {
        let trimmed = value.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    };

    override_user
        .map(str::to_string)
        .and_then(non_empty)
        .or_else(|| sudo_user.and_then(non_empty))
        .or_else(|| user.and_then(non_empty))
        .or_else(|| passwd().and_then(non_empty))
}

/// Check if running as root
pub fn is_root() -> bool {
    #[cfg(target_os = "linux")]
    {
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}

#[cfg(target_os = "linux")]
fn effective_user_name() -> Option<String> {
    let mut buf = vec![0 as libc::c_char; 4096];
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::passwd = std::ptr::null_mut();

    let rc = unsafe {
        libc::getpwuid_r(
            libc::geteuid(),
            &mut pwd,
            buf.as_mut_ptr(),
            buf.len(),
            &mut result,
        )
    };
    if rc != 0 || result.is_null() || pwd.pw_name.is_null() {
        return None;
    }

    let name = unsafe { std::ffi::CStr::from_ptr(pwd.pw_name) };
    Some(name.to_string_lossy().into_owned())
}

#[cfg(not(target_os = "linux"))]
fn effective_user_name() -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn override_wins() {
        let user = resolve_user(Some("svc"), some("alice"), some("root"), || some("root"));
        assert_eq!(user.as_deref(), Some("svc"));
    }

    #[test]
    fn sudo_user_beats_user() {
        let user = resolve_user(None, some("alice"), some("root"), || some("root"));
        assert_eq!(user.as_deref(), Some("alice"));
    }

    #[test]
    fn blank_values_fall_through_to_passwd() {
        let user = resolve_user(Some("  "), some(""), None, || some("kali"));
        assert_eq!(user.as_deref(), Some("kali"));
    }

    #[test]
    fn nothing_resolves_to_none() {
        assert_eq!(resolve_user(None, None, None, || None), None);
    }

    #[test]
    fn group_mirrors_user() {
        let identity = Identity::from_user("alice");
        assert_eq!(identity.user, "alice");
        assert_eq!(identity.group, "alice");
    }
}
