//! Placeholder assistant script.

use std::path::Path;

use crate::bootstrap::error::StepError;

/// Written verbatim; the assistant itself is not part of the bootstrap.
pub const PLACEHOLDER_SCRIPT: &str = r#"#!/usr/bin/env python3
"""
Kali Linux Conversational Assistant
Filename: kali_assistant.py
License: MIT

Talks to the local Ollama daemon at http://localhost:11434/api/chat.
"""

import requests

# Assistant implementation goes here.
"#;

/// Overwrite `path` with the placeholder and make it executable.
pub async fn write_placeholder(path: &Path) -> Result<(), StepError> {
    tokio::fs::write(path, PLACEHOLDER_SCRIPT)
        .await
        .map_err(|e| StepError::io("write", path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .await
            .map_err(|e| StepError::io("chmod", path, e))?;
    }

    Ok(())
}
