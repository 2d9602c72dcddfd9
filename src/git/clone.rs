use crate::error::{FleetError, Result};
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};
use url::Url;

/// Optional credentials handed to the git transport when cloning.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }
}

/// Working directory of a remote repository: the URL's path component
/// below `root`, e.g. `repos/org/project` for `https://host/org/project`.
pub fn clone_destination(root: &Path, url: &str) -> Result<PathBuf> {
    let parsed = Url::parse(url).map_err(|e| FleetError::resolution(url, e))?;

    let relative: PathBuf = Path::new(parsed.path())
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();

    if relative.as_os_str().is_empty() {
        return Err(FleetError::resolution(url, "URL has no path component"));
    }
    Ok(root.join(relative))
}

/// Clone URL with the credentials embedded as userinfo.
pub fn authenticated_url(url: &str, credentials: &Credentials) -> Result<Url> {
    let mut parsed = Url::parse(url).map_err(|e| FleetError::resolution(url, e))?;
    if let Some(username) = &credentials.username {
        parsed
            .set_username(username)
            .map_err(|_| FleetError::resolution(url, "URL cannot carry a username"))?;
    }
    if let Some(password) = &credentials.password {
        parsed
            .set_password(Some(password))
            .map_err(|_| FleetError::resolution(url, "URL cannot carry a password"))?;
    }
    Ok(parsed)
}

pub fn clone_repository(url: &str, destination: &Path, credentials: &Credentials) -> Result<()> {
    info!(repository = url, target_path = %destination.display(), "cloning repository");

    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let clone_url = if credentials.is_empty() {
        url.to_string()
    } else {
        authenticated_url(url, credentials)?.to_string()
    };

    let output = Command::new("git")
        .arg("clone")
        .arg("--quiet")
        .arg(&clone_url)
        .arg(destination)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .map_err(|e| FleetError::Clone {
            url: url.to_string(),
            stderr: format!("failed to execute git: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(FleetError::Clone {
            url: url.to_string(),
            stderr: redact(stderr.trim(), credentials),
        });
    }

    debug!(repository = url, target_path = %destination.display(), "clone finished");
    Ok(())
}

fn redact(message: &str, credentials: &Credentials) -> String {
    match &credentials.password {
        Some(password) if !password.is_empty() => message.replace(password.as_str(), "***"),
        _ => message.to_string(),
    }
}
