//! Repository identities: canonical remote URLs used as the only map key.
//!
//! Every URL that enters the engine (root request, manifest dependency keys,
//! worktree remotes) goes through [`RepositoryIdentity::parse`] before it is
//! compared or stored. Network remotes all collapse onto `https://host/path`
//! and local remotes onto `file:///path`, so `git@host:org/repo.git`,
//! `ssh://git@host:22/org/repo` and `https://HOST/org/repo/` are one identity.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

const NETWORK_SCHEMES: &[&str] = &["https", "http", "ssh", "git", "git+ssh", "ssh+git"];

/// First segment of a local remote's relative path. `@` cannot appear in a
/// host name, so this never collides with a network remote.
pub const LOCAL_SEGMENT: &str = "@local";

/// A canonicalized repository URL.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryIdentity {
    canonical: String,
}

impl RepositoryIdentity {
    /// Canonicalizes `raw` into an identity.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid(raw, "empty URL"));
        }

        let url = if trimmed.starts_with('/') {
            Url::from_file_path(trimmed).map_err(|_| invalid(raw, "not an absolute path"))?
        } else if let Some(ssh) = scp_to_ssh(trimmed) {
            Url::parse(&ssh)?
        } else {
            Url::parse(trimmed)?
        };

        let path = strip_repo_suffix(url.path());
        if path.trim_matches('/').is_empty() {
            return Err(invalid(raw, "URL has no repository path"));
        }

        let canonical = match url.scheme() {
            "file" => format!("file://{}", path),
            scheme if NETWORK_SCHEMES.contains(&scheme) => {
                let host = url
                    .host_str()
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| invalid(raw, "URL has no host"))?;
                format!("https://{}{}", host.to_ascii_lowercase(), path)
            }
            other => return Err(invalid(raw, &format!("unsupported scheme `{}`", other))),
        };

        Ok(Self { canonical })
    }

    /// The canonical URL string.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Whether the remote lives on the local filesystem.
    pub fn is_local(&self) -> bool {
        self.canonical.starts_with("file://")
    }

    /// Repository name: the last path segment.
    pub fn name(&self) -> &str {
        self.canonical.rsplit('/').next().unwrap_or(&self.canonical)
    }

    /// The URL with its scheme stripped, as a relative path
    /// (`host/org/repo`, or `@local/abs/path` for local remotes).
    pub fn relative_path(&self) -> PathBuf {
        let without_scheme = self
            .canonical
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.canonical);
        let mut path = PathBuf::new();
        if self.is_local() {
            path.push(LOCAL_SEGMENT);
        }
        for segment in without_scheme.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path
    }

    /// The URL handed to `git clone`.
    pub fn clone_url(&self) -> &str {
        &self.canonical
    }

    /// Whether `raw` canonicalizes to this identity. Unparsable input never matches.
    pub fn matches(&self, raw: &str) -> bool {
        Self::parse(raw).map(|other| other == *self).unwrap_or(false)
    }
}

impl fmt::Display for RepositoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl TryFrom<String> for RepositoryIdentity {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RepositoryIdentity> for String {
    fn from(value: RepositoryIdentity) -> Self {
        value.canonical
    }
}

fn invalid(url: &str, message: &str) -> Error {
    Error::InvalidUrl {
        url: url.to_string(),
        message: message.to_string(),
    }
}

/// Rewrites scp-like `user@host:path` into `ssh://user@host/path`.
fn scp_to_ssh(raw: &str) -> Option<String> {
    if raw.contains("://") {
        return None;
    }
    let (authority, path) = raw.split_once(':')?;
    if authority.is_empty() || authority.contains('/') || path.is_empty() {
        return None;
    }
    Some(format!("ssh://{}/{}", authority, path.trim_start_matches('/')))
}

fn strip_repo_suffix(path: &str) -> String {
    let mut path = path.trim_end_matches('/');
    if let Some(stripped) = path.strip_suffix(".git") {
        path = stripped.trim_end_matches('/');
    }
    path.to_string()
}
