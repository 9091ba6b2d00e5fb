//! Configuration Management
//!
//! Loads OCI API credentials from the INI style config file written by the
//! OCI CLI (`~/.oci/config` by default).

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Profile used when none is given
pub const DEFAULT_PROFILE: &str = "DEFAULT";

const REQUIRED_KEYS: &[&str] = &["user", "fingerprint", "key_file", "tenancy", "region"];

/// Credentials and scope for one profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OciConfig {
    pub profile: String,
    pub user: String,
    pub fingerprint: String,
    pub key_file: PathBuf,
    pub tenancy: String,
    pub region: String,
    pub pass_phrase: Option<String>,
}

impl OciConfig {
    /// Default config file path (`~/.oci/config`)
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(".oci").join("config"))
            .unwrap_or_else(|| PathBuf::from(".oci/config"))
    }

    /// Load a profile from a config file
    pub fn from_file(path: &Path, profile: &str) -> Result<Self> {
        let path = expand_home(&path.to_string_lossy());
        if !path.is_file() {
            return Err(Error::Config(format!("{} is not a file", path.display())));
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;

        tracing::debug!("Loading profile {} from {:?}", profile, path);
        Self::parse(&content, profile)
    }

    /// Parse a profile out of config file content
    ///
    /// Keys missing from the profile fall back to the `[DEFAULT]` section.
    pub fn parse(content: &str, profile: &str) -> Result<Self> {
        let sections = parse_sections(content);

        let Some(section) = sections.get(profile) else {
            return Err(Error::Config(format!("profile {} not found", profile)));
        };
        let defaults = sections.get(DEFAULT_PROFILE);

        let lookup = |key: &str| -> Option<String> {
            section
                .get(key)
                .or_else(|| defaults.and_then(|d| d.get(key)))
                .filter(|v| !v.is_empty())
                .cloned()
        };

        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| lookup(key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "profile {} is missing {}",
                profile,
                missing.join(", ")
            )));
        }

        let get = |key: &str| lookup(key).unwrap_or_default();

        Ok(Self {
            profile: profile.to_string(),
            user: get("user"),
            fingerprint: get("fingerprint"),
            key_file: expand_home(&get("key_file")),
            tenancy: get("tenancy"),
            region: get("region"),
            pass_phrase: lookup("pass_phrase"),
        })
    }

    /// The `keyId` presented in request signatures
    pub fn key_id(&self) -> String {
        format!("{}/{}/{}", self.tenancy, self.user, self.fingerprint)
    }
}

/// Split INI content into `section -> key -> value`
fn parse_sections(content: &str) -> HashMap<String, HashMap<String, String>> {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len() - 1].trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        let Some(section) = current.as_ref() else {
            tracing::warn!("Ignoring config line outside of a profile");
            continue;
        };

        if let Some((key, value)) = line.split_once('=') {
            sections
                .entry(section.clone())
                .or_default()
                .insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    sections
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
