//! Named AWS credential profiles.
//!
//! Profile *resolution* (reading keys, SSO tokens, role assumption) is left
//! to the AWS SDK. This module only answers "does the profile the descriptor
//! names exist?", so a typo fails fast with the files that were searched
//! instead of surfacing later as an opaque credentials error.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static SECTION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[\s*([^\]]+?)\s*\]\s*(?:[#;].*)?$").expect("section regex is valid"));

/// Locations of the shared AWS config and credentials files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsFiles {
    pub config_file: PathBuf,
    pub credentials_file: PathBuf,
}

impl AwsFiles {
    pub fn new(config_file: impl Into<PathBuf>, credentials_file: impl Into<PathBuf>) -> Self {
        Self {
            config_file: config_file.into(),
            credentials_file: credentials_file.into(),
        }
    }

    /// Resolve file locations the way the AWS CLI does: `AWS_CONFIG_FILE` and
    /// `AWS_SHARED_CREDENTIALS_FILE` win, otherwise `~/.aws/config` and
    /// `~/.aws/credentials`.
    pub fn discover() -> Self {
        let aws_dir = dirs::home_dir()
            .map(|home| home.join(".aws"))
            .unwrap_or_else(|| PathBuf::from(".aws"));

        let config_file =
            env_path("AWS_CONFIG_FILE").unwrap_or_else(|| aws_dir.join("config"));
        let credentials_file = env_path("AWS_SHARED_CREDENTIALS_FILE")
            .unwrap_or_else(|| aws_dir.join("credentials"));

        tracing::trace!(
            config = %config_file.display(),
            credentials = %credentials_file.display(),
            "aws shared files"
        );

        Self {
            config_file,
            credentials_file,
        }
    }

    /// Every profile defined in either file, in order of first appearance.
    ///
    /// Missing files count as empty.
    pub fn profiles(&self) -> Result<Vec<String>> {
        let mut profiles = Vec::new();

        for name in read_sections(&self.config_file)?
            .iter()
            .filter_map(|s| config_section_profile(s))
        {
            if !profiles.contains(&name) {
                profiles.push(name);
            }
        }
        for name in read_sections(&self.credentials_file)? {
            if !profiles.contains(&name) {
                profiles.push(name);
            }
        }

        Ok(profiles)
    }

    /// Profiles other than `default`.
    pub fn named_profiles(&self) -> Result<Vec<String>> {
        Ok(self
            .profiles()?
            .into_iter()
            .filter(|p| p != "default")
            .collect())
    }

    /// Fail with [`Error::ProfileNotFound`] unless `profile` is defined.
    pub fn ensure_profile(&self, profile: &str) -> Result<()> {
        if self.profiles()?.iter().any(|p| p == profile) {
            tracing::debug!(profile, "credential profile found");
            return Ok(());
        }
        Err(Error::ProfileNotFound {
            profile: profile.to_string(),
            searched: vec![self.config_file.clone(), self.credentials_file.clone()],
        })
    }
}

/// Expand a leading `~` the way the AWS SDK does for its file variables.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

fn env_path(var: &str) -> Option<PathBuf> {
    let raw = std::env::var_os(var)?;
    Some(match raw.to_str() {
        Some(s) => expand_path(s),
        None => PathBuf::from(raw),
    })
}

/// Profile name for a section header of the *config* file.
///
/// `[default]` and `[profile x]` are profiles; `[sso-session x]`,
/// `[services x]` and friends are not.
fn config_section_profile(section: &str) -> Option<String> {
    if section == "default" {
        return Some("default".to_string());
    }
    section
        .strip_prefix("profile")
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .map(|rest| rest.trim().to_string())
        .filter(|name| !name.is_empty())
}

fn read_sections(path: &Path) -> Result<Vec<String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    Ok(content
        .lines()
        .filter_map(|line| SECTION_REGEX.captures(line))
        .map(|caps| caps[1].to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    fn files(config: &str, credentials: &str) -> (tempfile::TempDir, AwsFiles) {
        let dir = tempdir().unwrap();
        let config_file = dir.path().join("config");
        let credentials_file = dir.path().join("credentials");
        fs::write(&config_file, config).unwrap();
        fs::write(&credentials_file, credentials).unwrap();
        (dir, AwsFiles::new(config_file, credentials_file))
    }

    #[test]
    fn test_profiles_from_both_files() {
        let (_dir, aws) = files(
            "[default]\nregion = us-east-1\n\n[profile dev]\nregion = ap-southeast-2\n[sso-session corp]\nsso_region = us-east-1\n",
            "[default]\naws_access_key_id = x\n[legacy]\naws_access_key_id = y\n",
        );
        assert_eq!(aws.profiles().unwrap(), vec!["default", "dev", "legacy"]);
        assert_eq!(aws.named_profiles().unwrap(), vec!["dev", "legacy"]);
    }

    #[test]
    fn test_ensure_profile() {
        let (_dir, aws) = files("[profile dev]\n", "");
        assert!(aws.ensure_profile("dev").is_ok());
        let err = aws.ensure_profile("prod").unwrap_err();
        match err {
            Error::ProfileNotFound { profile, searched } => {
                assert_eq!(profile, "prod");
                assert_eq!(searched.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_profile_section_only_counts_in_config() {
        // In the credentials file the header is the bare profile name.
        let (_dir, aws) = files("", "[profile dev]\n");
        assert_eq!(aws.profiles().unwrap(), vec!["profile dev"]);
        assert!(aws.ensure_profile("dev").is_err());
    }

    #[test]
    fn test_missing_files_are_empty() {
        let dir = tempdir().unwrap();
        let aws = AwsFiles::new(dir.path().join("nope"), dir.path().join("nada"));
        assert!(aws.profiles().unwrap().is_empty());
        assert!(aws.ensure_profile("dev").is_err());
    }

    #[test]
    fn test_section_header_variants() {
        let (_dir, aws) = files(
            "  [ profile spaced ]  \n[profile   tabs]\n[profileless]\n[profile dev] # comment\nkey = [not a section]\n",
            "",
        );
        assert_eq!(aws.profiles().unwrap(), vec!["spaced", "tabs", "dev"]);
    }

    #[test]
    #[serial]
    fn test_discover_expands_tilde_in_env_paths() {
        let home = tempdir().unwrap();
        fs::create_dir_all(home.path().join(".aws")).unwrap();
        fs::write(home.path().join(".aws/custom"), "[profile dev]\n").unwrap();

        let saved: Vec<_> = ["HOME", "AWS_CONFIG_FILE", "AWS_SHARED_CREDENTIALS_FILE"]
            .iter()
            .map(|var| (*var, std::env::var_os(var)))
            .collect();
        std::env::set_var("HOME", home.path());
        std::env::set_var("AWS_CONFIG_FILE", "~/.aws/custom");
        std::env::set_var("AWS_SHARED_CREDENTIALS_FILE", "~/.aws/creds");

        let aws = AwsFiles::discover();
        let found = aws.ensure_profile("dev");

        for (var, value) in saved {
            match value {
                Some(value) => std::env::set_var(var, value),
                None => std::env::remove_var(var),
            }
        }

        assert_eq!(aws.config_file, home.path().join(".aws/custom"));
        assert_eq!(aws.credentials_file, home.path().join(".aws/creds"));
        assert!(found.is_ok());
    }

    #[test]
    #[serial]
    fn test_expand_path() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_path("~/.aws/config"), home.join(".aws/config"));
        assert_eq!(expand_path("/etc/aws/config"), PathBuf::from("/etc/aws/config"));
        assert_eq!(expand_path("relative/~x"), PathBuf::from("relative/~x"));
    }
}
