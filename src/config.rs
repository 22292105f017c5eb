use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ProfileError, Result};

pub const ENDPOINT_ENV: &str = "PROFILE_ENDPOINT";
pub const TIMEOUT_ENV: &str = "PROFILE_TIMEOUT_SECS";

const DEFAULT_ENDPOINT: &str = "http://localhost:8181/api/auth";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const DEFAULT_FALLBACK_AVATAR: &str = "assets/img/anonymous.jpg";

/// Where the user service lives and how to talk to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base of the user routes, `load-profile` and `logout` are appended
    pub endpoint: Url,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Image shown while there is no profile picture
    #[serde(default = "default_fallback_avatar")]
    pub fallback_avatar: String,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_fallback_avatar() -> String {
    DEFAULT_FALLBACK_AVATAR.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT)
                .expect("default endpoint is a valid URL"),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: default_user_agent(),
            fallback_avatar: default_fallback_avatar(),
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            ..Default::default()
        }
    }

    /// Read a JSON config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        let config: ClientConfig = serde_json::from_slice(&bytes)?;
        log::debug!(
            "loaded config from {}: {:?}",
            path.as_ref().display(),
            config
        );
        Ok(config)
    }

    /// Override fields with `PROFILE_ENDPOINT` and `PROFILE_TIMEOUT_SECS`
    pub fn with_env(self) -> Result<Self> {
        self.with_vars(|key| std::env::var(key).ok())
    }

    /// Same as [ClientConfig::with_env] with a custom variable source
    pub fn with_vars<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENDPOINT_ENV) {
            self.endpoint = Url::parse(&endpoint).map_err(|e| {
                ProfileError::Config(format!("{}: {}", ENDPOINT_ENV, e))
            })?;
        }
        if let Some(timeout) = lookup(TIMEOUT_ENV) {
            self.timeout_secs = timeout.trim().parse().map_err(|_| {
                ProfileError::Config(format!(
                    "{} is not a number of seconds: {}",
                    TIMEOUT_ENV, timeout
                ))
            })?;
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full URL of a user route, e.g. `route("load-profile")`
    pub fn route(&self, name: &str) -> Result<Url> {
        let base = self.endpoint.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}/{}", base, name))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempdir::TempDir;

    #[test]
    fn route_appends_name() {
        let config =
            ClientConfig::new(Url::parse("http://api.test/api/user/").unwrap());
        assert_eq!(
            config.route("load-profile").unwrap().as_str(),
            "http://api.test/api/user/load-profile"
        );

        let config =
            ClientConfig::new(Url::parse("http://api.test/api/user").unwrap());
        assert_eq!(
            config.route("logout").unwrap().as_str(),
            "http://api.test/api/user/logout"
        );
    }

    #[test]
    fn load_fills_defaults() {
        let dir = TempDir::new("profile_config").unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "endpoint": "http://api.test/user" }"#).unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.endpoint.as_str(), "http://api.test/user");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.fallback_avatar, DEFAULT_FALLBACK_AVATAR);
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = TempDir::new("profile_config").unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "endpoint = 1").unwrap();

        assert!(matches!(
            ClientConfig::load(&path),
            Err(ProfileError::Parse)
        ));
    }

    #[test]
    fn vars_override_fields() {
        let vars: HashMap<&str, &str> = [
            (ENDPOINT_ENV, "https://users.test/api"),
            (TIMEOUT_ENV, " 3 "),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::default()
            .with_vars(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.endpoint.as_str(), "https://users.test/api");
        assert_eq!(config.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn bad_timeout_is_a_config_error() {
        let result = ClientConfig::default().with_vars(|key| {
            (key == TIMEOUT_ENV).then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(ProfileError::Config(_))));
    }
}
