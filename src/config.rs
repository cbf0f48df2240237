use serde::{Deserialize, Serialize};
use shodanx::api::{self, ClientBuilder, EXPLOITS_API_BASE, REST_API_BASE, STREAM_API_BASE};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use toml;

/// Overrides the `api_key` configured in the file.
pub(crate) const API_KEY_VAR: &'static str = "SHODAN_API_KEY";

#[derive(Deserialize, Serialize, Default, Debug)]
pub(crate) struct Endpoints {
    pub rest: Option<String>,
    pub stream: Option<String>,
    pub exploits: Option<String>,
}

#[derive(Deserialize, Serialize, Default, Debug)]
pub(crate) struct Http {
    pub user_agent: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
}

#[derive(Deserialize, Serialize, Default, Debug)]
pub(crate) struct Config {
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub http: Http,
}

#[derive(Error, Debug)]
pub(crate) enum ConfigError {
    #[error("failed to read config \"{}\"", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
    #[error("failed to reserialize config")]
    Reserialize(#[from] toml::ser::Error),
    #[error("no API key configured, set {} or add api_key to the config file", API_KEY_VAR)]
    MissingApiKey,
}

/// Which API a client is built for.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Endpoint {
    Rest,
    Stream,
    Exploits,
}

impl Config {
    /// The key from the environment, falling back to the file.
    pub(crate) fn api_key(&self) -> Result<String, ConfigError> {
        resolve_api_key(std::env::var(API_KEY_VAR).ok(), self.api_key.as_deref())
            .ok_or(ConfigError::MissingApiKey)
    }

    pub(crate) fn api_base(&self, endpoint: Endpoint) -> &str {
        let (configured, default) = match endpoint {
            Endpoint::Rest => (&self.endpoints.rest, REST_API_BASE),
            Endpoint::Stream => (&self.endpoints.stream, STREAM_API_BASE),
            Endpoint::Exploits => (&self.endpoints.exploits, EXPLOITS_API_BASE),
        };

        configured.as_deref().unwrap_or(default)
    }

    /// A client builder with the key, base and HTTP settings applied.
    pub(crate) fn client_builder(&self, endpoint: Endpoint) -> Result<ClientBuilder, ConfigError> {
        let mut builder = api::Client::builder(self.api_key()?).api_base(self.api_base(endpoint));

        if let Some(user_agent) = &self.http.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        if let Some(secs) = self.http.connect_timeout_secs {
            builder = builder.connect_timeout(Some(Duration::from_secs(secs)));
        }

        if let Some(secs) = self.http.timeout_secs {
            builder = builder.timeout(Some(Duration::from_secs(secs)));
        }

        Ok(builder)
    }
}

fn resolve_api_key(env: Option<String>, file: Option<&str>) -> Option<String> {
    env.filter(|key| !key.trim().is_empty())
        .or_else(|| file.map(str::to_string))
        .filter(|key| !key.trim().is_empty())
}

fn get_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME");

    if let Some(home) = home {
        let home = PathBuf::from(home);

        const USER_PATHS: [&str; 2] = [".config/shodanx/config.toml", ".shodanx.toml"];

        for &path in USER_PATHS.iter() {
            let fullpath = home.join(path);

            if fullpath.exists() {
                return Some(fullpath);
            }
        }
    }

    let system_config = PathBuf::from("/etc/shodanx.toml");

    if system_config.exists() {
        Some(system_config)
    } else {
        None
    }
}

fn extraneous_keys_helper<'a>(
    path: &mut Vec<&'a String>,
    user_config: &'a toml::Table,
    config: &'a toml::Table,
    found: &mut Vec<String>,
) {
    for (user_key, user_value) in user_config {
        path.push(user_key);

        match (user_value, config.get(user_key)) {
            (toml::Value::Table(user_value), Some(toml::Value::Table(config_value))) => {
                extraneous_keys_helper(path, user_value, config_value, found)
            }
            (_, Some(_)) => {}
            (_, None) => {
                let path: Vec<&str> = path.iter().map(|&s| s.as_str()).collect();

                found.push(path.join("."));
            }
        }

        path.pop();
    }
}

/// Dotted paths of keys in `raw_config` that `config` has no field for.
fn extraneous_keys(config: &Config, raw_config: &str) -> Result<Vec<String>, ConfigError> {
    let user_config: toml::Table = toml::de::from_str(raw_config)?;

    let config: toml::Table = toml::de::from_str(&toml::ser::to_string(config)?)?;

    let mut path = Vec::new();
    let mut found = Vec::new();

    extraneous_keys_helper(&mut path, &user_config, &config, &mut found);

    Ok(found)
}

fn parse_config(raw_config: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::de::from_str(raw_config)?;

    for key in extraneous_keys(&config, raw_config)? {
        crate::warn!("config contains extraneous key \"{}\", ignoring", key);
    }

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    let raw_config = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config(&raw_config)
}

pub(crate) fn read_config(config: Option<PathBuf>) -> Result<Config, ConfigError> {
    let config_path = config.or_else(get_config_path);

    match config_path {
        Some(path) => read_config_file(&path),
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
api_key = "filekey"

[endpoints]
rest = "http://127.0.0.1:8080"

[http]
user_agent = "scanner/1.0"
timeout_secs = 5
"#;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(FULL).unwrap();

        assert_eq!(config.api_key.as_deref(), Some("filekey"));
        assert_eq!(config.api_base(Endpoint::Rest), "http://127.0.0.1:8080");
        assert_eq!(config.api_base(Endpoint::Stream), STREAM_API_BASE);
        assert_eq!(config.api_base(Endpoint::Exploits), EXPLOITS_API_BASE);
        assert_eq!(config.http.timeout_secs, Some(5));
        assert_eq!(config.http.connect_timeout_secs, None);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();

        assert!(config.api_key.is_none());
        assert_eq!(config.api_base(Endpoint::Rest), REST_API_BASE);
    }

    #[test]
    fn test_extraneous_keys_are_reported() {
        let raw = r#"
api_key = "k"
editor = "vim"

[endpoints]
stream = "https://stream.example"
mirror = "https://mirror.example"

[proxy]
url = "http://proxy"
"#;

        let config: Config = toml::de::from_str(raw).unwrap();
        let mut keys = extraneous_keys(&config, raw).unwrap();
        keys.sort();

        assert_eq!(keys, ["editor", "endpoints.mirror", "proxy"]);
        assert!(extraneous_keys(&parse_config(FULL).unwrap(), FULL).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        assert!(matches!(parse_config("api_key = "), Err(ConfigError::Parse(_))));
        assert!(matches!(
            parse_config("[http]\ntimeout_secs = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_environment_key_wins() {
        assert_eq!(
            resolve_api_key(Some("envkey".into()), Some("filekey")).as_deref(),
            Some("envkey")
        );
        assert_eq!(resolve_api_key(Some("  ".into()), Some("filekey")).as_deref(), Some("filekey"));
        assert_eq!(resolve_api_key(None, Some("filekey")).as_deref(), Some("filekey"));
        assert_eq!(resolve_api_key(None, Some("")), None);
        assert_eq!(resolve_api_key(None, None), None);
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let err = read_config(Some(PathBuf::from("/nonexistent/shodanx.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
