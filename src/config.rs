use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tutorlane::{AgentId, AnthropicConfig, RoutingFallback, SpecialistConfig, TutorConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub log_to_file: bool,
    pub oracle: OracleConfig,
    pub specialist: SpecialistSection,
    pub routing: RoutingConfig,
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub model: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
    pub api_key_env: String,
    pub base_url: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        let defaults = AnthropicConfig::default();
        Self {
            model: defaults.model,
            max_tokens: defaults.max_tokens,
            timeout_ms: defaults.timeout.as_millis() as u64,
            api_key_env: defaults.api_key_env,
            base_url: defaults.base_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialistSection {
    pub max_iterations: u32,
}

impl Default for SpecialistSection {
    fn default() -> Self {
        Self {
            max_iterations: SpecialistConfig::default().max_iterations,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// reject | keywords | default
    pub fallback: String,
    /// Target for `fallback: default`
    pub default_agent: Option<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            fallback: "reject".to_string(),
            default_agent: None,
        }
    }
}

impl RoutingConfig {
    pub fn to_fallback(&self) -> Result<RoutingFallback> {
        match self.fallback.trim().to_lowercase().as_str() {
            "reject" => Ok(RoutingFallback::Reject),
            "keywords" => Ok(RoutingFallback::Keywords),
            "default" => {
                let Some(name) = &self.default_agent else {
                    bail!("routing.fallback is 'default' but routing.default_agent is not set");
                };
                let agent: AgentId = name.parse().context("Invalid routing.default_agent")?;
                Ok(RoutingFallback::Default(agent))
            }
            other => bail!("Unknown routing.fallback '{}' (expected reject, keywords or default)", other),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            log_to_file: false,
            oracle: OracleConfig::default(),
            specialist: SpecialistSection::default(),
            routing: RoutingConfig::default(),
            request_timeout_ms: None,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");

        // ~/.config/tutorlane/tutorlane.yml
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // ./tutorlane.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Pipeline settings for the library
    pub fn to_tutor_config(&self) -> Result<TutorConfig> {
        if self.specialist.max_iterations == 0 {
            bail!("specialist.max_iterations must be at least 1");
        }
        Ok(TutorConfig {
            specialist: SpecialistConfig {
                max_iterations: self.specialist.max_iterations,
            },
            fallback: self.routing.to_fallback()?,
            request_timeout: self.request_timeout_ms.map(Duration::from_millis),
        })
    }

    pub fn anthropic_config(&self) -> AnthropicConfig {
        AnthropicConfig {
            model: self.oracle.model.clone(),
            max_tokens: self.oracle.max_tokens,
            timeout: Duration::from_millis(self.oracle.timeout_ms),
            base_url: self.oracle.base_url.clone(),
            api_key_env: self.oracle.api_key_env.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.log_level.as_deref(), Some("info"));
        assert!(!config.log_to_file);
        assert_eq!(config.oracle.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(config.specialist.max_iterations, 5);
        assert_eq!(config.routing.fallback, "reject");

        let tutor = config.to_tutor_config().unwrap();
        assert_eq!(tutor.fallback, RoutingFallback::Reject);
        assert!(tutor.request_timeout.is_none());
    }

    #[test]
    fn test_load_explicit_path() {
        let file = write_config(
            r#"
log_level: debug
oracle:
  model: claude-test
  timeout_ms: 5000
specialist:
  max_iterations: 3
routing:
  fallback: keywords
request_timeout_ms: 20000
"#,
        );
        let config = Config::load(Some(&file.path().to_path_buf())).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.oracle.model, "claude-test");
        // unspecified fields keep their defaults
        assert_eq!(config.oracle.max_tokens, 1024);

        let anthropic = config.anthropic_config();
        assert_eq!(anthropic.timeout, Duration::from_secs(5));

        let tutor = config.to_tutor_config().unwrap();
        assert_eq!(tutor.specialist.max_iterations, 3);
        assert_eq!(tutor.fallback, RoutingFallback::Keywords);
        assert_eq!(tutor.request_timeout, Some(Duration::from_secs(20)));
    }

    #[test]
    fn test_default_agent_fallback() {
        let file = write_config("routing:\n  fallback: default\n  default_agent: physics\n");
        let config = Config::load(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(
            config.to_tutor_config().unwrap().fallback,
            RoutingFallback::Default(AgentId::Physics)
        );
    }

    #[test]
    fn test_default_fallback_requires_agent() {
        let config = Config {
            routing: RoutingConfig {
                fallback: "default".to_string(),
                default_agent: None,
            },
            ..Default::default()
        };
        assert!(config.to_tutor_config().is_err());
    }

    #[test]
    fn test_unknown_fallback_rejected() {
        let config = Config {
            routing: RoutingConfig {
                fallback: "guess".to_string(),
                default_agent: None,
            },
            ..Default::default()
        };
        assert!(config.to_tutor_config().is_err());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let config = Config {
            specialist: SpecialistSection { max_iterations: 0 },
            ..Default::default()
        };
        assert!(config.to_tutor_config().is_err());
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_load_invalid_yaml_errors() {
        let file = write_config("oracle: [not, a, map");
        assert!(Config::load(Some(&file.path().to_path_buf())).is_err());
    }
}
