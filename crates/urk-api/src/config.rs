//! # Node Configuration
//!
//! Read once from the environment at startup. Later changes to the
//! environment or to the files it points at are not observed until restart.
//!
//! | Variable              | Default                                   |
//! |-----------------------|-------------------------------------------|
//! | `PORT`                | `3000`                                    |
//! | `URK_ENV`             | `development`                             |
//! | `API_AUTH_TOKEN`      | `local-dev-token` (required in production)|
//! | `DATA_DIR`            | `./data`                                  |
//! | `KEYSTORE_PATH`       | `$DATA_DIR/keystore.json`                 |
//! | `LEDGER_PATH`         | `$DATA_DIR/global_compliance_ledger.json` |
//! | `REVOCATION_PATH`     | `$DATA_DIR/revocation_registry.json`      |
//! | `TRUST_REGISTRY_PATH` | `$DATA_DIR/trust_registry.json`           |
//! | `SCHEMA_DIR`          | `$DATA_DIR/schemas`                       |
//! | `PROVIDERS_PATH`      | unset                                     |
//! | `ISSUER_DIDS`         | empty (comma-separated)                   |
//! | `STRICT_MODE`         | `false`                                   |
//! | `REVOCATION_URL`      | unset (file store)                        |
//! | `REVOCATION_TOKEN`    | unset                                     |
//! | `LOG_FORMAT`          | `text` (`json`)                           |

use std::path::PathBuf;

use url::Url;
use urk_core::Did;
use urk_crypto::KeyStoreMode;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEV_AUTH_TOKEN: &str = "local-dev-token";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },

    #[error("API_AUTH_TOKEN must be set when URK_ENV=production")]
    MissingAuthToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// `LOG_FORMAT` as seen before the subscriber exists. Unknown values
    /// fall back to text.
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT").ok().as_deref().map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

#[derive(Clone)]
pub struct NodeConfig {
    pub port: u16,
    pub environment: Environment,
    pub auth_token: String,
    pub data_dir: PathBuf,
    pub keystore_path: PathBuf,
    pub ledger_path: PathBuf,
    pub revocation_path: PathBuf,
    pub trust_registry_path: PathBuf,
    pub schema_dir: PathBuf,
    pub providers_path: Option<PathBuf>,
    pub issuer_dids: Vec<Did>,
    /// Reject issuance for issuers missing from the provider registry.
    pub strict_mode: bool,
    pub revocation_url: Option<Url>,
    pub revocation_token: Option<String>,
    pub log_format: LogFormat,
}

impl NodeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match var("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: "PORT",
                reason: format!("'{raw}' is not a port number"),
            })?,
            None => DEFAULT_PORT,
        };

        let environment = match var("URK_ENV").as_deref() {
            None | Some("development") => Environment::Development,
            Some("production") => Environment::Production,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: "URK_ENV",
                    reason: format!("expected 'development' or 'production', got '{other}'"),
                })
            }
        };

        let auth_token = match (var("API_AUTH_TOKEN"), environment) {
            (Some(token), _) => token,
            (None, Environment::Development) => DEV_AUTH_TOKEN.to_string(),
            (None, Environment::Production) => return Err(ConfigError::MissingAuthToken),
        };

        let data_dir = var("DATA_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./data"));
        let path_or = |key: &str, default: &str| var(key).map(PathBuf::from).unwrap_or_else(|| data_dir.join(default));

        let issuer_dids = var("ISSUER_DIDS")
            .map(|raw| parse_issuer_dids(&raw))
            .transpose()?
            .unwrap_or_default();

        let strict_mode = match var("STRICT_MODE").as_deref() {
            None | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: "STRICT_MODE",
                    reason: format!("expected 'true' or 'false', got '{other}'"),
                })
            }
        };

        let revocation_url = var("REVOCATION_URL")
            .map(|raw| {
                Url::parse(&raw).map_err(|e| ConfigError::InvalidValue {
                    var: "REVOCATION_URL",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let log_format = match var("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: "LOG_FORMAT",
                    reason: format!("expected 'text' or 'json', got '{other}'"),
                })
            }
        };

        Ok(Self {
            port,
            environment,
            auth_token,
            keystore_path: path_or("KEYSTORE_PATH", "keystore.json"),
            ledger_path: path_or("LEDGER_PATH", "global_compliance_ledger.json"),
            revocation_path: path_or("REVOCATION_PATH", "revocation_registry.json"),
            trust_registry_path: path_or("TRUST_REGISTRY_PATH", "trust_registry.json"),
            schema_dir: path_or("SCHEMA_DIR", "schemas"),
            providers_path: var("PROVIDERS_PATH").map(PathBuf::from),
            data_dir,
            issuer_dids,
            strict_mode,
            revocation_url,
            revocation_token: var("REVOCATION_TOKEN"),
            log_format,
        })
    }

    /// Development defaults rooted at `data_dir`.
    pub fn development(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            port: DEFAULT_PORT,
            environment: Environment::Development,
            auth_token: DEV_AUTH_TOKEN.to_string(),
            keystore_path: data_dir.join("keystore.json"),
            ledger_path: data_dir.join("global_compliance_ledger.json"),
            revocation_path: data_dir.join("revocation_registry.json"),
            trust_registry_path: data_dir.join("trust_registry.json"),
            schema_dir: data_dir.join("schemas"),
            providers_path: None,
            data_dir,
            issuer_dids: Vec::new(),
            strict_mode: false,
            revocation_url: None,
            revocation_token: None,
            log_format: LogFormat::Text,
        }
    }

    pub fn keystore_mode(&self) -> KeyStoreMode {
        match self.environment {
            Environment::Development => KeyStoreMode::Development,
            Environment::Production => KeyStoreMode::Production,
        }
    }
}

fn parse_issuer_dids(raw: &str) -> Result<Vec<Did>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Did::new(s).map_err(|e| ConfigError::InvalidValue {
                var: "ISSUER_DIDS",
                reason: e.to_string(),
            })
        })
        .collect()
}

impl std::fmt::Debug for NodeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeConfig")
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("auth_token", &"[REDACTED]")
            .field("data_dir", &self.data_dir)
            .field("keystore_path", &self.keystore_path)
            .field("ledger_path", &self.ledger_path)
            .field("revocation_path", &self.revocation_path)
            .field("trust_registry_path", &self.trust_registry_path)
            .field("schema_dir", &self.schema_dir)
            .field("providers_path", &self.providers_path)
            .field("issuer_dids", &self.issuer_dids)
            .field("strict_mode", &self.strict_mode)
            .field("revocation_url", &self.revocation_url.as_ref().map(Url::as_str))
            .field("revocation_token", &self.revocation_token.as_ref().map(|_| "[REDACTED]"))
            .field("log_format", &self.log_format)
            .finish()
    }
}
