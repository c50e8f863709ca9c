use std::env;

/// Which [`RemoteGateway`](crate::gateway::RemoteGateway) implementation backs the server.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayBackend {
    Postgres {
        database_url: String,
        jwt_secret: String,
        token_ttl_hours: i64,
        run_migrations: bool,
    },
    Rest {
        base_url: String,
        service_key: String,
    },
    Memory,
}

impl GatewayBackend {
    pub fn name(&self) -> &'static str {
        match self {
            GatewayBackend::Postgres { .. } => "postgres",
            GatewayBackend::Rest { .. } => "rest",
            GatewayBackend::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub environment: String,
    pub frontend_urls: Vec<String>,
    pub backend: GatewayBackend,
    /// Root directory for blobs stored by the postgres backend.
    pub storage_dir: String,
    /// Prefix of public file URLs, e.g. `http://localhost:8080`.
    pub public_base_url: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidFormat(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let port = or_default("SERVER_PORT", "8080")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidFormat("SERVER_PORT must be a valid port number".to_string()))?;

        // Parse allowed origins
        let frontend_urls = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let backend = match lookup("GATEWAY_BACKEND")
            .unwrap_or_else(|| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => GatewayBackend::Postgres {
                database_url: required("DATABASE_URL")?,
                jwt_secret: required("JWT_SECRET")?,
                token_ttl_hours: or_default("TOKEN_TTL_HOURS", "24")
                    .parse::<i64>()
                    .ok()
                    .filter(|h| *h > 0)
                    .ok_or_else(|| {
                        ConfigError::InvalidFormat("TOKEN_TTL_HOURS must be a positive number".to_string())
                    })?,
                run_migrations: parse_flag(&or_default("RUN_MIGRATIONS", "true"))?,
            },
            "rest" => GatewayBackend::Rest {
                base_url: required("REST_BASE_URL")?,
                service_key: required("REST_SERVICE_KEY")?,
            },
            "memory" => GatewayBackend::Memory,
            other => {
                return Err(ConfigError::InvalidFormat(format!(
                    "GATEWAY_BACKEND must be one of postgres, rest, memory (got '{}')",
                    other
                )))
            }
        };

        let storage_dir = lookup("STORAGE_DIR").unwrap_or_else(|| "uploads".to_string());
        let public_base_url = lookup("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                ConfigError::InvalidFormat("MAX_UPLOAD_BYTES must be a number of bytes".to_string())
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(AppConfig {
            port,
            environment,
            frontend_urls,
            backend,
            storage_dir,
            public_base_url,
            max_upload_bytes,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn parse_flag(raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFormat(format!("'{}' is not a boolean", raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn postgres_is_the_default_and_needs_credentials() {
        match config(&[]) {
            Err(ConfigError::MissingVariable(var)) => assert_eq!(var, "DATABASE_URL"),
            other => panic!("unexpected result: {:?}", other),
        }

        let cfg = config(&[
            ("DATABASE_URL", "postgres://localhost/taskboard"),
            ("JWT_SECRET", "secret"),
        ])
        .unwrap();
        assert_eq!(
            cfg.backend,
            GatewayBackend::Postgres {
                database_url: "postgres://localhost/taskboard".into(),
                jwt_secret: "secret".into(),
                token_ttl_hours: 24,
                run_migrations: true,
            }
        );
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(cfg.is_development());
    }

    #[test]
    fn memory_backend_needs_nothing_else() {
        let cfg = config(&[
            ("GATEWAY_BACKEND", "memory"),
            ("SERVER_PORT", "9000"),
            ("PUBLIC_BASE_URL", "https://tasks.example.com/"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
        ])
        .unwrap();
        assert_eq!(cfg.backend, GatewayBackend::Memory);
        assert_eq!(cfg.public_base_url, "https://tasks.example.com");
        assert_eq!(cfg.frontend_urls, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn rest_backend_requires_url_and_key() {
        let err = config(&[("GATEWAY_BACKEND", "rest"), ("REST_BASE_URL", "https://x.supabase.co")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVariable(ref v) if v == "REST_SERVICE_KEY"));
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(matches!(
            config(&[("GATEWAY_BACKEND", "memory"), ("SERVER_PORT", "eighty")]),
            Err(ConfigError::InvalidFormat(_))
        ));
        assert!(matches!(
            config(&[("GATEWAY_BACKEND", "sqlite")]),
            Err(ConfigError::InvalidFormat(_))
        ));
        assert!(matches!(
            config(&[
                ("DATABASE_URL", "postgres://db"),
                ("JWT_SECRET", "s"),
                ("RUN_MIGRATIONS", "maybe"),
            ]),
            Err(ConfigError::InvalidFormat(_))
        ));
    }
}
