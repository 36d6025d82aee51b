//! Service configuration.
//!
//! Values come from environment variables with defaults. Loading never fails:
//! unparsable values are logged and replaced by their default.

use std::time::Duration;

use rand::RngCore;

use crate::auth::HashCost;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "sqlite://blog.db?mode=rwc";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;
/// Longest accepted token lifetime (100 years); expiry must stay representable.
const MAX_TOKEN_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// HMAC key used to sign bearer tokens. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// 32 random bytes from the OS RNG.
    pub fn random() -> Self {
        let mut bytes = vec![0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// Authentication settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub signing_secret: SigningSecret,
    pub token_ttl: Duration,
    pub hash_cost: HashCost,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_secret: SigningSecret::random(),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
            hash_cost: HashCost::default(),
        }
    }
}

/// Application configuration shared by services.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub service_name: String,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Defaults for `service_name`, without reading the environment.
    pub fn with_service(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            auth: AuthConfig::default(),
        }
    }

    /// Loads configuration from the process environment.
    pub fn load_with_service(service_name: &str) -> Self {
        Self::load_from(service_name, |key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn load_from<F>(service_name: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::with_service(service_name);
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("SERVER_HOST") {
            config.host = host;
        }
        config.port = parse_or(&get, "SERVER_PORT", config.port);
        if let Some(url) = get("DATABASE_URL") {
            config.database_url = url;
        }
        config.database_max_connections = parse_or(
            &get,
            "DATABASE_MAX_CONNECTIONS",
            config.database_max_connections,
        );

        match get("API_SECRET") {
            Some(secret) => config.auth.signing_secret = SigningSecret::new(secret.into_bytes()),
            None => tracing::warn!(
                "API_SECRET not set; using a random signing secret (tokens will not survive a restart)"
            ),
        }
        let ttl = parse_or(&get, "TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS);
        let ttl = if (1..=MAX_TOKEN_TTL_SECS).contains(&ttl) {
            ttl
        } else {
            tracing::warn!(
                value = ttl,
                max = MAX_TOKEN_TTL_SECS,
                "TOKEN_TTL_SECS out of range, using default"
            );
            DEFAULT_TOKEN_TTL_SECS
        };
        config.auth.token_ttl = Duration::from_secs(ttl);

        let cost = config.auth.hash_cost;
        config.auth.hash_cost = HashCost {
            memory_kib: parse_or(&get, "HASH_MEMORY_KIB", cost.memory_kib),
            iterations: parse_or(&get, "HASH_ITERATIONS", cost.iterations),
            parallelism: parse_or(&get, "HASH_PARALLELISM", cost.parallelism),
        };

        config
    }
}

fn parse_or<T, F>(get: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "invalid configuration value, using default");
            default
        }),
        None => default,
    }
}

/// Load .env file from the working directory (best-effort, no error if missing).
///
/// Variables already present in the environment win.
pub fn load_dotenv() {
    let Ok(content) = std::fs::read_to_string(".env") else {
        return;
    };
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim().trim_matches('"');
            if std::env::var(key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }
}
