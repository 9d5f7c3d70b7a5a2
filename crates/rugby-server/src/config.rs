use std::path::PathBuf;

use anyhow::{Context, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

/// Longest token lifetime accepted, in days.
const MAX_TOKEN_TTL_DAYS: i64 = 3650;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = lookup("RUGBY_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("RUGBY_JWT_SECRET is unset or still a placeholder");
        }

        let port = match lookup("RUGBY_PORT") {
            Some(v) => v.parse().with_context(|| format!("RUGBY_PORT is not a port: {v}"))?,
            None => 3000,
        };
        let token_ttl_days = match lookup("RUGBY_TOKEN_TTL_DAYS") {
            Some(v) => v
                .parse()
                .ok()
                .filter(|days: &i64| (1..=MAX_TOKEN_TTL_DAYS).contains(days))
                .with_context(|| {
                    format!("RUGBY_TOKEN_TTL_DAYS must be between 1 and {MAX_TOKEN_TTL_DAYS}: {v}")
                })?,
            None => 30,
        };

        Ok(Self {
            host: lookup("RUGBY_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: lookup("RUGBY_DB_PATH").unwrap_or_else(|| "rugby.db".into()).into(),
            jwt_secret,
            token_ttl_days,
            static_dir: lookup("RUGBY_STATIC_DIR").unwrap_or_else(|| "./static".into()).into(),
        })
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.token_ttl_days)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = Config::from_lookup(lookup_from(&[("RUGBY_JWT_SECRET", "s3cret-value")])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.db_path, PathBuf::from("rugby.db"));
        assert_eq!(config.static_dir, PathBuf::from("./static"));
        assert_eq!(config.token_ttl(), chrono::Duration::days(30));
    }

    #[test]
    fn missing_or_placeholder_secret_is_refused() {
        assert!(Config::from_lookup(lookup_from(&[])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("RUGBY_JWT_SECRET", "dev-secret-change-me")])).is_err());
    }

    #[test]
    fn overrides_and_bad_numbers() {
        let config = Config::from_lookup(lookup_from(&[
            ("RUGBY_JWT_SECRET", "s3cret-value"),
            ("RUGBY_PORT", "8080"),
            ("RUGBY_TOKEN_TTL_DAYS", "7"),
            ("RUGBY_DB_PATH", "/var/lib/rugby/rugby.db"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.token_ttl_days, 7);
        assert_eq!(config.db_path, PathBuf::from("/var/lib/rugby/rugby.db"));

        let bad_port = lookup_from(&[("RUGBY_JWT_SECRET", "s3cret-value"), ("RUGBY_PORT", "eighty")]);
        assert!(Config::from_lookup(bad_port).is_err());
        let bad_ttl = lookup_from(&[("RUGBY_JWT_SECRET", "s3cret-value"), ("RUGBY_TOKEN_TTL_DAYS", "0")]);
        assert!(Config::from_lookup(bad_ttl).is_err());
    }

    #[test]
    fn huge_ttl_is_refused_not_panicking() {
        let secret = ("RUGBY_JWT_SECRET", "s3cret-value");
        for days in ["3651", "1000000000000", "9223372036854775807"] {
            let lookup = lookup_from(&[secret, ("RUGBY_TOKEN_TTL_DAYS", days)]);
            assert!(Config::from_lookup(lookup).is_err(), "accepted {days}");
        }

        let max = Config::from_lookup(lookup_from(&[secret, ("RUGBY_TOKEN_TTL_DAYS", "3650")])).unwrap();
        assert_eq!(max.token_ttl(), chrono::Duration::days(3650));
    }
}
