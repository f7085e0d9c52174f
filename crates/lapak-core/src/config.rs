use thiserror::Error;

use crate::app_config::{AppConfig, Environment};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The parsing/validation logic is decoupled from the actual environment so
/// it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var`
/// needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let backend_url = require("LAPAK_BACKEND_URL")?;
    let anon_key = require("LAPAK_BACKEND_ANON_KEY")?;

    let env = parse_environment(&or_default("LAPAK_ENV", "development"));
    let bind_addr = parse_addr("LAPAK_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("LAPAK_LOG_LEVEL", "info");
    let request_timeout_secs = parse_u64("LAPAK_REQUEST_TIMEOUT_SECS", "10")?;

    // Radius slider bounds exposed to buyers, in meters.
    let min_radius_m = parse_f64("LAPAK_MIN_RADIUS_M", "100")?;
    let max_radius_m = parse_f64("LAPAK_MAX_RADIUS_M", "5000")?;

    if !(min_radius_m > 0.0 && max_radius_m > min_radius_m) {
        return Err(ConfigError::InvalidEnvVar {
            var: "LAPAK_MAX_RADIUS_M".to_string(),
            reason: format!(
                "radius bounds must satisfy 0 < min < max, got min={min_radius_m} max={max_radius_m}"
            ),
        });
    }

    Ok(AppConfig {
        backend_url,
        anon_key,
        env,
        bind_addr,
        log_level,
        request_timeout_secs,
        min_radius_m,
        max_radius_m,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    /// Returns a map with all required env vars populated with valid defaults.
    fn full_env<'a>() -> HashMap<&'a str, &'a str> {
        let mut m = HashMap::new();
        m.insert("LAPAK_BACKEND_URL", "https://backend.example.com");
        m.insert("LAPAK_BACKEND_ANON_KEY", "test-anon-key");
        m
    }

    #[test]
    fn fails_without_backend_url() {
        let map: HashMap<&str, &str> = HashMap::new();
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "LAPAK_BACKEND_URL"),
            "expected MissingEnvVar(LAPAK_BACKEND_URL), got: {result:?}"
        );
    }

    #[test]
    fn fails_without_anon_key() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("LAPAK_BACKEND_URL", "https://backend.example.com");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "LAPAK_BACKEND_ANON_KEY"),
            "expected MissingEnvVar(LAPAK_BACKEND_ANON_KEY), got: {result:?}"
        );
    }

    #[test]
    fn succeeds_with_required_vars_and_defaults() {
        let cfg = build_app_config(lookup_from_map(&full_env())).expect("config should build");
        assert_eq!(cfg.env, Environment::Development);
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.request_timeout_secs, 10);
        assert!((cfg.min_radius_m - 100.0).abs() < f64::EPSILON);
        assert!((cfg.max_radius_m - 5000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fails_with_invalid_bind_addr() {
        let mut map = full_env();
        map.insert("LAPAK_BIND_ADDR", "not-a-socket-addr");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LAPAK_BIND_ADDR"),
            "expected InvalidEnvVar(LAPAK_BIND_ADDR), got: {result:?}"
        );
    }

    #[test]
    fn fails_with_non_numeric_timeout() {
        let mut map = full_env();
        map.insert("LAPAK_REQUEST_TIMEOUT_SECS", "soon");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LAPAK_REQUEST_TIMEOUT_SECS"),
            "expected InvalidEnvVar(LAPAK_REQUEST_TIMEOUT_SECS), got: {result:?}"
        );
    }

    #[test]
    fn fails_with_inverted_radius_bounds() {
        let mut map = full_env();
        map.insert("LAPAK_MIN_RADIUS_M", "5000");
        map.insert("LAPAK_MAX_RADIUS_M", "100");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LAPAK_MAX_RADIUS_M"),
            "expected InvalidEnvVar(LAPAK_MAX_RADIUS_M), got: {result:?}"
        );
    }

    #[test]
    fn radius_bounds_can_be_overridden() {
        let mut map = full_env();
        map.insert("LAPAK_MIN_RADIUS_M", "250");
        map.insert("LAPAK_MAX_RADIUS_M", "20000");
        let cfg = build_app_config(lookup_from_map(&map)).expect("config should build");
        assert!((cfg.min_radius_m - 250.0).abs() < f64::EPSILON);
        assert!((cfg.max_radius_m - 20000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_environment_variants() {
        assert_eq!(parse_environment("production"), Environment::Production);
        assert_eq!(parse_environment("test"), Environment::Test);
        assert_eq!(parse_environment("development"), Environment::Development);
        assert_eq!(parse_environment("anything"), Environment::Development);
    }
}
