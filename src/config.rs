use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::AppError;
use crate::query::DEFAULT_DUE_SOON_DAYS;

/// Upper bound for `DUE_SOON_DAYS`.
pub const MAX_DUE_SOON_DAYS: i64 = 3650;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub storage_key: String,
    pub bind_addr: SocketAddr,
    pub due_soon_days: i64,
    /// `0` leaves the overdue sweeper off.
    pub overdue_sweep_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://debtbook.db".to_string(),
            storage_key: "debts".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            due_soon_days: DEFAULT_DUE_SOON_DAYS,
            overdue_sweep_secs: 0,
        }
    }
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; unset names take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let due_soon_days = parse_var(&lookup, "DUE_SOON_DAYS", defaults.due_soon_days)?;
        if !(0..=MAX_DUE_SOON_DAYS).contains(&due_soon_days) {
            return Err(AppError::Config(format!(
                "DUE_SOON_DAYS must be between 0 and {}, got {}",
                MAX_DUE_SOON_DAYS, due_soon_days
            )));
        }

        let overdue_sweep_secs =
            parse_var(&lookup, "OVERDUE_SWEEP_SECS", defaults.overdue_sweep_secs)?;

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            storage_key: lookup("STORAGE_KEY").unwrap_or(defaults.storage_key),
            bind_addr: parse_var(&lookup, "BIND_ADDR", defaults.bind_addr)?,
            due_soon_days,
            overdue_sweep_secs,
        })
    }
}

fn parse_var<T, F>(lookup: &F, name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value '{}'", name, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.storage_key, "debts");
        assert_eq!(config.due_soon_days, 3);
        assert_eq!(config.overdue_sweep_secs, 0);
        assert_eq!(config.bind_addr.port(), 3000);
    }

    #[test]
    fn set_values_override_defaults() {
        let config = config_from(&[
            ("STORAGE_KEY", "gastos"),
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("DUE_SOON_DAYS", " 7 "),
            ("OVERDUE_SWEEP_SECS", "60"),
        ])
        .unwrap();
        assert_eq!(config.storage_key, "gastos");
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.due_soon_days, 7);
        assert_eq!(config.overdue_sweep_secs, 60);
    }

    #[test]
    fn unparseable_values_are_config_errors() {
        for (name, raw) in [
            ("DUE_SOON_DAYS", "soon"),
            ("OVERDUE_SWEEP_SECS", "-1"),
            ("BIND_ADDR", "localhost"),
        ] {
            let err = config_from(&[(name, raw)]).unwrap_err();
            assert!(matches!(err, AppError::Config(_)), "{}={}", name, raw);
        }
    }

    #[test]
    fn due_soon_days_out_of_range_is_rejected() {
        for raw in ["-1", "3651", "10000000000000"] {
            let err = config_from(&[("DUE_SOON_DAYS", raw)]).unwrap_err();
            assert!(matches!(err, AppError::Config(_)), "DUE_SOON_DAYS={}", raw);
        }
        assert_eq!(config_from(&[("DUE_SOON_DAYS", "0")]).unwrap().due_soon_days, 0);
        assert_eq!(config_from(&[("DUE_SOON_DAYS", "3650")]).unwrap().due_soon_days, 3650);
    }
}
