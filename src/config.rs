//! Service configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::solver::driver::{DEFAULT_RESTART_BUDGET, DEFAULT_ROOM_COUNT};
use crate::solver::SolverParameters;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    /// Defaults applied to requests that do not override them.
    pub solver: SolverParameters,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Environment Variables
    /// - `HOST` (default `127.0.0.1`)
    /// - `PORT` (default `8080`)
    /// - `TIMETABLE_CORS_ORIGIN` (default `http://localhost:3000`)
    /// - `TIMETABLE_RESTART_BUDGET` (default `100`)
    /// - `TIMETABLE_SEED` (unset: a fresh seed per run)
    /// - `TIMETABLE_PARALLEL` (default `false`)
    /// - `TIMETABLE_ROOM_COUNT` (default `8`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&lookup, "PORT", "a port number", 8080)?;
        let cors_origin =
            lookup("TIMETABLE_CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        let restart_budget = parse_or(
            &lookup,
            "TIMETABLE_RESTART_BUDGET",
            "a positive integer",
            DEFAULT_RESTART_BUDGET,
        )?;
        if restart_budget == 0 {
            return Err(ConfigError::Invalid {
                var: "TIMETABLE_RESTART_BUDGET",
                expected: "a positive integer",
                value: "0".to_string(),
            });
        }
        let seed = match lookup("TIMETABLE_SEED") {
            Some(value) => Some(parse(&value, "TIMETABLE_SEED", "an unsigned integer")?),
            None => None,
        };
        let parallel = parse_or(&lookup, "TIMETABLE_PARALLEL", "true or false", false)?;
        let room_count = parse_or(
            &lookup,
            "TIMETABLE_ROOM_COUNT",
            "a positive integer",
            DEFAULT_ROOM_COUNT,
        )?;

        Ok(Self {
            host,
            port,
            cors_origin,
            solver: SolverParameters {
                restart_budget,
                seed,
                parallel,
                room_count: room_count.max(1),
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, expected: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(value) => parse(&value, var, expected),
        None => Ok(default),
    }
}

fn parse<T: FromStr>(value: &str, var: &'static str, expected: &'static str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        expected,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config(&[]).unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.cors_origin, "http://localhost:3000");
        assert_eq!(config.solver, SolverParameters::default());
    }

    #[test]
    fn reads_solver_overrides() {
        let config = config(&[
            ("PORT", "9000"),
            ("TIMETABLE_RESTART_BUDGET", "250"),
            ("TIMETABLE_SEED", " 42 "),
            ("TIMETABLE_PARALLEL", "true"),
            ("TIMETABLE_ROOM_COUNT", "12"),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.solver.restart_budget, 250);
        assert_eq!(config.solver.seed, Some(42));
        assert!(config.solver.parallel);
        assert_eq!(config.solver.room_count, 12);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(config(&[("PORT", "eighty")]).is_err());
        assert!(config(&[("TIMETABLE_RESTART_BUDGET", "0")]).is_err());
        assert!(config(&[("TIMETABLE_PARALLEL", "yes")]).is_err());
    }
}
