//! TOML run configuration. Every field is optional; flags on the command
//! line take precedence over values loaded here.

use std::path::Path;

use anyhow::{Context, Result};
use diffusion_core::BackendKind;
use serde::Deserialize;

use crate::ic::IcType;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub intervals: Option<usize>,
    pub time_steps: Option<i64>,
    pub coefficient: Option<f64>,
    pub workers: Option<i64>,
    pub backend: Option<BackendKind>,
    pub boundary_low: Option<f64>,
    pub boundary_high: Option<f64>,
    pub ic: Option<IcType>,
    pub seed: Option<u64>,
}

pub fn load_config(path: &Path) -> Result<RunConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    parse_config(&text).with_context(|| format!("parsing config {}", path.display()))
}

pub fn parse_config(text: &str) -> Result<RunConfig> {
    Ok(toml::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_config() {
        let cfg = parse_config(
            r#"
            intervals = 1000
            time_steps = 25
            backend = "threads"
            ic = "gaussian"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.intervals, Some(1000));
        assert_eq!(cfg.time_steps, Some(25));
        assert_eq!(cfg.backend, Some(BackendKind::Threads));
        assert_eq!(cfg.ic, Some(IcType::Gaussian));
        assert_eq!(cfg.coefficient, None);
        assert_eq!(cfg.workers, None);
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let cfg = parse_config("").unwrap();
        assert!(cfg.intervals.is_none() && cfg.backend.is_none() && cfg.seed.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_config("interval = 10").is_err());
        assert!(parse_config("backend = \"opencl\"").is_err());
    }
}
