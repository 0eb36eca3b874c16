use canmort_core::EngineConfig;
use tracing::debug;

use crate::input::file;

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV: &str = "CANMORT_CONFIG";

/// Engine config from `--config`, else `$CANMORT_CONFIG`, else defaults.
/// Partial files only override the keys they name.
pub fn load_config(path: Option<&str>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let from_env = std::env::var(CONFIG_ENV).ok().filter(|p| !p.trim().is_empty());
    let source = path.map(str::to_string).or(from_env);

    let config = match source {
        Some(ref p) => {
            debug!(path = %p, "loading engine config");
            file::read_document::<EngineConfig>(p)?
        }
        None => EngineConfig::default(),
    };
    config
        .validate()
        .map_err(|e| format!("invalid config: {e}"))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::file::{parse_document, DocumentFormat};

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg: EngineConfig = parse_document(
            "max_skips_per_year: 1\nmonte_carlo:\n  iterations: 2000\n",
            DocumentFormat::Yaml,
        )
        .unwrap();
        assert_eq!(cfg.max_skips_per_year, 1);
        assert_eq!(cfg.monte_carlo.iterations, 2000);
        assert_eq!(cfg.monte_carlo.horizon_months, 60);
        assert_eq!(cfg.max_payments, 600);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let cfg: EngineConfig =
            parse_document(r#"{"monte_carlo": {"iterations": 10}}"#, DocumentFormat::Json).unwrap();
        assert!(cfg.validate().is_err());
    }
}
