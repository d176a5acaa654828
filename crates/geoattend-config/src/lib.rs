//! Configuration parsing and validation for geoattendd
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Zone definitions (circles and polygons)
//! - Teams with members and work hours
//! - Validation with clear error messages

mod model;
mod schema;
mod validation;

pub use model::*;
pub use schema::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "Loading configuration");
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Config::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;
    use geoattend_api::ZoneKind;
    use geoattend_util::TeamId;
    use std::io::Write;

    const SAMPLE: &str = r#"
        config_version = 1

        [service]
        absence_sweep_seconds = 60
        late_threshold = "09:15"

        [[zones]]
        id = "hq"
        name = "Headquarters"
        shape = { type = "circle", center = { lat = 12.9716, lng = 77.5946 }, radius_meters = 150 }

        [[zones]]
        id = "yard"
        name = "Yard"
        shape = { type = "polygon", vertices = [
            { lat = 0.0, lng = 0.0 },
            { lat = 0.0, lng = 1.0 },
            { lat = 1.0, lng = 1.0 },
            { lat = 1.0, lng = 0.0 },
        ] }

        [[teams]]
        id = "ops"
        name = "Operations"
        manager_id = "m1"
        employees = ["e1", "e2"]
        zone_id = "hq"

        [teams.work_hours]
        start = "09:00"
        end = "18:00"
        check_in_deadline = "09:30"
    "#;

    #[test]
    fn parse_minimal_config() {
        let config = parse_config("config_version = 1").unwrap();
        assert!(config.zones.is_empty());
        assert!(config.teams.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.zones.len(), 2);
        assert_eq!(config.zones[0].kind(), ZoneKind::Circle);
        assert_eq!(config.zones[1].kind(), ZoneKind::Polygon);
        assert!(config.zones.iter().all(|z| z.active));

        let team = config.get_team(&TeamId::new("ops")).unwrap();
        assert_eq!(team.employee_ids.len(), 2);
        assert_eq!(team.work_hours.check_in_buffer_minutes, 15);

        assert_eq!(config.service.absence_sweep_interval.as_secs(), 60);
        assert_eq!(config.service.auto_checkout_sweep_interval.as_secs(), 300);
        assert!(config.service.late_threshold.is_some());
    }

    #[test]
    fn service_defaults() {
        let config = parse_config(
            r#"
            config_version = 1

            [service]
            data_dir = "/var/lib/geoattend"
        "#,
        )
        .unwrap();

        assert_eq!(config.service.data_dir, std::path::PathBuf::from("/var/lib/geoattend"));
        assert_eq!(config.service.absence_sweep_interval.as_secs(), DEFAULT_SWEEP_SECONDS);
        assert_eq!(config.service.late_sweep_interval.as_secs(), DEFAULT_SWEEP_SECONDS);
        assert!(config.service.late_threshold.is_none());
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_config() {
        let config = r#"
            config_version = 1

            [[zones]]
            id = "hq"
            name = "HQ"
            shape = { type = "circle", center = { lat = 0.0, lng = 0.0 }, radius_meters = -5 }
        "#;

        match parse_config(config) {
            Err(ConfigError::ValidationFailed { errors }) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.teams.len(), 1);

        let missing = load_config(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ConfigError::ReadError(_))));
    }
}
