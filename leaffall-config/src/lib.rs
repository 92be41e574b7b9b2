use std::fs;
use std::path::Path;
use thiserror::Error;

pub use self::types::*;
mod types;

// --- Error Type ---
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation(message.into())
}

// --- Loading Function ---

/// Load and validate a configuration file.
///
/// The format follows the extension: `.toml` is TOML, `.json` (or no
/// extension) is JSON.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: Config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content)?,
        Some("json") | None => serde_json::from_str(&content)?,
        Some(other) => return Err(ConfigError::UnsupportedFormat(other.to_string())),
    };
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.framerate == 0 {
        return Err(invalid("Framerate cannot be zero."));
    }
    if !config.viewport.is_valid() {
        return Err(invalid("Viewport dimensions must be positive."));
    }
    if config.transport.frame_interval == 0 {
        return Err(invalid("Transport frame interval must be at least 1."));
    }
    config.simulation.validate()
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let population = &self.population;
        if !(population.reference_area() > 0.0) {
            return Err(invalid("Reference resolution must be positive."));
        }
        if population.min_count > population.max_count {
            return Err(invalid("Population min_count cannot exceed max_count."));
        }
        if !(population.size_min > 0.0 && population.size_min <= population.size_max) {
            return Err(invalid("Leaf size range must satisfy 0 < size_min <= size_max."));
        }

        let field = &self.field;
        if !(field.impulse_radius > 0.0) {
            return Err(invalid("Impulse radius must be positive."));
        }
        if !(field.max_speed > 0.0) {
            return Err(invalid("Max speed must be positive."));
        }
        if !(field.speed_normalizer > 0.0) {
            return Err(invalid("Speed normalizer must be positive."));
        }
        if field.respawn_margin < 0.0 {
            return Err(invalid("Respawn margin cannot be negative."));
        }

        let clock = &self.clock;
        if !(clock.max_dt > 0.0 && clock.fallback_dt > 0.0) {
            return Err(invalid("Clock max_dt and fallback_dt must be positive."));
        }
        // Drag multipliers (1 - drag * dt) must stay positive for every step.
        let longest_step = clock.max_dt.max(clock.fallback_dt);
        for (name, drag) in [("drag_lin", field.drag_lin), ("ang_drag", field.ang_drag)] {
            if !(drag >= 0.0 && drag * longest_step < 1.0) {
                return Err(invalid(format!("{} must lie in [0, 1/max_dt).", name)));
            }
        }

        let spawn = &self.spawn;
        if spawn.fall_speed_min > spawn.fall_speed_max || spawn.wobble_rate_min > spawn.wobble_rate_max {
            return Err(invalid("Spawn ranges must have min <= max."));
        }
        if spawn.drift_speed < 0.0 || spawn.spin < 0.0 {
            return Err(invalid("Spawn drift_speed and spin cannot be negative."));
        }

        let pointer = &self.pointer;
        if !(pointer.min_interval > 0.0) {
            return Err(invalid("Pointer min_interval must be positive."));
        }
        if !(pointer.decay >= 0.0 && pointer.decay < 1.0) {
            return Err(invalid("Pointer decay must lie in [0, 1)."));
        }

        if self.palette.is_empty() {
            return Err(invalid("Palette cannot be empty."));
        }
        if let Some(bad) = self.palette.iter().find(|c| Rgb::from_hex(c).is_none()) {
            return Err(invalid(format!("Palette colour '{}' is not #rrggbb.", bad)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn load_valid_json_config() {
        let file = write_config(
            ".json",
            r#"{
              "framerate": 30,
              "viewport": { "width": 1920.0, "height": 1080.0 },
              "simulation": { "population": { "base_count": 120 }, "field": { "gravity": 30.0 } },
              "transport": { "serializer": "binary", "sender": "websocket", "frame_interval": 2 }
            }"#,
        );
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.framerate, 30);
        assert_eq!(config.viewport.width, 1920.0);
        assert_eq!(config.simulation.population.base_count, 120);
        // untouched fields keep their defaults
        assert_eq!(config.simulation.population.min_count, 12);
        assert_eq!(config.simulation.field.gravity, 30.0);
        assert_eq!(config.simulation.field.max_speed, 360.0);
        assert_eq!(config.transport.serializer, SerializerType::Binary);
        assert_eq!(config.transport.sender, SenderType::WebSocket);
        assert_eq!(config.transport.websocket.port, 8080);
    }

    #[test]
    fn load_valid_toml_config() {
        let file = write_config(
            ".toml",
            r#"
            framerate = 50
            reduced_motion = true

            [simulation.pointer]
            idle_timeout = 0.25

            [transport]
            sender = "stdio"
            "#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.framerate, 50);
        assert!(config.reduced_motion);
        assert_eq!(config.simulation.pointer.idle_timeout, 0.25);
        assert_eq!(config.transport.sender, SenderType::Stdio);
    }

    #[test]
    fn empty_file_is_default() {
        let file = write_config(".json", "{}");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.simulation, SimulationConfig::default());
        assert_eq!(config.viewport, leaffall_core::Viewport::new(1280.0, 720.0));
    }

    #[test]
    fn sample_config_is_valid() {
        let config: Config = toml::from_str(include_str!("../../leaffall.toml")).unwrap();
        validate(&config).unwrap();
        assert_eq!(config.transport.sender, SenderType::WebSocket);
        assert_eq!(config.simulation, SimulationConfig::default());
    }

    #[test]
    fn load_invalid_framerate() {
        let file = write_config(".json", r#"{ "framerate": 0 }"#);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn unsupported_extension() {
        let file = write_config(".yaml", "framerate: 60");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ext)) if ext == "yaml"));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let file = write_config(".json", "{ framerate: ");
        assert!(matches!(load_config(file.path()), Err(ConfigError::Json(_))));
    }

    #[test]
    fn rejects_bad_palette() {
        let mut config = Config::default();
        config.simulation.palette = vec!["#c0392b".into(), "orange".into()];
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("orange"));

        config.simulation.palette.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_inverted_size_range() {
        let mut config = Config::default();
        config.simulation.population.size_min = 20.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_inverted_count_bounds() {
        let mut config = Config::default();
        config.simulation.population.max_count = 4;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_overflowing_viewport() {
        let file = write_config(".json", r#"{ "viewport": { "width": 1e20, "height": 1e20 } }"#);
        assert!(matches!(load_config(file.path()), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn rejects_excessive_drag() {
        let mut config = Config::default();
        config.simulation.field.drag_lin = 40.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn default_config_is_valid() {
        validate(&Config::default()).unwrap();
        assert!(default_palette().iter().all(|c| Rgb::from_hex(c).is_some()));
    }

    #[test]
    fn reduced_motion_scales_selected_parameters() {
        let base = SimulationConfig::default();
        let reduced = base.reduced_motion();

        assert_eq!(reduced.population.base_count, 28);
        assert_eq!(reduced.field.gravity, 11.0);
        assert!((reduced.field.wind_osc_amp - 10.0).abs() < 1e-5);
        assert!((reduced.field.max_speed - 216.0).abs() < 1e-3);
        // everything else is untouched
        assert_eq!(reduced.population.min_count, base.population.min_count);
        assert_eq!(reduced.field.wind_base, base.field.wind_base);
        assert_eq!(reduced.field.impulse_radius, base.field.impulse_radius);
        assert_eq!(reduced.pointer, base.pointer);

        let config = Config { reduced_motion: true, ..Config::default() };
        assert_eq!(config.effective_simulation(), reduced);
    }

    #[test]
    fn parses_hex_colours() {
        assert_eq!(Rgb::from_hex("#c0392b"), Some(Rgb { r: 0xc0, g: 0x39, b: 0x2b }));
        assert_eq!(Rgb::from_hex("aa7f39"), Some(Rgb { r: 0xaa, g: 0x7f, b: 0x39 }));
        assert_eq!(Rgb::from_hex("#fff"), None);
        assert_eq!(Rgb::from_hex("#gg0000"), None);
    }
}
