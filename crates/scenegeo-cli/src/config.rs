//! Configuration Vault – reads/writes `~/.scenegeo/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use scenegeo_engine::{EngineConfig, EstimateMethod};
use scenegeo_runtime::{DEFAULT_TICK_HZ, SessionConfig};
use scenegeo_types::SceneError;
use serde::{Deserialize, Serialize};

/// Where the simulated walk starts and what it places around the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub start_latitude: f64,
    pub start_longitude: f64,
    /// Number of annotation nodes placed in a ring around the start.
    pub ring_size: usize,
    /// Ring radius in metres.
    pub ring_radius_m: f64,
    /// Walking speed northwards, metres per second.
    pub walk_speed_mps: f64,
    pub duration_secs: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            start_latitude: 50.0647,
            start_longitude: 19.9450,
            ring_size: 6,
            ring_radius_m: 400.0,
            walk_speed_mps: 12.0,
            duration_secs: 20,
        }
    }
}

/// Persisted user configuration stored in `~/.scenegeo/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Positioning passes per second.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f64,

    /// Seconds without a location fix before the feed is reported stale.
    #[serde(default = "default_location_timeout_secs")]
    pub location_timeout_secs: u64,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub demo: DemoConfig,
}

fn default_tick_hz() -> f64 {
    DEFAULT_TICK_HZ
}
fn default_location_timeout_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
            location_timeout_secs: default_location_timeout_secs(),
            engine: EngineConfig::default(),
            demo: DemoConfig::default(),
        }
    }
}

impl Config {
    /// Check the tick rate and the engine section.
    ///
    /// # Errors
    ///
    /// [`SceneError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), SceneError> {
        if !(self.tick_hz.is_finite() && self.tick_hz > 0.0) {
            return Err(SceneError::Config(format!(
                "tick_hz must be a positive number, got {}",
                self.tick_hz
            )));
        }
        self.engine.validate()
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            engine: self.engine.clone(),
            tick_hz: self.tick_hz,
            location_timeout: Duration::from_secs(self.location_timeout_secs),
            ..SessionConfig::default()
        }
    }
}

/// Return the path to `~/.scenegeo/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".scenegeo").join("config.toml")
}

/// Load the config from disk and apply environment overrides. Returns
/// `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, SceneError> {
    let Some(mut cfg) = load_from(&config_path())? else {
        return Ok(None);
    };
    apply_env_overrides(&mut cfg);
    cfg.validate()?;
    Ok(Some(cfg))
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, SceneError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        SceneError::Config(format!("Failed to read config at {}: {e}", path.display()))
    })?;
    let cfg: Config = toml::from_str(&raw)
        .map_err(|e| SceneError::Config(format!("Failed to parse config: {e}")))?;
    cfg.validate()?;
    Ok(Some(cfg))
}

/// Apply `SCENEGEO_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `SCENEGEO_TICK_HZ` | `tick_hz` |
/// | `SCENEGEO_SCENE_LIMIT` | `engine.scene_limit` |
/// | `SCENEGEO_ESTIMATE_METHOD` | `engine.estimate_method` (`fused` / `sensor_only`) |
///
/// Unparseable values are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("SCENEGEO_TICK_HZ")
        && let Ok(hz) = v.trim().parse::<f64>()
        && hz.is_finite()
        && hz > 0.0
    {
        cfg.tick_hz = hz;
    }
    if let Ok(v) = std::env::var("SCENEGEO_SCENE_LIMIT")
        && let Ok(limit) = v.trim().parse::<f64>()
    {
        cfg.engine.scene_limit = limit;
    }
    if let Ok(v) = std::env::var("SCENEGEO_ESTIMATE_METHOD")
        && let Some(method) = parse_estimate_method(&v)
    {
        cfg.engine.estimate_method = method;
    }
}

fn parse_estimate_method(value: &str) -> Option<EstimateMethod> {
    match value.trim().to_ascii_lowercase().as_str() {
        "fused" => Some(EstimateMethod::Fused),
        "sensor_only" | "sensor-only" => Some(EstimateMethod::SensorOnly),
        _ => None,
    }
}

/// Save the config to disk, creating `~/.scenegeo/` if necessary.
pub fn save(cfg: &Config) -> Result<(), SceneError> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), SceneError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            SceneError::Config(format!("Failed to create config directory: {e}"))
        })?;
        // Owner only (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(|e| {
                SceneError::Config(format!("Failed to set config directory permissions: {e}"))
            })?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| SceneError::Config(format!("Failed to serialize config: {e}")))?;
    let write_err =
        |e: std::io::Error| SceneError::Config(format!("Failed to write config at {}: {e}", path.display()));
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(write_err)?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_points_to_scenegeo_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".scenegeo"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");
        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.engine, EngineConfig::default());
        assert_eq!(loaded.demo, DemoConfig::default());
        assert_eq!(loaded.location_timeout_secs, 5);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[engine]\nestimate_capacity = 12\n").expect("write");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.engine.estimate_capacity, 12);
        assert_eq!(loaded.engine.scene_limit, 100.0);
        assert_eq!(loaded.demo.ring_size, 6);
    }

    #[test]
    fn invalid_engine_section_is_an_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[engine]\nestimate_capacity = 0\n").expect("write");
        assert!(matches!(load_from(&path), Err(SceneError::Config(_))));
    }

    #[test]
    fn non_positive_tick_rate_is_an_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        for raw in ["tick_hz = 0.0\n", "tick_hz = -5.0\n", "tick_hz = nan\n"] {
            fs::write(&path, raw).expect("write");
            assert!(
                matches!(load_from(&path), Err(SceneError::Config(_))),
                "accepted {raw:?}"
            );
        }
    }

    #[test]
    fn garbage_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "tick_hz = [").expect("write");
        assert!(load_from(&path).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        save_to(&Config::default(), &path).expect("save");

        let file_mode = fs::metadata(&path).expect("file metadata").permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        let dir_mode = fs::metadata(path.parent().unwrap())
            .expect("dir metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn session_config_carries_tick_rate_and_engine() {
        let mut cfg = Config::default();
        cfg.tick_hz = 25.0;
        cfg.engine.scene_limit = 60.0;
        let session = cfg.session_config();
        assert_eq!(session.tick_hz, 25.0);
        assert_eq!(session.engine.scene_limit, 60.0);
        assert_eq!(session.location_timeout, Duration::from_secs(5));
    }

    #[test]
    fn estimate_method_parsing() {
        assert_eq!(parse_estimate_method("fused"), Some(EstimateMethod::Fused));
        assert_eq!(parse_estimate_method(" Sensor-Only "), Some(EstimateMethod::SensorOnly));
        assert_eq!(parse_estimate_method("gps"), None);
    }

    // All env-var cases live in one test: the variables are process-global.
    #[test]
    fn apply_env_overrides_reads_scenegeo_vars() {
        // SAFETY: the only test touching these variables.
        unsafe {
            std::env::set_var("SCENEGEO_TICK_HZ", "30");
            std::env::set_var("SCENEGEO_SCENE_LIMIT", "150");
            std::env::set_var("SCENEGEO_ESTIMATE_METHOD", "sensor_only");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.tick_hz, 30.0);
        assert_eq!(cfg.engine.scene_limit, 150.0);
        assert_eq!(cfg.engine.estimate_method, EstimateMethod::SensorOnly);

        unsafe { std::env::set_var("SCENEGEO_TICK_HZ", "-4") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.tick_hz, DEFAULT_TICK_HZ);

        unsafe {
            std::env::remove_var("SCENEGEO_TICK_HZ");
            std::env::remove_var("SCENEGEO_SCENE_LIMIT");
            std::env::remove_var("SCENEGEO_ESTIMATE_METHOD");
        }
    }
}
