//! Configuration management for mudra
//!
//! Provides persistent settings storage with schema versioning and
//! migrations. Configuration is stored in `~/.mudra/config.json` and cached
//! in memory behind a process-wide lock.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Current config schema version
const CURRENT_VERSION: u32 = 1;

/// Shortest allowed recording window, in seconds.
pub const RECORDING_SECONDS_MIN: f32 = 1.0;

/// Longest allowed recording window, in seconds.
pub const RECORDING_SECONDS_MAX: f32 = 5.0;

/// Global config instance for caching
static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema version for migrations
    pub version: u32,
    /// Capture session settings
    pub capture: CaptureConfig,
    /// Classifier training settings
    pub classifier: ClassifierConfig,
    /// General application settings
    pub general: GeneralConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            capture: CaptureConfig::default(),
            classifier: ClassifierConfig::default(),
            general: GeneralConfig::default(),
        }
    }
}

/// Capture session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Length of the snapshot recording window in seconds.
    /// Valid range: 1.0 to 5.0 inclusive.
    pub recording_seconds: f32,
    /// Whether to play audio feedback cues
    pub play_sounds: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            recording_seconds: 3.0,
            play_sounds: true,
        }
    }
}

/// Classifier training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Where the trained model file is written (None for the default
    /// location next to the database)
    pub model_path: Option<PathBuf>,
    /// Minimum number of distinct gesture classes required before
    /// training is allowed
    pub min_classes: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            min_classes: 2,
        }
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override for the database file location (None for ~/.mudra/mudra.db)
    pub database_path: Option<PathBuf>,
    /// Placeholder text shown in the free-roam view when no gesture is
    /// recognised
    pub no_gesture_sign: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            no_gesture_sign: "No Gesture Detected".to_string(),
        }
    }
}

/// Get the path to the config file (~/.mudra/config.json)
pub fn get_config_path() -> PathBuf {
    home_dir_or_fallback().join(".mudra").join("config.json")
}

/// Get the path to the config directory (~/.mudra)
fn get_config_dir() -> PathBuf {
    home_dir_or_fallback().join(".mudra")
}

/// Get the home directory, falling back to /tmp if unavailable
fn home_dir_or_fallback() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        tracing::error!("Could not determine home directory, using /tmp");
        PathBuf::from("/tmp")
    })
}

/// Ensure the config directory exists
fn ensure_config_dir() -> Result<(), String> {
    let dir = get_config_dir();
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    Ok(())
}

/// Load configuration from disk
fn load_from_disk() -> Result<Config, String> {
    let path = get_config_path();

    if !path.exists() {
        tracing::info!("Config file not found, using defaults");
        return Ok(Config::default());
    }

    let contents =
        fs::read_to_string(&path).map_err(|e| format!("Failed to read config file: {}", e))?;

    let config: Config =
        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse config: {}", e))?;

    // Run migrations if needed
    let migrated = migrate_config(config)?;

    Ok(validated(migrated))
}

/// Save configuration to disk
fn save_to_disk(config: &Config) -> Result<(), String> {
    ensure_config_dir()?;

    let path = get_config_path();
    let contents = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialise config: {}", e))?;

    fs::write(&path, contents).map_err(|e| format!("Failed to write config file: {}", e))?;

    tracing::info!(
        "Config saved to disk: recording_seconds={}",
        config.capture.recording_seconds
    );
    Ok(())
}

/// Migrate configuration from older schema versions
fn migrate_config(mut config: Config) -> Result<Config, String> {
    let original_version = config.version;

    // Apply migrations sequentially
    while config.version < CURRENT_VERSION {
        config = apply_migration(config)?;
    }

    if config.version != original_version {
        tracing::info!(
            "Migrated config from version {} to {}",
            original_version,
            config.version
        );
        save_to_disk(&config)?;
    }

    Ok(config)
}

/// Apply a single migration step
fn apply_migration(config: Config) -> Result<Config, String> {
    match config.version {
        // Version 0 -> 1: Initial migration (add any new fields)
        0 => {
            let mut migrated = config;
            migrated.version = 1;
            Ok(migrated)
        }
        v => Err(format!("Unknown config version: {}", v)),
    }
}

/// Clamp out-of-range values loaded from disk back into bounds.
///
/// A hand-edited config file must not put the capture timer outside the
/// supported recording window.
fn validated(mut config: Config) -> Config {
    let seconds = config.capture.recording_seconds;
    if !seconds.is_finite()
        || !(RECORDING_SECONDS_MIN..=RECORDING_SECONDS_MAX).contains(&seconds)
    {
        let clamped = if seconds.is_finite() {
            seconds.clamp(RECORDING_SECONDS_MIN, RECORDING_SECONDS_MAX)
        } else {
            CaptureConfig::default().recording_seconds
        };
        tracing::warn!(
            "recording_seconds {} out of range [{}, {}], clamping to {}",
            seconds,
            RECORDING_SECONDS_MIN,
            RECORDING_SECONDS_MAX,
            clamped
        );
        config.capture.recording_seconds = clamped;
    }
    config
}

/// Get the global config instance
fn get_config_instance() -> &'static RwLock<Config> {
    CONFIG.get_or_init(|| {
        let config = load_from_disk().unwrap_or_else(|e| {
            tracing::error!("Failed to load config, using defaults: {}", e);
            Config::default()
        });
        tracing::info!(
            "Config loaded from disk: recording_seconds={}",
            config.capture.recording_seconds
        );
        RwLock::new(config)
    })
}

/// Get the current configuration
///
/// The config is cached in memory and loaded from disk on first access.
pub fn get_config() -> Result<Config, String> {
    let config = get_config_instance().read().clone();
    Ok(config)
}

/// Update the configuration
///
/// Replaces the current configuration with the provided config and persists
/// it to disk. The version field is automatically updated to the current
/// schema. Rejects an out-of-range recording window.
pub fn set_config(mut config: Config) -> Result<(), String> {
    config.version = CURRENT_VERSION;

    let seconds = config.capture.recording_seconds;
    if !seconds.is_finite()
        || !(RECORDING_SECONDS_MIN..=RECORDING_SECONDS_MAX).contains(&seconds)
    {
        return Err(format!(
            "recording_seconds must be between {} and {} (got {})",
            RECORDING_SECONDS_MIN, RECORDING_SECONDS_MAX, seconds
        ));
    }

    // Save to disk first
    save_to_disk(&config)?;

    // Update cached config
    let mut cached = get_config_instance().write();
    *cached = config;

    tracing::info!(
        "Configuration updated (recording_seconds: {})",
        cached.capture.recording_seconds
    );
    Ok(())
}

/// Reset configuration to defaults
///
/// Resets all settings to their default values and persists to disk.
pub fn reset_config() -> Result<Config, String> {
    let default_config = Config::default();

    save_to_disk(&default_config)?;

    let mut cached = get_config_instance().write();
    *cached = default_config.clone();

    tracing::info!("Configuration reset to defaults");
    Ok(default_config)
}
