//! TOML configuration file loading
//!
//! Supports `~/.config/hark/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct HarkConfigFile {
    /// Names used in phrases and responses
    #[serde(default)]
    pub assistant: AssistantFileConfig,

    /// Session loop tuning
    #[serde(default)]
    pub session: SessionFileConfig,

    /// Command table source
    #[serde(default)]
    pub commands: CommandsFileConfig,

    /// Connectivity probe
    #[serde(default)]
    pub connectivity: ConnectivityFileConfig,

    /// Speech retry policy
    #[serde(default)]
    pub speech: SpeechFileConfig,

    /// Telegram bridge
    #[serde(default)]
    pub telegram: TelegramFileConfig,

    /// Built-in skill settings
    #[serde(default)]
    pub skills: SkillsFileConfig,
}

/// Assistant identity
#[derive(Debug, Default, Deserialize)]
pub struct AssistantFileConfig {
    /// Assistant's name (replaces `<assistant_name>` in phrases)
    pub name: Option<String>,

    /// User's name (replaces `<boss_name>` in phrases)
    pub master_name: Option<String>,
}

/// Session loop configuration
#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    /// Idle listen cycles before going back to sleep
    pub listen_timeout: Option<u32>,

    /// Bounded wait for a single listen, in seconds
    pub listen_window_secs: Option<u64>,

    /// Delay before restarting the loop after a fatal error
    pub restart_delay_secs: Option<u64>,

    /// Consecutive restarts before giving up
    pub max_restarts: Option<u32>,

    /// Announce the time at the top of every hour
    pub announce_hourly: Option<bool>,
}

/// Command table configuration
#[derive(Debug, Default, Deserialize)]
pub struct CommandsFileConfig {
    /// Path to the `commands_db.json` document
    pub path: Option<String>,
}

/// Connectivity probe configuration
#[derive(Debug, Default, Deserialize)]
pub struct ConnectivityFileConfig {
    pub enabled: Option<bool>,
    pub url: Option<String>,
    pub interval_secs: Option<u64>,
}

/// Speech retry configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    pub max_retries: Option<u32>,
    pub retry_delay_secs: Option<u64>,
}

/// Telegram bridge configuration
#[derive(Debug, Default, Deserialize)]
pub struct TelegramFileConfig {
    pub token: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub allowed_chats: Option<Vec<i64>>,
}

/// Built-in skills configuration
#[derive(Debug, Default, Deserialize)]
pub struct SkillsFileConfig {
    pub wolfram_app_id: Option<String>,
    pub projects_dir: Option<String>,
    pub search_roots: Option<Vec<String>>,
    pub search_depth: Option<usize>,
    pub allow_power_control: Option<bool>,
}

/// Load the TOML config file from the standard path
///
/// Returns `HarkConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> HarkConfigFile {
    let Some(path) = config_file_path() else {
        return HarkConfigFile::default();
    };

    load_config_file_from(&path)
}

/// Load the TOML config file from an explicit path
pub fn load_config_file_from(path: &std::path::Path) -> HarkConfigFile {
    if !path.exists() {
        return HarkConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                HarkConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            HarkConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/hark/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("hark").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_leaves_other_sections_default() {
        let fc: HarkConfigFile = toml::from_str(
            r#"
            [assistant]
            name = "Friday"

            [telegram]
            allowed_chats = [42, 7]
            "#,
        )
        .unwrap();

        assert_eq!(fc.assistant.name.as_deref(), Some("Friday"));
        assert!(fc.assistant.master_name.is_none());
        assert_eq!(fc.telegram.allowed_chats, Some(vec![42, 7]));
        assert!(fc.session.listen_timeout.is_none());
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let fc = load_config_file_from(&dir.path().join("nope.toml"));
        assert!(fc.commands.path.is_none());
    }

    #[test]
    fn malformed_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        let fc = load_config_file_from(&path);
        assert!(fc.assistant.name.is_none());
    }
}
