//! Configuration management for hark
//!
//! Values resolve env > `config.toml` > built-in default.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// hark configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Assistant identity
    pub assistant: AssistantConfig,

    /// Session loop tuning
    pub session: SessionConfig,

    /// Path to the command table document
    pub commands_path: PathBuf,

    /// Connectivity probe
    pub connectivity: ConnectivityConfig,

    /// Retry policy for speech synthesis outages
    pub speech_retry: RetryPolicy,

    /// Telegram bridge (absent when no token is configured)
    pub telegram: Option<TelegramConfig>,

    /// Built-in skills
    pub skills: SkillsConfig,
}

/// Names substituted into phrases and used to strip the wake name
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Assistant's name
    pub name: String,

    /// User's name
    pub master_name: String,
}

/// Session loop configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Idle listen cycles before the session goes back to sleep
    pub listen_timeout: u32,

    /// Bounded wait for one listen call
    pub listen_window: Duration,

    /// Delay before the supervisor restarts the loop
    pub restart_delay: Duration,

    /// Consecutive failures tolerated by the supervisor
    pub max_restarts: u32,

    /// Speak the time at the top of every hour
    pub announce_hourly: bool,
}

/// Connectivity probe configuration
#[derive(Debug, Clone)]
pub struct ConnectivityConfig {
    /// Block startup until the probe succeeds
    pub enabled: bool,

    /// Well-known endpoint to probe
    pub url: String,

    /// Delay between probes
    pub interval: Duration,
}

/// Telegram bridge configuration
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token
    pub token: String,

    /// Delay between `getUpdates` calls
    pub poll_interval: Duration,

    /// Chats allowed to send commands; empty allows any chat
    pub allowed_chats: Vec<i64>,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[redacted]")
            .field("poll_interval", &self.poll_interval)
            .field("allowed_chats", &self.allowed_chats)
            .finish()
    }
}

/// Built-in skill configuration
#[derive(Debug, Clone)]
pub struct SkillsConfig {
    /// Wolfram|Alpha short-answer app id
    pub wolfram_app_id: Option<String>,

    /// Where scaffolded projects are created
    pub projects_dir: PathBuf,

    /// Roots scanned by file search
    pub search_roots: Vec<PathBuf>,

    /// Maximum directory depth for file search
    pub search_depth: usize,

    /// Allow shutdown/restart commands to act on the machine
    pub allow_power_control: bool,
}

impl Default for Config {
    fn default() -> Self {
        let home = home_dir();
        Self {
            assistant: AssistantConfig {
                name: "Jarvis".to_string(),
                master_name: "Boss".to_string(),
            },
            session: SessionConfig {
                listen_timeout: 3,
                listen_window: Duration::from_secs(5),
                restart_delay: Duration::from_secs(5),
                max_restarts: 10,
                announce_hourly: true,
            },
            commands_path: default_commands_path(),
            connectivity: ConnectivityConfig {
                enabled: true,
                url: "http://google.com".to_string(),
                interval: Duration::from_secs(1),
            },
            speech_retry: RetryPolicy {
                max_retries: 5,
                base_delay: Duration::from_secs(2),
                max_delay: Duration::from_secs(30),
            },
            telegram: None,
            skills: SkillsConfig {
                wolfram_app_id: None,
                projects_dir: home.join("Projects"),
                search_roots: vec![home],
                search_depth: 4,
                allow_power_control: false,
            },
        }
    }
}

/// CLI-level overrides applied after env and file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub assistant_name: Option<String>,
    pub master_name: Option<String>,
    pub commands_path: Option<PathBuf>,
    pub offline: bool,
}

impl Config {
    /// Load configuration from env and the standard config file
    #[must_use]
    pub fn load(overrides: &Overrides) -> Self {
        let fc = file::load_config_file();
        Self::from_file(fc, overrides)
    }

    /// Build configuration from an already-parsed config file
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn from_file(fc: file::HarkConfigFile, overrides: &Overrides) -> Self {
        let default = Self::default();

        let assistant = AssistantConfig {
            name: overrides
                .assistant_name
                .clone()
                .or_else(|| std::env::var("HARK_ASSISTANT_NAME").ok())
                .or(fc.assistant.name)
                .unwrap_or(default.assistant.name),
            master_name: overrides
                .master_name
                .clone()
                .or_else(|| std::env::var("HARK_MASTER_NAME").ok())
                .or(fc.assistant.master_name)
                .unwrap_or(default.assistant.master_name),
        };

        let session = SessionConfig {
            listen_timeout: std::env::var("HARK_LISTEN_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.session.listen_timeout)
                .unwrap_or(default.session.listen_timeout),
            listen_window: fc
                .session
                .listen_window_secs
                .map_or(default.session.listen_window, Duration::from_secs),
            restart_delay: fc
                .session
                .restart_delay_secs
                .map_or(default.session.restart_delay, Duration::from_secs),
            max_restarts: fc
                .session
                .max_restarts
                .unwrap_or(default.session.max_restarts),
            announce_hourly: fc
                .session
                .announce_hourly
                .unwrap_or(default.session.announce_hourly),
        };

        let commands_path = overrides
            .commands_path
            .clone()
            .or_else(|| std::env::var("HARK_COMMANDS_PATH").ok().map(PathBuf::from))
            .or_else(|| fc.commands.path.map(PathBuf::from))
            .unwrap_or(default.commands_path);

        let connectivity = ConnectivityConfig {
            enabled: !overrides.offline
                && fc
                    .connectivity
                    .enabled
                    .unwrap_or(default.connectivity.enabled),
            url: fc.connectivity.url.unwrap_or(default.connectivity.url),
            interval: fc
                .connectivity
                .interval_secs
                .map_or(default.connectivity.interval, Duration::from_secs),
        };

        let speech_retry = RetryPolicy {
            max_retries: fc
                .speech
                .max_retries
                .unwrap_or(default.speech_retry.max_retries),
            base_delay: fc
                .speech
                .retry_delay_secs
                .map_or(default.speech_retry.base_delay, Duration::from_secs),
            max_delay: default.speech_retry.max_delay,
        };

        let telegram = std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .or(fc.telegram.token)
            .filter(|t| !t.trim().is_empty())
            .map(|token| TelegramConfig {
                token,
                poll_interval: Duration::from_millis(
                    fc.telegram.poll_interval_ms.unwrap_or(1000),
                ),
                allowed_chats: fc.telegram.allowed_chats.unwrap_or_default(),
            });

        let skills = SkillsConfig {
            wolfram_app_id: std::env::var("WOLFRAM_APP_ID")
                .ok()
                .or(fc.skills.wolfram_app_id),
            projects_dir: fc
                .skills
                .projects_dir
                .map_or(default.skills.projects_dir, PathBuf::from),
            search_roots: fc
                .skills
                .search_roots
                .map(|roots| roots.into_iter().map(PathBuf::from).collect())
                .unwrap_or(default.skills.search_roots),
            search_depth: fc
                .skills
                .search_depth
                .unwrap_or(default.skills.search_depth),
            allow_power_control: fc
                .skills
                .allow_power_control
                .unwrap_or(default.skills.allow_power_control),
        };

        if overrides.offline {
            tracing::info!("connectivity probe disabled via --offline");
        }

        Self {
            assistant,
            session,
            commands_path,
            connectivity,
            speech_retry,
            telegram,
            skills,
        }
    }
}

/// Default command table path: `~/.config/hark/commands_db.json`
fn default_commands_path() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from("commands_db.json"),
        |d| d.config_dir().join("hark").join("commands_db.json"),
    )
}

fn home_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(|| PathBuf::from("."), |d| d.home_dir().to_path_buf())
}
