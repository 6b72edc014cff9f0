use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use hark::channels::{remote_channel, spawn_poller};
use hark::commands::spawn_reloader;
use hark::config::{Config, Overrides};
use hark::{
    ChatTransport, CommandStore, CommandTable, Composer, ConsoleSpeech, LocalSkills, Runtime,
    SkillDispatcher, TelegramChannel, Voice,
};

/// Hark - Voice-driven command dispatcher for a desktop assistant
#[derive(Parser)]
#[command(name = "hark", version, about)]
struct Cli {
    /// Name the assistant answers to
    #[arg(short = 'n', long, env = "HARK_ASSISTANT_NAME")]
    assistant_name: Option<String>,

    /// How the assistant addresses its user
    #[arg(short, long, env = "HARK_MASTER_NAME")]
    master_name: Option<String>,

    /// Path to the command table JSON
    #[arg(short, long, env = "HARK_COMMANDS_PATH")]
    commands: Option<std::path::PathBuf>,

    /// Skip the startup connectivity check
    #[arg(long)]
    offline: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List command categories and their phrase counts
    Categories,
    /// Run a single utterance through the composer and exit
    Ask {
        /// Utterance text
        #[arg(required = true)]
        text: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,hark=info",
        1 => "info,hark=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = Overrides {
        assistant_name: cli.assistant_name,
        master_name: cli.master_name,
        commands_path: cli.commands,
        offline: cli.offline,
    };
    let config = Config::load(&overrides);
    tracing::debug!(?config, "loaded configuration");

    let assistant = config.assistant.name.clone();
    let master = config.assistant.master_name.clone();
    let table = CommandTable::load_or_embedded(&config.commands_path, &assistant, &master)?;

    let skills = SkillDispatcher::new(Arc::new(LocalSkills::new(config.skills.clone())?));
    let composer = Composer::new(&assistant, skills);
    let speech = Arc::new(ConsoleSpeech::new(config.session.listen_window));
    let mut voice = Voice::new(speech, assistant.clone(), config.speech_retry.clone());

    match cli.command {
        Some(Command::Categories) => {
            list_categories(&table);
            return Ok(());
        }
        Some(Command::Ask { text }) => {
            let directive = composer.compose(&table, &voice, &text.join(" ")).await;
            tracing::debug!(?directive, "composed");
            return Ok(());
        }
        None => {}
    }

    if config.connectivity.enabled {
        let client = reqwest::Client::new();
        tokio::select! {
            () = hark::connectivity::wait_for_connection(
                &client,
                &config.connectivity.url,
                config.connectivity.interval,
            ) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted while waiting for network");
                return Ok(());
            }
        }
    }

    let store = CommandStore::new(table);
    spawn_reloader(store.clone(), config.commands_path.clone(), assistant.clone(), master);

    // Initialize Telegram bridge if configured
    let mut remote = None;
    if let Some(tg) = &config.telegram {
        let channel = TelegramChannel::new(tg.token.clone());
        match channel.connect().await {
            Ok(()) => {
                let transport: Arc<dyn ChatTransport> = Arc::new(channel);
                let (tx, rx) = remote_channel();
                spawn_poller(
                    Arc::clone(&transport),
                    tx,
                    tg.poll_interval,
                    tg.allowed_chats.clone(),
                );
                voice = voice.with_transport(transport);
                remote = Some(rx);
            }
            Err(e) => tracing::error!(error = %e, "Telegram connect failed"),
        }
    }

    let mut runtime = Runtime::new(config.session.clone(), store, composer, voice, assistant.clone());
    if let Some(rx) = remote {
        runtime = runtime.with_remote(rx);
    }
    if config.session.announce_hourly {
        let (tx, rx) = mpsc::channel(4);
        hark::announce::spawn_announcer(tx);
        runtime = runtime.with_announcements(rx);
    }

    tracing::info!(assistant = %assistant, "hark ready - say \"hey {assistant}\"");

    tokio::select! {
        result = runtime.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("interrupted, shutting down"),
    }

    Ok(())
}

/// Print loaded categories with their phrase counts
#[allow(clippy::print_stdout)]
fn list_categories(table: &CommandTable) {
    for (name, count) in table.summary() {
        println!("{name:<28} {count}");
    }
}
