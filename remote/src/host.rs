use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use tower_common::{minutes_label, ClientConfig, ClockTime, Mode};
use tower_remote::{
    client::ControllerApi,
    panel::ControlPanel,
    store::{BaseUrlStore, FileKeyValueStore, StorageBackend},
};

#[derive(Parser)]
#[command(name = "tower-remote")]
#[command(about = "Remote control for the LED tower controller")]
struct Args {
    /// Directory holding the saved controller URL
    #[arg(long, env = "TOWER_DATA_DIR", default_value = "./.tower-remote")]
    data_dir: PathBuf,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "TOWER_TIMEOUT_MS", default_value_t = 8_000)]
    timeout_ms: u64,

    /// Print the panel as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the controller base URL, or save a new one (empty clears it)
    Url { value: Option<String> },
    /// Pull mode, glow window and blink duration from the controller
    Refresh,
    /// Switch between schedule-driven and manual operation
    Mode { mode: ModeArg },
    /// Set the daily glow window (24h, HH:MM)
    Schedule {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
    /// Set the blink length in minutes (1-5)
    Duration { minutes: u32 },
    /// Light the tower for the configured duration
    Blink {
        /// Stay running until the countdown ends
        #[arg(long)]
        wait: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Auto,
    Manual,
}

impl From<ModeArg> for Mode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Auto => Mode::Auto,
            ModeArg::Manual => Mode::Manual,
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = ClientConfig {
        request_timeout_ms: args.timeout_ms,
        ..ClientConfig::default()
    };
    config.sanitize();

    let backend = StorageBackend::File(FileKeyValueStore::new(&args.data_dir));
    let store = BaseUrlStore::new(backend, &config);
    let endpoint = store.load().await;
    info!(base_url = endpoint.as_str(), "remote starting");

    let panel = ControlPanel::connect(store, config)?;

    // Failures below end up on the status board; only the runtime itself is fatal.
    match args.command {
        Command::Url { value: None } => {}
        Command::Url { value: Some(value) } => {
            panel.save_base_url(&value).await;
        }
        Command::Refresh => {
            let _ = panel.start().await;
        }
        Command::Mode { mode } => {
            let _ = panel.settings.set_mode(mode.into()).await;
        }
        Command::Schedule { from, to } => {
            if from.is_none() && to.is_none() {
                anyhow::bail!("schedule needs --from and/or --to");
            }
            let _ = panel.start().await;

            // Moving the whole window later needs the stop hour to go first.
            let current = panel.settings.shadow().await.window;
            let stop_first = match (&from, &to) {
                (Some(from), Some(_)) => from
                    .parse::<ClockTime>()
                    .is_ok_and(|from| from.hour() >= current.stop.hour()),
                _ => false,
            };

            if stop_first {
                if let Some(to) = &to {
                    let _ = panel.settings.set_stop(to).await;
                }
            }
            if let Some(from) = &from {
                let _ = panel.settings.set_start(from).await;
            }
            if !stop_first {
                if let Some(to) = &to {
                    let _ = panel.settings.set_stop(to).await;
                }
            }
        }
        Command::Duration { minutes } => {
            let _ = panel.settings.set_duration(minutes).await;
        }
        Command::Blink { wait } => {
            if panel.blink.trigger().await.is_ok() && wait {
                print_panel(&panel, args.json).await?;
                panel.blink.wait_until_idle().await;
            }
        }
    }

    print_panel(&panel, args.json).await
}

async fn print_panel<C: ControllerApi>(
    panel: &ControlPanel<C>,
    json: bool,
) -> anyhow::Result<()> {
    let snapshot = panel.snapshot().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let base_url = if snapshot.base_url.is_empty() {
        "(not configured)"
    } else {
        snapshot.base_url.as_str()
    };

    println!("controller: {base_url}");
    println!("mode:       {}", snapshot.settings.mode.as_str());
    println!(
        "schedule:   {} - {}",
        snapshot.settings.window.start, snapshot.settings.window.stop
    );
    println!(
        "duration:   {}",
        minutes_label(snapshot.settings.duration_minutes)
    );
    if snapshot.blink_remaining_secs > 0 {
        println!("blink:      lit, {}s left", snapshot.blink_remaining_secs);
    }
    if let Some(status) = &snapshot.view.status {
        println!("status:     {status}");
    }
    if let Some(error) = &snapshot.view.error {
        println!("error:      {error}");
    }
    if let Some(schedule_error) = &snapshot.view.schedule_error {
        println!("warning:    {schedule_error}");
    }
    Ok(())
}
