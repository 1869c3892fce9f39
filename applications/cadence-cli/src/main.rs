/// Cadence - headless playlist player
use cadence_cli::{parse_script, AppConfig, CliError, Session};
use cadence_playback::{format_time, DisplayState, PlaybackEvent};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Cadence playlist player on a simulated audio engine", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    /// Print events and the final display as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the playlist
    List,
    /// Run a command script against the player
    Run {
        /// Commands: play [i], pause, next, prev, to <i>, random, seek <f>,
        /// volume <f>, slide <px>, playlist, volume-panel, resize <w> <h>,
        /// wait <secs>
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        script: Vec<String>,
    },
    /// Print the default configuration as TOML
    InitConfig,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence=info,cadence_cli=info,cadence_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitConfig => {
            print!("{}", AppConfig::default_toml()?);
        }
        Commands::List => {
            let config = AppConfig::load(cli.config.as_deref())?;
            let session = Session::new(&config)?;
            let titles = session.player().titles();

            if cli.json {
                println!("{}", serde_json::to_string(&titles)?);
            } else {
                for (index, title) in titles.iter().enumerate() {
                    println!("{:>3}  {}", index, title);
                }
            }
        }
        Commands::Run { script } => {
            let config = AppConfig::load(cli.config.as_deref())?;
            let script = parse_script(&script)?;
            let mut session = Session::new(&config)?;
            info!(
                tracks = session.player().track_count(),
                commands = script.len(),
                "running script"
            );

            let stdout = io::stdout();
            let mut out = stdout.lock();
            let mut printer = EventPrinter::new(cli.json);
            session.run(&script, |event| printer.print(&mut out, event))?;

            let display = session.player().display();
            if cli.json {
                writeln!(out, "{}", serde_json::to_string(display)?)?;
            } else {
                print_display(&mut out, display)?;
            }
        }
    }

    Ok(())
}

/// Writes events as they are drained
///
/// In text mode progress is printed once per elapsed second instead of
/// once per frame.
struct EventPrinter {
    json: bool,
    last_progress: Option<(usize, u64)>,
}

impl EventPrinter {
    fn new(json: bool) -> Self {
        Self {
            json,
            last_progress: None,
        }
    }

    fn print(&mut self, out: &mut impl Write, event: &PlaybackEvent) -> Result<(), CliError> {
        let line = if self.json {
            serde_json::to_string(event)?
        } else {
            if let PlaybackEvent::Progress {
                index,
                elapsed_secs,
                ..
            } = *event
            {
                if self.last_progress == Some((index, elapsed_secs)) {
                    return Ok(());
                }
                self.last_progress = Some((index, elapsed_secs));
            }
            describe(event)
        };
        writeln!(out, "{}", line).map_err(|e| CliError::Output(e.to_string()))
    }
}

fn describe(event: &PlaybackEvent) -> String {
    match event {
        PlaybackEvent::TrackChanged { index, title, .. } => format!("track {}: {}", index, title),
        PlaybackEvent::StatusChanged { index, status } => {
            format!("track {} is {:?}", index, status).to_lowercase()
        }
        PlaybackEvent::DurationKnown {
            index,
            duration_secs,
        } => format!("track {} lasts {}", index, format_time(*duration_secs)),
        PlaybackEvent::Progress {
            elapsed_secs,
            fraction,
            ..
        } => format!(
            "  {} ({:.0}%)",
            format_time(*elapsed_secs as f64),
            fraction * 100.0
        ),
        PlaybackEvent::VolumeChanged { level } => format!("volume {:.0}%", level * 100.0),
        PlaybackEvent::LoadFailed { index, message } => {
            format!("track {} failed to load: {}", index, message)
        }
        PlaybackEvent::AutoAdvanced { from, to } => format!("track {} ended, moving to {}", from, to),
        PlaybackEvent::PanelToggled { panel, open } => {
            let state = if *open { "shown" } else { "hidden" };
            format!("{:?} panel {}", panel, state).to_lowercase()
        }
    }
}

fn print_display(out: &mut impl Write, display: &DisplayState) -> io::Result<()> {
    writeln!(out, "---")?;
    writeln!(out, "{}", display.title)?;
    writeln!(
        out,
        "{} / {}  [{:.0}%]  {:?}",
        display.timer, display.duration, display.progress_percent, display.button
    )?;
    if display.load_failed {
        writeln!(out, "load failed")?;
    } else if display.loading {
        writeln!(out, "loading")?;
    }
    writeln!(out, "volume bar {:.0}%", display.volume_bar_percent)
}
