use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{broadcast, mpsc},
};

use orbit::{
    analytics::WeekStats,
    clock::{Clock, SystemClock},
    coordinator::{ControlCommand, FocusCoordinator, FocusModeService, Repositories, RunOutcome},
    db::{Database, TaskItem},
    repository::{SqliteSessionRepository, SqliteTaskRepository},
    settings::SettingsStore,
    timer::{IntervalTicker, TimerEvent},
};

const DB_FILE: &str = "orbit.sqlite3";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Parser)]
#[command(name = "orbit")]
#[command(about = "Focus timer with weekly focus statistics")]
#[command(version)]
struct Cli {
    /// Directory holding the database and settings
    #[arg(long, global = true, env = "ORBIT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a focus session in the foreground (p = pause, r = resume, s = stop)
    Start {
        /// Session length in minutes
        #[arg(short, long, conflicts_with = "task")]
        minutes: Option<u64>,
        /// Run a session for a task (id or id prefix)
        #[arg(short, long)]
        task: Option<String>,
    },

    /// Show weekly focus statistics
    Stats {
        /// Week offset: 0 is this week, -1 last week
        #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
        week: i32,
    },

    /// Task management
    Task {
        #[command(subcommand)]
        action: TaskCommands,
    },

    /// Seed a few weeks of random sessions
    Mock,

    /// Delete every stored focus session
    Reset,

    /// List the duration presets
    Presets,

    /// Show or change settings
    Config {
        /// Default session length in minutes
        #[arg(long)]
        default_minutes: Option<u64>,
        /// Toggle do-not-disturb while a session runs
        #[arg(long)]
        focus_mode: Option<bool>,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Add a task
    Add {
        /// Task title
        title: String,
        /// Planned length in minutes
        #[arg(short, long, default_value_t = 25)]
        minutes: u32,
    },
    /// List tasks, newest first
    List,
    /// Toggle a task's completion
    Done {
        /// Task id or id prefix
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task id or id prefix
        id: String,
    },
    /// Delete every completed task
    ClearCompleted,
}

fn default_data_dir() -> Result<PathBuf> {
    let base = dirs::data_dir().context("Could not determine a data directory")?;
    Ok(base.join("orbit"))
}

fn build_coordinator(data_dir: &Path, settings: &SettingsStore) -> Result<FocusCoordinator> {
    let config = settings.config().with_env_overrides();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let db = Database::new(data_dir.join(DB_FILE))?;

    let repositories = Repositories {
        sessions: Arc::new(SqliteSessionRepository::new(db.clone(), clock.clone())),
        tasks: Arc::new(SqliteTaskRepository::new(db)),
    };
    let ticker = Box::new(IntervalTicker::new(config.tick_interval()));
    let focus_mode = Arc::new(FocusModeService::new(config.focus_mode_enabled));

    Ok(FocusCoordinator::new(
        config,
        clock,
        ticker,
        repositories,
        focus_mode,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .init();

    log::info!("Orbit starting up...");

    let cli = Cli::parse();
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    let settings = SettingsStore::new(data_dir.join(SETTINGS_FILE))?;

    if let Commands::Config {
        default_minutes,
        focus_mode,
    } = &cli.command
    {
        return configure(&settings, *default_minutes, *focus_mode);
    }

    let mut coordinator = build_coordinator(&data_dir, &settings)?;

    match cli.command {
        Commands::Start { minutes, task } => run_session(&mut coordinator, minutes, task).await?,
        Commands::Stats { week } => {
            let mut engine = coordinator.stats();
            print_week(engine.show_week(week).await);
            print_energy(&coordinator);
        }
        Commands::Task { action } => run_task_command(&coordinator, action).await?,
        Commands::Mock => {
            let stored = coordinator.generate_mock_data().await;
            println!("Generated {stored} sessions");
        }
        Commands::Reset => {
            coordinator.clear_all_data().await?;
            println!("All focus sessions deleted");
        }
        Commands::Presets => {
            let config = coordinator.config();
            for minutes in &config.preset_minutes {
                println!("{minutes} min");
            }
            println!("default: {} min", config.default_duration_minutes());
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn configure(
    settings: &SettingsStore,
    default_minutes: Option<u64>,
    focus_mode: Option<bool>,
) -> Result<()> {
    let config = if default_minutes.is_none() && focus_mode.is_none() {
        settings.config()
    } else {
        let default_secs = default_minutes.map(minutes_to_secs).transpose()?;
        settings.update(|config| {
            if let Some(secs) = default_secs {
                config.default_duration_secs = secs;
            }
            if let Some(enabled) = focus_mode {
                config.focus_mode_enabled = enabled;
            }
        })?
    };

    println!("{}", serde_json::to_string_pretty(&config)?);
    println!("(stored in {})", settings.path().display());
    Ok(())
}

fn minutes_to_secs(minutes: u64) -> Result<u64> {
    if minutes == 0 {
        bail!("Duration must be at least one minute");
    }
    minutes
        .checked_mul(60)
        .with_context(|| format!("{minutes} minutes is too long"))
}

async fn resolve_task(coordinator: &FocusCoordinator, id: &str) -> Result<TaskItem> {
    let mut matches: Vec<TaskItem> = coordinator
        .tasks()
        .await
        .into_iter()
        .filter(|task| task.id.starts_with(id))
        .collect();

    match matches.len() {
        0 => bail!("No task matches '{id}'"),
        1 => Ok(matches.remove(0)),
        n => bail!("'{id}' is ambiguous ({n} tasks match)"),
    }
}

async fn run_task_command(coordinator: &FocusCoordinator, action: TaskCommands) -> Result<()> {
    match action {
        TaskCommands::Add { title, minutes } => {
            let task = coordinator.add_task(&title, minutes).await?;
            println!("Added {} ({} min) [{}]", task.title, task.duration_minutes, short_id(&task));
        }
        TaskCommands::List => {
            let tasks = coordinator.tasks().await;
            if tasks.is_empty() {
                println!("No tasks");
            }
            for task in tasks {
                let mark = if task.is_completed { "x" } else { " " };
                println!(
                    "[{mark}] {}  {:>3} min  {}",
                    short_id(&task),
                    task.duration_minutes,
                    task.title
                );
            }
        }
        TaskCommands::Done { id } => {
            let task = resolve_task(coordinator, &id).await?;
            let completed = coordinator.toggle_task(&task.id).await?;
            let state = if completed { "done" } else { "open" };
            println!("{} is now {state}", task.title);
        }
        TaskCommands::Delete { id } => {
            let task = resolve_task(coordinator, &id).await?;
            coordinator.delete_task(&task.id).await?;
            println!("Deleted {}", task.title);
        }
        TaskCommands::ClearCompleted => {
            let removed = coordinator.delete_completed_tasks().await?;
            println!("Removed {removed} completed tasks");
        }
    }
    Ok(())
}

fn short_id(task: &TaskItem) -> &str {
    task.id.get(..8).unwrap_or(&task.id)
}

async fn run_session(
    coordinator: &mut FocusCoordinator,
    minutes: Option<u64>,
    task: Option<String>,
) -> Result<()> {
    let (commands_tx, mut commands) = mpsc::channel(8);
    spawn_stdin_reader(commands_tx.clone());
    spawn_progress_printer(coordinator.timer().subscribe());

    match task {
        Some(id) => {
            let task = resolve_task(coordinator, &id).await?;
            println!("Focusing on {} for {} min", task.title, task.duration_minutes);
            coordinator.start_task_session(task);
        }
        None => {
            let duration_secs = minutes.map(minutes_to_secs).transpose()?;
            coordinator.start_focus_session(duration_secs);
            println!("Focusing for {}", coordinator.timer().time_formatted());
        }
    }

    print_energy(coordinator);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = commands_tx.send(ControlCommand::Stop).await;
        }
    });

    let outcome = coordinator.run(&mut commands).await;
    coordinator.flush_saves().await;

    match outcome {
        RunOutcome::Finished => println!("\nSession complete"),
        RunOutcome::Stopped => println!("\nSession stopped"),
    }
    Ok(())
}

fn spawn_stdin_reader(commands: mpsc::Sender<ControlCommand>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let command = match line.trim() {
                "p" | "pause" => ControlCommand::Pause,
                "r" | "resume" => ControlCommand::Resume,
                "s" | "stop" | "q" => ControlCommand::Stop,
                "" | "t" | "toggle" => ControlCommand::Toggle,
                other => {
                    eprintln!("Unknown command '{other}' (p, r, s)");
                    continue;
                }
            };
            if commands.send(command).await.is_err() {
                break;
            }
        }
    });
}

fn spawn_progress_printer(mut events: broadcast::Receiver<TimerEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(TimerEvent::TickOccurred { time_left_secs }) => {
                    print!(
                        "\r{:02}:{:02} ",
                        time_left_secs / 60,
                        time_left_secs % 60
                    );
                    let _ = std::io::stdout().flush();
                }
                Ok(TimerEvent::PhaseChanged { to, .. }) => {
                    println!("\n[{}]", to.as_str());
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

fn print_energy(coordinator: &FocusCoordinator) {
    let energy = coordinator.energy();
    println!("Energy: {} ({})", energy.status(), energy.level().as_str());
}

fn print_week(stats: &WeekStats) {
    println!("Week of {} (offset {})", stats.date_range, stats.week_offset);
    println!(
        "Total focus: {}  across {} sessions",
        stats.total_focus_label,
        stats.sessions.len()
    );
    println!();

    const BAR_WIDTH: f64 = 30.0;
    for day in &stats.daily {
        let width = (day.height_ratio(stats.max_daily_minutes) * BAR_WIDTH).round() as usize;
        let marker = if day.is_today { "*" } else { " " };
        println!(
            "{marker}{} {:<30} {:>7}  {:?}",
            day.day_label,
            "#".repeat(width),
            day.formatted_time(),
            day.intensity
        );
    }
}
