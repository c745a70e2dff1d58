use chrono::Utc;
use clap::{Parser, Subcommand};
use oshfit_core::export::write_score_csv;
use oshfit_core::history::{ensure_session_id, raw_session_id};
use oshfit_core::normalize::{session_from_json, session_id_from_raw};
use oshfit_core::progression::{consecutive_weekly_increase_streak, exercise_history, percent_increase};
use oshfit_core::temporal::current_day_streak;
use oshfit_core::*;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "oshfit")]
#[command(about = "Workout log achievements and scoring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a session from a JSON file ('-' for stdin)
    Log { input: String },

    /// Replace a logged session with an edited version ('-' for stdin)
    Edit { input: String },

    /// Delete a logged session (unlocked achievements stay unlocked)
    Delete { id: String },

    /// Re-evaluate and list achievements (default)
    Achievements,

    /// Show the latest score and the score trend
    Score {
        /// Also export the trend to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Show the weight history of one exercise
    Progress { exercise: String },
}

/// Everything a command needs, built once at start-up
struct App {
    achievements: AchievementCatalog,
    exercises: ExerciseCatalog,
    history: HistoryLog,
    state_path: PathBuf,
}

impl App {
    fn new(data_dir: &Path, config: &Config) -> Result<Self> {
        let achievements = AchievementCatalog::from_config(&config.achievements);
        let exercises = default_exercise_catalog().with_custom(&config.exercises.custom);

        let mut errors = achievements.validate();
        errors.extend(exercises.validate());
        if !errors.is_empty() {
            eprintln!("Catalog validation errors:");
            for error in &errors {
                eprintln!("  - {}", error);
            }
            return Err(Error::CatalogValidation("Invalid catalog".into()));
        }

        let history_dir = data_dir.join("history");
        Ok(Self {
            achievements,
            exercises,
            history: HistoryLog::new(history_dir.join("sessions.jsonl")),
            state_path: history_dir.join("achievements.json"),
        })
    }

    /// Re-evaluate against the stored history and persist the result.
    ///
    /// Callers hold the history lock so the pass sees every earlier write.
    fn reevaluate(&self, session_id: Option<Uuid>) -> Result<(Vec<Session>, Evaluation)> {
        let sessions = self.history.load()?;
        let now = Utc::now();
        let mut newly_unlocked = Vec::new();

        let stored = UserAchievements::update(&self.state_path, |stored| {
            let evaluation = match session_id {
                Some(id) => evaluate_session(
                    &self.achievements,
                    &self.exercises,
                    &stored.states,
                    &sessions,
                    id,
                    now,
                )?,
                None => evaluate(
                    &self.achievements,
                    &self.exercises,
                    &stored.states,
                    &sessions,
                    now,
                ),
            };
            stored.states = evaluation.states;
            newly_unlocked = evaluation.newly_unlocked;
            Ok(())
        })?;

        let evaluation = Evaluation {
            states: stored.states,
            newly_unlocked,
        };
        Ok((sessions, evaluation))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    oshfit_core::logging::init_with_level(oshfit_core::logging::level_for_verbosity(cli.verbose));

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;

    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);
    let app = App::new(&data_dir, &config)?;

    match cli.command {
        Some(Commands::Log { input }) => cmd_log(&app, &input),
        Some(Commands::Edit { input }) => cmd_edit(&app, &input),
        Some(Commands::Delete { id }) => cmd_delete(&app, &id),
        Some(Commands::Score { csv }) => cmd_score(&app, csv.as_deref()),
        Some(Commands::Progress { exercise }) => cmd_progress(&app, &exercise),
        Some(Commands::Achievements) | None => cmd_achievements(&app),
    }
}

/// Read one session document from a file or stdin
fn read_session_json(input: &str) -> Result<serde_json::Value> {
    let contents = if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input)?
    };
    Ok(serde_json::from_str(&contents)?)
}

fn cmd_log(app: &App, input: &str) -> Result<()> {
    let mut raw = read_session_json(input)?;
    let id = ensure_session_id(&mut raw)?;

    // Reject sessions the engine could never place in time
    let session = session_from_json(&raw)?;

    let _lock = app.history.lock()?;
    if app.history.contains(id)? {
        return Err(Error::Other(format!(
            "Session {} is already logged; use `oshfit edit` to change it",
            id
        )));
    }

    let mut sink = HistoryLog::new(app.history.path());
    sink.append(&raw)?;

    let (_, evaluation) = app.reevaluate(Some(id))?;

    println!("✓ Session logged!");
    println!("  ID: {}", id);
    println!(
        "  {} workout, {} exercises, score {:.1}",
        session.category,
        session.exercises.len(),
        session_score(&session)
    );
    print_unlocked(app, &evaluation);
    Ok(())
}

fn cmd_edit(app: &App, input: &str) -> Result<()> {
    let raw = read_session_json(input)?;
    let id = raw_session_id(&raw)
        .ok_or_else(|| Error::InvalidSession("an edited session must carry its id".into()))?;
    let session = session_from_json(&raw)?;

    let _lock = app.history.lock()?;
    if !app.history.replace(id, &raw)? {
        return Err(Error::SessionNotInHistory(id));
    }

    let (_, evaluation) = app.reevaluate(Some(id))?;

    println!("✓ Session {} updated", id);
    println!("  Score: {:.1}", session_score(&session));
    print_unlocked(app, &evaluation);
    Ok(())
}

fn cmd_delete(app: &App, id: &str) -> Result<()> {
    let id = session_id_from_raw(id);

    let _lock = app.history.lock()?;
    if !app.history.remove(id)? {
        return Err(Error::Other(format!("No session with id {}", id)));
    }

    app.reevaluate(None)?;
    println!("✓ Session {} deleted", id);
    Ok(())
}

fn cmd_achievements(app: &App) -> Result<()> {
    let (sessions, evaluation) = {
        let _lock = app.history.lock()?;
        app.reevaluate(None)?
    };

    let unlocked = evaluation.states.iter().filter(|s| s.is_unlocked()).count();
    println!(
        "Achievements: {}/{} unlocked ({} sessions logged)",
        unlocked,
        app.achievements.definitions.len(),
        sessions.len()
    );
    println!(
        "Current streak: {} days",
        current_day_streak(&sessions, Utc::now().date_naive())
    );
    println!();

    for def in &app.achievements.definitions {
        let Some(state) = evaluation.states.iter().find(|s| s.id == def.id) else {
            continue;
        };

        match state.unlocked_at() {
            Some(at) => println!(
                "  {} {:<24} unlocked {}",
                def.emoji,
                def.name,
                at.format("%Y-%m-%d")
            ),
            None => {
                let count = state
                    .count
                    .map(|c| format!(" {}/{}", c.current, c.required))
                    .unwrap_or_default();
                println!(
                    "  {} {:<24} {} {:>3.0}%{}",
                    def.emoji,
                    def.name,
                    progress_bar(state.progress),
                    state.progress * 100.0,
                    count
                );
            }
        }
    }

    print_unlocked(app, &evaluation);
    Ok(())
}

fn cmd_score(app: &App, csv: Option<&Path>) -> Result<()> {
    let sessions = app.history.load()?;

    let Some(latest) = latest_score(&sessions) else {
        println!("No sessions logged yet.");
        return Ok(());
    };

    println!("Oshfit score: {:.1}", latest);
    if score_improved(&sessions) {
        println!("  ↑ up from your previous session");
    }
    println!();

    for point in score_trend(&sessions) {
        println!(
            "  {}  {:>6.1}  {}",
            point.performed_at.format("%Y-%m-%d %H:%M"),
            point.score,
            point.session_id
        );
    }

    if let Some(path) = csv {
        let count = write_score_csv(&sessions, path)?;
        println!();
        println!("✓ Exported {} sessions to CSV", count);
        println!("  CSV: {}", path.display());
    }

    Ok(())
}

fn cmd_progress(app: &App, exercise: &str) -> Result<()> {
    let sessions = app.history.load()?;
    let history = exercise_history(&sessions, exercise);

    if history.is_empty() {
        println!("No records of {} yet.", exercise);
        return Ok(());
    }

    println!("{}: {} sessions", exercise, history.len());
    for point in &history {
        println!(
            "  {}  {:>7.1} kg  {:>8.1} kg volume",
            point.performed_at.format("%Y-%m-%d"),
            point.kg_weight,
            point.volume_kg
        );
    }
    println!();
    println!("  Change since first: {:+.1}%", percent_increase(&sessions, exercise));
    println!(
        "  Weekly increase streak: {}",
        consecutive_weekly_increase_streak(&sessions, exercise)
    );
    Ok(())
}

fn progress_bar(progress: f64) -> String {
    const WIDTH: usize = 20;
    let filled = ((progress.clamp(0.0, 1.0) * WIDTH as f64).round() as usize).min(WIDTH);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(WIDTH - filled))
}

fn print_unlocked(app: &App, evaluation: &Evaluation) {
    for id in &evaluation.newly_unlocked {
        if let Some(def) = app.achievements.get(id) {
            println!();
            println!("🏆 Achievement unlocked: {} {}", def.emoji, def.name);
            println!("   {}", def.description);
        }
    }
}
