use clap::{Parser, Subcommand};
use gains_core::alerts::{AlertError, AlertSettings, NotificationPermission, PlatformAlerts};
use gains_core::config::WeightUnit;
use gains_core::ticker::Ticker;
use gains_core::*;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "gains")]
#[command(about = "Active workout session tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start today's workout (or a named one)
    Start {
        /// Workout type id or name (push, pull, legs)
        #[arg(long)]
        workout: Option<String>,

        /// Replace a workout that is already in progress
        #[arg(long)]
        force: bool,
    },

    /// Show the workout in progress (default)
    Status,

    /// Complete a set of the current exercise
    Log {
        weight: f64,
        reps: u32,

        /// Set number (defaults to the first open set)
        #[arg(long)]
        set: Option<usize>,

        /// Do not start the rest countdown afterwards
        #[arg(long)]
        no_rest: bool,
    },

    /// Change the weight or reps of a set of the current exercise
    Edit {
        #[arg(long)]
        set: usize,

        #[arg(long)]
        weight: Option<f64>,

        #[arg(long)]
        reps: Option<u32>,
    },

    /// Add a set to the current exercise
    AddSet,

    /// Delete a set of the current exercise
    DeleteSet { set: usize },

    /// Move to the next exercise
    Next,

    /// Move to the previous exercise
    Prev,

    /// Run a rest countdown (Ctrl-C skips)
    Rest { seconds: Option<u32> },

    /// Pause or resume the workout clock
    Pause,

    /// Complete the workout
    Finish,

    /// Throw the workout in progress away
    Abandon,

    /// Mark today's rest day as done
    RestDay,
}

#[tokio::main]
async fn main() -> Result<()> {
    gains_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    std::fs::create_dir_all(&data_dir)?;
    tracing::debug!("Using data directory {:?}", data_dir);

    let program = get_default_program();
    let errors = program.validate();
    if !errors.is_empty() {
        eprintln!("Program validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid program".into()));
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let log = Arc::new(LocalWorkoutLog::new(&data_dir, clock.clone()));
    let resume = ResumeStore::in_dir(&data_dir, clock.clone(), config.resume.clone());
    let mut store = SessionStore::new(SyncController::new(log.clone()), resume, clock.clone());
    store.restore();

    let mut app = App {
        store,
        log,
        clock,
        config,
    };

    let result = match cli.command.unwrap_or(Commands::Status) {
        Commands::Start { workout, force } => app.cmd_start(workout, force).await,
        Commands::Status => app.cmd_status(),
        Commands::Log {
            weight,
            reps,
            set,
            no_rest,
        } => app.cmd_log(weight, reps, set, no_rest).await,
        Commands::Edit { set, weight, reps } => app.cmd_edit(set, weight, reps).await,
        Commands::AddSet => app.cmd_add_set(),
        Commands::DeleteSet { set } => app.cmd_delete_set(set),
        Commands::Next => app.cmd_navigate(NavKey::ArrowRight),
        Commands::Prev => app.cmd_navigate(NavKey::ArrowLeft),
        Commands::Rest { seconds } => {
            let seconds = seconds.unwrap_or(app.config.timer.default_rest_seconds);
            app.run_rest(seconds).await
        }
        Commands::Pause => app.cmd_pause(),
        Commands::Finish => app.cmd_finish().await,
        Commands::Abandon => app.cmd_abandon(),
        Commands::RestDay => app.cmd_rest_day(),
    };

    // Let background deletes reach the log before exiting
    app.store.settle().await;
    result
}

struct App {
    store: SessionStore,
    log: Arc<LocalWorkoutLog>,
    clock: Arc<dyn Clock>,
    config: Config,
}

impl App {
    fn unit(&self) -> WeightUnit {
        self.config.units.weight_unit
    }

    fn require_session(&self) -> Result<&WorkoutSession> {
        self.store
            .session()
            .ok_or_else(|| Error::Validation("No workout in progress. Run `gains start`.".into()))
    }

    fn current_index(&self) -> Result<usize> {
        Ok(self.require_session()?.current_exercise_index)
    }

    fn exercise_at(&self, index: usize) -> Result<&ExerciseProgress> {
        self.require_session()?
            .exercises
            .get(index)
            .ok_or_else(|| Error::Validation(format!("No exercise {} in this workout", index + 1)))
    }

    /// Turn a 1-based set number into an index of the current exercise
    fn set_index(&self, set_number: usize) -> Result<usize> {
        let exercise = self.exercise_at(self.current_index()?)?;
        if set_number == 0 || set_number > exercise.sets.len() {
            return Err(Error::Validation(format!(
                "{} has sets 1-{}",
                exercise.exercise.name,
                exercise.sets.len()
            )));
        }
        Ok(set_number - 1)
    }

    async fn cmd_start(&mut self, workout: Option<String>, force: bool) -> Result<()> {
        if let Some(session) = self.store.session() {
            if !force {
                return Err(Error::Validation(format!(
                    "{} workout already in progress; use --force to replace it or `gains abandon`",
                    session.workout_type_name
                )));
            }
        }

        let program = get_default_program();
        let workout_type = match workout {
            Some(key) => program
                .find(&key)
                .ok_or_else(|| Error::NotFound(format!("workout type '{}'", key)))?,
            None => {
                let today = self.log.schedule()?.today();
                program.workout_for_day(today).ok_or_else(|| {
                    Error::Validation(
                        "Today is a rest day. Run `gains rest-day` or pick one with --workout."
                            .into(),
                    )
                })?
            }
        };

        let previous = self.log.previous_sets(&workout_type.id)?;
        self.store.start_new(workout_type, &previous).await?;

        println!("✓ Started {} workout", workout_type.name);
        self.print_session();
        Ok(())
    }

    fn cmd_status(&self) -> Result<()> {
        if self.store.is_active() {
            self.print_session();
        } else {
            let today = self.log.schedule()?.today();
            println!("No workout in progress.");
            println!("  Today: {}", today.label());
        }
        Ok(())
    }

    async fn cmd_log(
        &mut self,
        weight: f64,
        reps: u32,
        set: Option<usize>,
        no_rest: bool,
    ) -> Result<()> {
        let exercise = self.current_index()?;
        let index = match set {
            Some(number) => self.set_index(number)?,
            None => self.store.active_set_index(exercise).ok_or_else(|| {
                Error::Validation("Every set of this exercise is already logged".into())
            })?,
        };

        self.store
            .update_set_field(exercise, index, SetField::Weight(Some(weight)))?;
        self.store
            .update_set_field(exercise, index, SetField::Reps(Some(reps)))?;
        let logged = self.store.complete_set(exercise, index).await?;

        let unit = self.unit().label();
        print!("✓ Set {} logged: {} {} x {}", index + 1, weight, unit, reps);
        if logged.is_pr {
            print!("  ★ New PR!");
        }
        println!();

        if self.store.is_complete() {
            println!("All sets done. Run `gains finish` to complete the workout.");
            return Ok(());
        }
        if self.store.active_set_index(exercise).is_none() {
            println!("Exercise done. Run `gains next` for the next one.");
        }

        let rest_seconds = self
            .store
            .current_exercise()
            .map(|ex| ex.exercise.rest_seconds)
            .unwrap_or(self.config.timer.default_rest_seconds);
        if !no_rest {
            self.run_rest(rest_seconds).await?;
        }
        Ok(())
    }

    async fn cmd_edit(&mut self, set: usize, weight: Option<f64>, reps: Option<u32>) -> Result<()> {
        if weight.is_none() && reps.is_none() {
            return Err(Error::Validation("Nothing to change; pass --weight and/or --reps".into()));
        }
        let exercise = self.current_index()?;
        let index = self.set_index(set)?;
        let entry = self
            .exercise_at(exercise)?
            .sets
            .get(index)
            .cloned()
            .ok_or_else(|| Error::Validation(format!("No set {}", set)))?;

        if entry.completed {
            let weight = weight.or(entry.weight).unwrap_or_default();
            let reps = reps.or(entry.reps).unwrap_or_default();
            self.store.amend_set(exercise, index, weight, reps).await?;
        } else {
            if weight.is_some() {
                self.store
                    .update_set_field(exercise, index, SetField::Weight(weight))?;
            }
            if reps.is_some() {
                self.store
                    .update_set_field(exercise, index, SetField::Reps(reps))?;
            }
        }

        println!("✓ Set {} updated", set);
        Ok(())
    }

    fn cmd_add_set(&mut self) -> Result<()> {
        let exercise = self.current_index()?;
        self.store.add_set(exercise)?;
        let count = self.exercise_at(exercise)?.sets.len();
        println!("✓ Added set {}", count);
        Ok(())
    }

    fn cmd_delete_set(&mut self, set: usize) -> Result<()> {
        let exercise = self.current_index()?;
        let index = self.set_index(set)?;
        self.store.delete_set(exercise, index)?;
        println!("✓ Deleted set {}", set);
        Ok(())
    }

    fn cmd_navigate(&mut self, key: NavKey) -> Result<()> {
        self.require_session()?;
        let navigator = SwipeNavigator::new(self.config.navigation.swipe_threshold_px);
        if let Some(intent) = navigator.key(key) {
            self.store.navigate(intent);
        }
        self.print_session();
        Ok(())
    }

    fn cmd_pause(&mut self) -> Result<()> {
        let paused = !self.require_session()?.paused;
        self.store.set_paused(paused);
        if paused {
            println!("⏸ Workout paused");
        } else {
            println!("▶ Workout resumed");
        }
        Ok(())
    }

    async fn cmd_finish(&mut self) -> Result<()> {
        self.require_session()?;
        let summary = self.store.finish().await?;

        println!("✓ {} workout complete!", summary.workout_type_name);
        println!(
            "  Duration: {}",
            rest_timer::format_clock(summary.duration_seconds)
        );
        println!(
            "  Volume: {} {}",
            summary.total_volume,
            self.unit().label()
        );
        println!(
            "  Sets: {} across {} exercises",
            summary.total_sets, summary.total_exercises
        );
        println!("  Next up: {}", self.log.schedule()?.today().label());
        Ok(())
    }

    fn cmd_abandon(&mut self) -> Result<()> {
        if !self.store.is_active() {
            println!("No workout in progress.");
            return Ok(());
        }
        self.store.abandon();
        println!("✓ Workout abandoned");
        Ok(())
    }

    fn cmd_rest_day(&mut self) -> Result<()> {
        let schedule = self.log.complete_rest_day()?;
        println!("✓ Rest day done. Next up: {}", schedule.today().label());
        Ok(())
    }

    async fn run_rest(&self, seconds: u32) -> Result<()> {
        let mut timer = RestTimer::new(
            self.config.timer.default_rest_seconds,
            AlertSettings::from(&self.config.timer),
            Arc::new(TerminalAlerts),
        );
        timer.start(seconds);
        if !timer.is_active() {
            return Ok(());
        }

        println!("Resting {} (Ctrl-C to skip)", timer.formatted_remaining());
        let mut ticker = Ticker::spawn(Duration::from_secs(1));
        loop {
            tokio::select! {
                tick = ticker.next() => {
                    if tick.is_none() {
                        break;
                    }
                    let report = timer.tick();
                    print!("\r  {} remaining ({:.0}%) ", timer.formatted_remaining(), timer.progress());
                    io::stdout().flush()?;
                    if report.is_some() {
                        println!("\n✓ Rest complete");
                        timer.dismiss();
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    timer.skip();
                    ticker.cancel();
                    println!("\nRest skipped");
                    break;
                }
            }
        }
        Ok(())
    }

    fn print_session(&self) {
        let Some(session) = self.store.session() else {
            return;
        };
        let elapsed = ElapsedTimer::for_session(session, self.clock.clone());
        let unit = self.unit().label();

        println!();
        print!("  {}  {}", session.workout_type_name, elapsed.formatted());
        if session.paused {
            print!("  (paused)");
        }
        println!();
        println!(
            "  {}/{} sets  ·  {} {}",
            session.completed_sets(),
            session.total_sets(),
            session.total_volume(),
            unit
        );
        println!();

        for (i, progress) in session.exercises.iter().enumerate() {
            let marker = if i == session.current_exercise_index { "▶" } else { " " };
            let done = progress.sets.iter().filter(|s| s.completed).count();
            println!(
                "{} {} ({}/{}, {}-{} reps)",
                marker,
                progress.exercise.name,
                done,
                progress.sets.len(),
                progress.exercise.target_reps_min,
                progress.exercise.target_reps_max
            );

            if i != session.current_exercise_index {
                continue;
            }
            let active = progress.active_set_index();
            for (j, set) in progress.sets.iter().enumerate() {
                let status = if set.completed {
                    "✓"
                } else if Some(j) == active {
                    "→"
                } else {
                    "·"
                };
                let values = match (set.weight, set.reps) {
                    (Some(w), Some(r)) => format!("{} {} x {}", w, unit, r),
                    (Some(w), None) => format!("{} {} x -", w, unit),
                    (None, Some(r)) => format!("- x {}", r),
                    (None, None) => "-".to_string(),
                };
                let previous = progress
                    .previous_for(set.set_number)
                    .map(|p| format!("   last: {} x {}", p.weight, p.reps))
                    .unwrap_or_default();
                println!("    {} {}  {}{}", status, set.set_number, values, previous);
            }
        }
        println!();
    }
}

/// Rest alerts for a terminal: bell for sound, stderr for notifications
struct TerminalAlerts;

impl PlatformAlerts for TerminalAlerts {
    fn play_sound(&self) -> std::result::Result<(), AlertError> {
        let mut stderr = io::stderr();
        stderr
            .write_all(b"\x07")
            .and_then(|_| stderr.flush())
            .map_err(|e| AlertError::Failed(e.to_string()))
    }

    fn vibrate(&self, _pattern_ms: &[u64]) -> std::result::Result<(), AlertError> {
        Err(AlertError::Unsupported)
    }

    fn notification_permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    fn show_notification(&self, title: &str, body: &str) -> std::result::Result<(), AlertError> {
        eprintln!("{}: {}", title, body);
        Ok(())
    }
}
