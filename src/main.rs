mod ui;

use clap::{error::ErrorKind, Args, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use fingertap::{
    config::{Config, ConfigStore, FileConfigStore},
    experiment::Experiment,
    logging,
    participant::{Demographics, Gender, SessionHeader},
    runtime::{CrosstermEventSource, EventSource, Runner, TapEvent},
    score,
    sequence::Sequence,
    session::{
        check_log_free, check_participant_id, check_session_allowed, next_session, practice_plan,
        session_plan,
        Counterbalance, SequenceOrder, TestOrder,
    },
    store::{open_store, StoreKind, TrialStore},
    trial::TrialPhase,
    ScoreError,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, Instant},
};
use tracing::info;

const TICK_RATE_MS: u64 = 100;

/// finger tapping sequence learning task with response-stream scoring
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "Runs the finger tapping sequence learning task in the terminal: participants type a five digit sequence on keys 1-4 as fast as they can in timed trials, and each trial's keystroke stream is scored for speed, errors and accuracy."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// run a session for a participant
    Run(RunArgs),
    /// score a keystroke stream against a target sequence
    Score(ScoreArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// participant identifier; numeric unless counterbalancing is set manually
    #[clap(short = 'p', long, required_unless_present = "practice")]
    participant: Option<String>,

    /// run a single unscored trial with the practice sequence
    #[clap(long)]
    practice: bool,

    /// override automated counterbalancing: which sequence is learned first
    #[clap(long, value_enum, requires = "test_order")]
    sequence_order: Option<SequenceOrder>,

    /// override automated counterbalancing: block order in the test session
    #[clap(long, value_enum, requires = "sequence_order")]
    test_order: Option<TestOrder>,

    /// participant age, recorded on the first session
    #[clap(long)]
    age: Option<u32>,

    /// participant gender, recorded on the first session
    #[clap(long, value_enum)]
    gender: Option<Gender>,

    #[clap(long)]
    researcher: Option<String>,

    #[clap(long)]
    location: Option<String>,

    /// directory for result tables and session logs
    #[clap(long)]
    data_dir: Option<PathBuf>,

    /// storage backend for results
    #[clap(long, value_enum)]
    store: Option<StoreKind>,

    /// length of each tapping window in seconds
    #[clap(long)]
    tap_secs: Option<u64>,

    /// rest before each trial after the first, in seconds
    #[clap(long)]
    rest_secs: Option<u64>,

    /// rest before the first trial of a block, in seconds
    #[clap(long)]
    first_rest_secs: Option<u64>,

    /// allow running sessions beyond the third
    #[clap(long)]
    allow_extra_session: bool,

    /// persist the researcher, location, storage and timing options as defaults
    #[clap(long)]
    save_config: bool,
}

impl RunArgs {
    /// Layer command line overrides onto the stored configuration
    fn apply_to(&self, cfg: &mut Config) {
        if let Some(r) = &self.researcher {
            cfg.researcher = r.clone();
        }
        if let Some(l) = &self.location {
            cfg.location = l.clone();
        }
        if let Some(d) = &self.data_dir {
            cfg.data_dir = Some(d.clone());
        }
        if let Some(s) = self.store {
            cfg.store = s;
        }
        if let Some(t) = self.tap_secs {
            cfg.tap_secs = t;
        }
        if let Some(t) = self.rest_secs {
            cfg.rest_secs = t;
        }
        if let Some(t) = self.first_rest_secs {
            cfg.first_rest_secs = t;
        }
    }

    fn counterbalance(&self, participant: &str) -> Result<Counterbalance, Box<dyn Error>> {
        match (self.sequence_order, self.test_order) {
            (Some(sequence_order), Some(test_order)) => Ok(Counterbalance {
                sequence_order,
                test_order,
            }),
            _ => Ok(Counterbalance::assign(participant)?),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    /// target sequence, e.g. 41324
    #[clap(short = 't', long)]
    target: String,

    /// keystrokes as digits; any separators are ignored
    #[clap(default_value = "")]
    stream: String,

    /// print the result as JSON
    #[clap(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Running,
    EndScreen,
    Closed,
}

#[derive(Debug)]
pub struct App {
    pub experiment: Experiment,
    pub state: AppState,
    pub aborted: bool,
}

impl App {
    pub fn new(experiment: Experiment) -> Self {
        let state = if experiment.is_finished() {
            AppState::EndScreen
        } else {
            AppState::Running
        };
        Self {
            experiment,
            state,
            aborted: false,
        }
    }

    pub fn on_tick(&mut self, elapsed: Duration) -> Result<(), ScoreError> {
        if self.state != AppState::Running {
            return Ok(());
        }
        self.experiment.on_tick(elapsed)?;
        if self.experiment.is_finished() {
            info!("Presenting end screen");
            self.state = AppState::EndScreen;
        }
        Ok(())
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        let ctrl_c =
            key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
        if self.state == AppState::Running && (key.code == KeyCode::Esc || ctrl_c) {
            info!("User aborted experiment");
            self.aborted = true;
            self.state = AppState::Closed;
            return;
        }

        match self.state {
            AppState::Running => {
                let at_intro = self
                    .experiment
                    .current()
                    .is_some_and(|run| run.phase() == TrialPhase::Intro);
                match key.code {
                    KeyCode::Char(' ') if at_intro => self.experiment.start_block(),
                    KeyCode::Char(c) => {
                        self.experiment.press(c);
                    }
                    _ => {}
                }
            }
            AppState::EndScreen => {
                info!("Experiment presentation over");
                self.state = AppState::Closed;
            }
            AppState::Closed => {}
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Score(args) => run_score(&args),
        Command::Run(args) => run_session(&args),
    }
}

fn run_score(args: &ScoreArgs) -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let target: Sequence = match args.target.parse() {
        Ok(t) => t,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, format!("invalid target: {e}"))
                .exit();
        }
    };
    let stream = parse_stream(&args.stream);
    let result = score(&stream, target.keys())?;

    if args.json {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        println!("speed: {}", result.speed);
        println!("errors: {}", result.errors);
        println!("accuracy: {}", result.accuracy);
    }
    Ok(())
}

/// Digits of a keystroke stream, skipping spaces, commas and brackets
fn parse_stream(s: &str) -> Vec<u8> {
    s.chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| d as u8)
        .collect()
}

fn run_session(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = FileConfigStore::new();
    let mut cfg = config_store.load();
    args.apply_to(&mut cfg);
    if args.save_config {
        config_store.save(&cfg)?;
    }
    let data_dir = cfg.data_dir();
    let participant = args.participant.clone().unwrap_or_default();

    let (experiment, mut store) = if args.practice {
        logging::init(&logging::practice_log_path(&data_dir))?;
        (
            Experiment::new(&participant, practice_plan(), cfg.timing()),
            None,
        )
    } else {
        check_participant_id(&participant)?;
        let store = open_store(cfg.store, &data_dir)?;
        let history = store.history(&participant)?;
        let session = next_session(&history);
        check_session_allowed(session, args.allow_extra_session)?;
        let counterbalance = args.counterbalance(&participant)?;

        let log_path = logging::session_log_path(&data_dir, &participant, session);
        check_log_free(&log_path)?;
        logging::init(&log_path)?;

        if !history.is_empty() {
            info!(
                "Existing participant with {} stored trials; continuing with session {session}",
                history.len()
            );
        }
        let demographics = if session == 1 {
            Demographics {
                age: args.age,
                gender: args.gender,
            }
        } else {
            Demographics::default()
        };
        SessionHeader {
            researcher: cfg.researcher.clone(),
            location: cfg.location.clone(),
            date: chrono::Local::now(),
            participant: participant.clone(),
            session,
            counterbalance,
            demographics,
        }
        .log();

        (
            Experiment::new(
                &participant,
                session_plan(session, counterbalance),
                cfg.timing(),
            ),
            Some(store),
        )
    };

    let started = Instant::now();
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!("Set up complete");
    let mut app = App::new(experiment);
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );
    let outcome = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    outcome?;
    info!(
        "Total experiment runtime was {} seconds",
        started.elapsed().as_secs()
    );

    if app.aborted {
        return Ok(());
    }

    if let Some(store) = store.as_mut() {
        let rows = app.experiment.into_results();
        let path = store.append(&participant, &rows)?;
        println!("Saved {} trials to {}", rows.len(), path.display());
    }

    Ok(())
}

fn start_tui<B: Backend, E: EventSource>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui(app, f))?;

    while app.state != AppState::Closed {
        let step = runner.step();
        app.on_tick(step.elapsed)?;

        if let TapEvent::Key(key) = step.event {
            app.on_key(key);
        }

        terminal.draw(|f| ui(app, f))?;
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
