//! automatron - record and replay desktop input
//!
//! Every command prints a JSON result on stdout; logs go to stderr.

mod logging;

use anyhow::{bail, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use automatron::prelude::*;
use automatron::recorder::platform::spawn_listener;
use automatron::{platform, DriverLog};

#[derive(Parser)]
#[command(name = "automatron")]
#[command(about = "Automatron - record desktop input and replay it with human-like pacing")]
#[command(version)]
struct Cli {
    /// TOML file with [capture] and [playback] settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record until the stop key or Ctrl+C, then save the sequence
    Record {
        file: PathBuf,
        /// Sequence or chain to replay before recording starts
        #[arg(long)]
        initial: Option<PathBuf>,
    },
    /// Replay a recorded sequence
    Play {
        file: PathBuf,
        #[command(flatten)]
        repeat: LoopArgs,
        #[command(flatten)]
        playback: PlaybackArgs,
    },
    /// Replay a chain of sequences
    Chain {
        file: PathBuf,
        #[command(flatten)]
        playback: PlaybackArgs,
    },
    /// Show sequence info
    Show {
        file: PathBuf,
        /// Include every action
        #[arg(long)]
        all: bool,
    },
    /// List sequences in a directory
    List {
        #[arg(default_value = automatron::recorder::storage::DEFAULT_DIR)]
        dir: PathBuf,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct PlaybackArgs {
    /// Log driver calls instead of injecting input
    #[arg(long)]
    dry_run: bool,
    /// Seed for pauses and cursor paths
    #[arg(long)]
    seed: Option<u64>,
    /// Seconds to wait before the first action
    #[arg(long)]
    start_delay: Option<f64>,
}

impl PlaybackArgs {
    fn apply(&self, config: &mut PlaybackConfig) -> Result<()> {
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(secs) = self.start_delay {
            if !(secs.is_finite() && secs >= 0.0) {
                bail!("--start-delay must be a non-negative number");
            }
            config.start_delay_secs = secs;
        }
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
struct LoopArgs {
    /// Times to play the sequence
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    loops: u32,
    /// Seconds to wait between loops (never less than the loop floor)
    #[arg(long, default_value_t = 0.0)]
    extra_delay: f64,
}

impl LoopArgs {
    fn validate(&self) -> Result<()> {
        if !(self.extra_delay.is_finite() && self.extra_delay >= 0.0) {
            bail!("--extra-delay must be a non-negative number");
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Output<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Error>,
}

impl<T: Serialize> Output<T> {
    fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }
    fn err(e: Error) -> Output<()> {
        Output { success: false, data: None, error: Some(e) }
    }
}

fn print_json<T: Serialize>(output: &T) {
    match serde_json::to_string_pretty(output) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

// ── Main ────────────────────────────────────────────────────────────────────

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            std::process::exit(code);
        }
    };

    let guard = match logging::init_logging(cli.verbose, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli) {
        match e.downcast_ref::<Error>() {
            Some(err) => {
                tracing::error!(code = ?err.code, context = ?err.context, "{}", err.message);
                print_json(&Output::<()>::err(err.clone()));
            }
            None => tracing::error!("{:#}", e),
        }
        eprintln!("Error: {:#}", e);
        drop(guard);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AutomatronConfig::from_file(path)?,
        None => AutomatronConfig::default(),
    };

    match cli.command {
        Commands::Record { file, initial } => record(&file, initial.as_deref(), config),
        Commands::Play {
            file,
            repeat,
            playback,
        } => play(&file, &repeat, config.playback, &playback),
        Commands::Chain { file, playback } => chain(&file, config.playback, &playback),
        Commands::Show { file, all } => show(&file, all),
        Commands::List { dir } => list(&dir),
    }
}

// ── Recording ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct RecordResult<'a> {
    file: &'a Path,
    session_id: String,
    actions: usize,
    duration_sec: f64,
}

fn record(file: &Path, initial: Option<&Path>, config: AutomatronConfig) -> Result<()> {
    if let Some(setup) = initial {
        match player(config.playback.clone(), &PlaybackArgs::default()) {
            Ok((player, _)) => {
                let mut orchestrator = ChainOrchestrator::new(player);
                orchestrator.player().executor().start_delay();
                run_setup(setup, &mut orchestrator);
            }
            Err(e) => tracing::error!(error = %e, "No driver for setup playback, recording anyway"),
        }
    }

    let stop_key = config.capture.stop_key.clone();
    let session = CaptureSession::start(config.capture)?;

    if let Err(e) = spawn_listener(session.sender()) {
        session.stop();
        let _ = session.wait();
        return Err(e.into());
    }

    let sender = session.sender();
    ctrlc::set_handler(move || {
        sender.send(RawEvent::Stop);
    })?;

    eprintln!("Recording... press {} or Ctrl+C to stop", stop_key);
    let sequence = session.wait()?;
    SequenceStore::save(&sequence, file)?;

    print_json(&Output::ok(RecordResult {
        file,
        session_id: sequence.metadata.session_id.clone(),
        actions: sequence.len(),
        duration_sec: sequence.metadata.duration_sec,
    }));
    Ok(())
}

/// Replay a setup sequence or chain. Failures are logged and leave the
/// recording to go ahead; returns whether the setup played through.
fn run_setup<D: InputDriver, C: Clock>(
    path: &Path,
    orchestrator: &mut ChainOrchestrator<D, C>,
) -> bool {
    tracing::info!(file = %path.display(), "Playing setup before recording");
    let played = SequenceStore::load_playbook(path)
        .and_then(|playbook| orchestrator.run_playbook(&playbook));
    match played {
        Ok(()) => {
            tracing::info!("Setup complete");
            true
        }
        Err(e) => {
            tracing::error!(file = %path.display(), error = %e, "Setup failed, recording anyway");
            false
        }
    }
}

// ── Playback ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct PlayResult<'a> {
    file: &'a Path,
    loops: u32,
    #[serde(flatten)]
    report: PlaybackReport,
    dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    driver_calls: Option<usize>,
}

/// The OS driver, or a logging stand-in for `--dry-run`.
fn driver(dry_run: bool) -> Result<(Box<dyn InputDriver>, Option<DriverLog>)> {
    if dry_run {
        let driver = DryRunDriver::new();
        let log = driver.log();
        return Ok((Box::new(driver), Some(log)));
    }
    Ok((platform::native_driver()?, None))
}

fn player(
    mut config: PlaybackConfig,
    args: &PlaybackArgs,
) -> Result<(SequencePlayer<Box<dyn InputDriver>, SystemClock>, Option<DriverLog>)> {
    args.apply(&mut config)?;
    config.validate()?;
    let (driver, log) = driver(args.dry_run)?;
    let executor = ActionExecutor::new(driver, SystemClock::new(), config);
    Ok((SequencePlayer::new(executor), log))
}

fn play(file: &Path, repeat: &LoopArgs, config: PlaybackConfig, args: &PlaybackArgs) -> Result<()> {
    repeat.validate()?;
    let sequence = SequenceStore::load(file)?;
    let (mut player, log) = player(config, args)?;

    tracing::info!(
        file = %file.display(),
        actions = sequence.len(),
        loops = repeat.loops,
        dry_run = args.dry_run,
        "Replaying sequence"
    );
    player.executor().start_delay();
    let report = player.play_repeated(&sequence, repeat.loops, repeat.extra_delay)?;

    print_json(&Output::ok(PlayResult {
        file,
        loops: repeat.loops,
        report,
        dry_run: args.dry_run,
        driver_calls: log.map(|l| l.len()),
    }));
    Ok(())
}

fn chain(file: &Path, config: PlaybackConfig, args: &PlaybackArgs) -> Result<()> {
    let chain = SequenceStore::load_chain(file)?;
    let (player, _) = player(config, args)?;
    let mut orchestrator = ChainOrchestrator::new(player);

    tracing::info!(file = %file.display(), items = chain.items.len(), dry_run = args.dry_run, "Running chain");
    orchestrator.player().executor().start_delay();
    let report = orchestrator.run(&chain);

    print_json(&Output::ok(report));
    Ok(())
}

// ── Inspection ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct SequenceSummary<'a> {
    metadata: &'a SequenceMetadata,
    actions: usize,
    by_type: BTreeMap<&'a str, usize>,
    unknown: usize,
    malformed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    entries: Option<&'a [ActionEntry]>,
}

fn summarize(sequence: &Sequence, all: bool) -> SequenceSummary<'_> {
    let mut by_type = BTreeMap::new();
    let (mut unknown, mut malformed) = (0, 0);
    for entry in &sequence.actions {
        match entry {
            ActionEntry::Valid(action) => *by_type.entry(action.name()).or_insert(0) += 1,
            ActionEntry::Unknown { .. } => unknown += 1,
            ActionEntry::Malformed { .. } => malformed += 1,
        }
    }
    SequenceSummary {
        metadata: &sequence.metadata,
        actions: sequence.len(),
        by_type,
        unknown,
        malformed,
        entries: all.then_some(sequence.actions.as_slice()),
    }
}

fn show(file: &Path, all: bool) -> Result<()> {
    let sequence = SequenceStore::load(file)?;
    print_json(&Output::ok(summarize(&sequence, all)));
    Ok(())
}

fn list(dir: &Path) -> Result<()> {
    let files = SequenceStore::with_dir(dir).list()?;
    print_json(&Output::ok(files));
    Ok(())
}
