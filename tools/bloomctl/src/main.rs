mod state;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use bloom::{
    BoardObserver, CascadeStep, GameConfig, Grid, NoopObserver, Position, Selection, Session,
    SwapOutcome,
};
use chrono::Utc;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use serde::Serialize;
use state::{SessionStore, state_path};

#[derive(Debug, Parser)]
#[command(name = "bloomctl")]
#[command(about = "Play a match-3 session from the terminal, one command per move")]
struct Cli {
    /// Print generation and cascade details to stderr.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start a new game, replacing any saved one.
    New {
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        size: Option<usize>,
        #[arg(long)]
        symbols: Option<usize>,
        #[arg(long)]
        max_cascades: Option<usize>,
        /// JSON game config; flags above override its fields.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Count real time between commands against the round clock.
        #[arg(long, default_value_t = false)]
        timed: bool,
    },
    /// Swap two adjacent tiles.
    Swap {
        r1: usize,
        c1: usize,
        r2: usize,
        c2: usize,
    },
    /// Click a tile: the first click selects, a click on a neighbour swaps.
    Select { row: usize, col: usize },
    Show {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    Pause,
    Resume,
    /// End the round and print the summary.
    Finish {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List recorded frames; the current one is marked with `*`.
    History,
    /// Step back through the history. The next move discards the undone frames.
    Rewind {
        #[arg(default_value_t = 1)]
        frames: usize,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                err.exit();
            }
            let _ = err.print();
            return ExitCode::from(1);
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let path = state_path();
    let mut observer: Box<dyn BoardObserver> = if cli.verbose {
        Box::new(StderrObserver)
    } else {
        Box::new(NoopObserver)
    };
    let observer = observer.as_mut();

    match cli.command {
        Commands::New {
            seed,
            size,
            symbols,
            max_cascades,
            config,
            timed,
        } => cmd_new(
            &path,
            NewArgs {
                seed,
                size,
                symbols,
                max_cascades,
                config,
                timed,
            },
            observer,
        ),
        Commands::Swap { r1, c1, r2, c2 } => {
            cmd_swap(&path, Position::new(r1, c1), Position::new(r2, c2), observer)
        }
        Commands::Select { row, col } => cmd_select(&path, Position::new(row, col), observer),
        Commands::Show { json } => cmd_show(&path, json),
        Commands::Pause => cmd_set_playing(&path, false),
        Commands::Resume => cmd_set_playing(&path, true),
        Commands::Finish { json } => cmd_finish(&path, json),
        Commands::History => cmd_history(&path),
        Commands::Rewind { frames } => cmd_rewind(&path, frames),
    }
}

struct NewArgs {
    seed: Option<u64>,
    size: Option<usize>,
    symbols: Option<usize>,
    max_cascades: Option<usize>,
    config: Option<PathBuf>,
    timed: bool,
}

fn cmd_new(path: &Path, args: NewArgs, observer: &mut dyn BoardObserver) -> Result<()> {
    let mut config = match &args.config {
        Some(file) => GameConfig::load_json_file(file)
            .with_context(|| format!("Failed to load config {}", file.display()))?,
        None => GameConfig::default(),
    };
    if let Some(size) = args.size {
        config.grid_size = size;
    }
    if let Some(symbols) = args.symbols {
        config.symbol_count = symbols;
    }
    if args.max_cascades.is_some() {
        config.max_cascades = args.max_cascades;
    }
    config.validate()?;

    let now = Utc::now();
    let seed = args
        .seed
        .unwrap_or_else(|| now.timestamp_nanos_opt().unwrap_or_default() as u64);
    let session = Session::new_game_observed(config, seed, observer)
        .context("Failed to start a new game")?;
    let store = SessionStore::new(session, seed, args.timed, now);
    store.save(path)?;

    println!("New game (seed {seed}) saved to {}", path.display());
    print_status(&store, now);
    Ok(())
}

fn cmd_swap(path: &Path, a: Position, b: Position, observer: &mut dyn BoardObserver) -> Result<()> {
    let mut store = SessionStore::load(path)?;
    let now = Utc::now();
    let outcome = store.apply(now, |session| {
        session
            .attempt_swap_observed(a, b, observer)
            .with_context(|| format!("Cannot swap {a} and {b}"))
    });
    store.save(path)?;
    print_swap(&outcome?);
    print_status(&store, now);
    Ok(())
}

fn cmd_select(path: &Path, pos: Position, observer: &mut dyn BoardObserver) -> Result<()> {
    let mut store = SessionStore::load(path)?;
    let now = Utc::now();
    let selection = store.apply(now, |session| {
        session
            .select_observed(pos, observer)
            .with_context(|| format!("Cannot select {pos}"))
    });
    store.save(path)?;
    match selection? {
        Selection::Selected(pos) => println!("selected {pos}"),
        Selection::Cleared => println!("selection cleared"),
        Selection::Swapped(outcome) => print_swap(&outcome),
    }
    print_status(&store, now);
    Ok(())
}

fn cmd_show(path: &Path, json: bool) -> Result<()> {
    let store = SessionStore::load(path)?;
    let now = Utc::now();
    if json {
        println!("{}", serde_json::to_string_pretty(&SessionView::new(&store, now))?);
    } else {
        print_status(&store, now);
    }
    Ok(())
}

fn cmd_set_playing(path: &Path, playing: bool) -> Result<()> {
    let mut store = SessionStore::load(path)?;
    let now = Utc::now();
    store.apply(now, |session| {
        if playing {
            if session.is_over() {
                bail!("The round is over");
            }
            session.resume();
        } else {
            session.pause();
        }
        Ok(())
    })?;
    store.save(path)?;
    println!("{}", if playing { "resumed" } else { "paused" });
    Ok(())
}

fn cmd_finish(path: &Path, json: bool) -> Result<()> {
    let mut store = SessionStore::load(path)?;
    let now = Utc::now();
    let summary = store.apply(now, |session| Ok(session.finish()))?;
    store.save(path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Final score: {}", summary.score);
        println!(
            "Swaps: {} accepted, {} rejected; longest chain: {}",
            summary.swaps_accepted, summary.swaps_rejected, summary.longest_chain
        );
    }
    Ok(())
}

fn cmd_history(path: &Path) -> Result<()> {
    let store = SessionStore::load(path)?;
    println!(
        "seed {}  started {}  last move {}",
        store.seed,
        store.created_at.to_rfc3339(),
        store.updated_at.to_rfc3339()
    );
    for (frame, session) in store.history.history().iter().enumerate() {
        let marker = if frame == store.history.frame() { '*' } else { ' ' };
        let state = if session.is_over() {
            "over"
        } else if session.is_playing() {
            "playing"
        } else {
            "paused"
        };
        println!(
            "{marker} {frame:>3}  score {:>6}  {state}",
            session.score()
        );
    }
    Ok(())
}

fn cmd_rewind(path: &Path, frames: usize) -> Result<()> {
    let mut store = SessionStore::load(path)?;
    if !store.history.can_rewind() {
        bail!("Already at the first frame");
    }
    let frame = store.history.rewind(frames);
    store.save(path)?;
    println!("At frame {frame} of {}", store.history.len() - 1);
    print_status(&store, Utc::now());
    Ok(())
}

fn print_swap(outcome: &SwapOutcome) {
    if !outcome.accepted {
        println!("rejected: no match");
        return;
    }
    let capped = if outcome.capped { ", capped" } else { "" };
    println!(
        "accepted: +{} ({} cascade{}{capped})",
        outcome.score_delta,
        outcome.cascade_count,
        if outcome.cascade_count == 1 { "" } else { "s" }
    );
}

fn print_status(store: &SessionStore, now: chrono::DateTime<Utc>) {
    let session = store.session();
    let state = if session.is_over() {
        "over"
    } else if session.is_playing() {
        "playing"
    } else {
        "paused"
    };
    println!(
        "score {}  time {:.1}s  {state}",
        session.score(),
        store.remaining(now).as_secs_f32()
    );
    print!("{}", render_board(session.current_grid(), session.selection()));
}

/// Glyph rows with row/column indices; the selected tile is bracketed.
fn render_board(grid: &Grid, selection: Option<Position>) -> String {
    let mut out = String::from("   ");
    for col in 0..grid.size() {
        out.push_str(&format!(" {col:>2}"));
    }
    out.push('\n');
    for (row, cells) in grid.rows().enumerate() {
        out.push_str(&format!("{row:>3}"));
        for (col, cell) in cells.iter().enumerate() {
            let glyph = cell.map_or('.', |t| t.glyph());
            if selection == Some(Position::new(row, col)) {
                out.push_str(&format!("[{glyph}]"));
            } else {
                out.push_str(&format!("  {glyph}"));
            }
        }
        out.push('\n');
    }
    out
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionView {
    seed: u64,
    score: u64,
    grid: Vec<String>,
    selection: Option<Position>,
    playing: bool,
    over: bool,
    remaining_ms: u64,
    frame: usize,
}

impl SessionView {
    fn new(store: &SessionStore, now: chrono::DateTime<Utc>) -> Self {
        let session = store.session();
        Self {
            seed: store.seed,
            score: session.score(),
            grid: session.current_grid().to_glyph_rows(),
            selection: session.selection(),
            playing: session.is_playing(),
            over: session.is_over(),
            remaining_ms: duration_ms(store.remaining(now)),
            frame: store.history.frame(),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// `--verbose` diagnostics, one line per event.
struct StderrObserver;

impl BoardObserver for StderrObserver {
    fn on_board_generated(&mut self, attempts: usize) {
        eprintln!("generated board after {attempts} attempt(s)");
    }

    fn on_swap_rejected(&mut self, a: Position, b: Position) {
        eprintln!("swap {a} <-> {b} formed no match; reverted");
    }

    fn on_cascade_step(&mut self, step: &CascadeStep) {
        let phases: Vec<String> = step.phases().iter().map(|p| format!("{p:?}")).collect();
        eprintln!(
            "cascade {}: {} run(s), {} tile(s) cleared, {} x {} = +{} [{}]",
            step.depth,
            step.runs.len(),
            step.matched.len(),
            step.base_score,
            step.depth,
            step.score,
            phases.join(" -> ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_board_marks_the_selection() {
        let grid = Grid::from_rows(&["AB", "CD"]).unwrap();
        let text = render_board(&grid, Some(Position::new(1, 0)));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, ["     0  1", "  0  A  B", "  1[C]  D"]);
    }

    #[test]
    fn malformed_arguments_fail_to_parse() {
        assert!(Cli::try_parse_from(["bloomctl", "swap", "0", "0", "0"]).is_err());
        assert!(Cli::try_parse_from(["bloomctl", "swap", "0", "-1", "0", "1"]).is_err());
        assert!(Cli::try_parse_from(["bloomctl", "new", "--seed", "x"]).is_err());
        assert!(Cli::try_parse_from(["bloomctl", "show", "--json"]).is_ok());
    }

    #[test]
    fn new_flags_parse() {
        let cli = Cli::try_parse_from([
            "bloomctl", "-v", "new", "--seed", "7", "--size", "8", "--max-cascades", "3",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::New {
                seed,
                size,
                max_cascades,
                timed,
                ..
            } => {
                assert_eq!(seed, Some(7));
                assert_eq!(size, Some(8));
                assert_eq!(max_cascades, Some(3));
                assert!(!timed);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
