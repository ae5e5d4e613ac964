use binokel::agents::{
    BotProfile, ChannelHuman, ChannelSink, Difficulty, HostEvent, ScriptedHuman, TracingSink,
};
use binokel::bridge::RoundBridge;
use binokel::controller::RoundController;
use binokel::settings::{DeckVariant, RoundRecord, RoundSettings, SeatKind};
use binokel::tui::{app::AppState, controller};
use clap::{Parser, ValueEnum};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::prelude::*;
use std::io::{self, IsTerminal, Stdout};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DeckArg {
    Short,
    Full,
}

impl From<DeckArg> for DeckVariant {
    fn from(d: DeckArg) -> Self {
        match d {
            DeckArg::Short => DeckVariant::Short40,
            DeckArg::Full => DeckVariant::Full48,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DifficultyArg {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl From<DifficultyArg> for Difficulty {
    fn from(d: DifficultyArg) -> Self {
        match d {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Medium => Difficulty::Medium,
            DifficultyArg::Hard => Difficulty::Hard,
            DifficultyArg::Expert => Difficulty::Expert,
        }
    }
}

/// Play one round of Binokel.
#[derive(Debug, Parser)]
#[command(name = "binokel", version, about)]
struct Args {
    /// Number of players (3 or 4)
    #[arg(short, long, default_value_t = 4)]
    players: usize,
    /// Seat of the dealer, 0-based
    #[arg(short, long, default_value_t = 0)]
    dealer: usize,
    /// Dealing seed; random when omitted
    #[arg(short, long)]
    seed: Option<u64>,
    #[arg(long, value_enum, default_value_t = DeckArg::Short)]
    deck: DeckArg,
    /// Seats played from the keyboard
    #[arg(long = "human", value_delimiter = ',', default_value = "0")]
    humans: Vec<usize>,
    /// Load the round record from a JSON file instead
    #[arg(long, conflicts_with_all = ["players", "dealer", "seed", "deck"])]
    record: Option<PathBuf>,
    /// Run with bots only and log to stderr, no terminal UI
    #[arg(long)]
    headless: bool,
    /// Print the round record as JSON before playing
    #[arg(long)]
    print_record: bool,
    /// Pause after each presented event, in milliseconds
    #[arg(long, default_value_t = 400)]
    delay_ms: u64,
    #[arg(long, value_enum, default_value_t = DifficultyArg::Medium)]
    difficulty: DifficultyArg,
    /// Bot thinking time range in milliseconds, e.g. 200..800
    #[arg(long, value_parser = parse_range, default_value = "0..0")]
    bot_delay_ms: (u64, u64),
    #[arg(short, long)]
    verbose: bool,
}

fn parse_range(s: &str) -> Result<(u64, u64), String> {
    let (lo, hi) = s.split_once("..").ok_or_else(|| format!("expected MIN..MAX, got {s}"))?;
    let lo = lo.trim().parse::<u64>().map_err(|e| e.to_string())?;
    let hi = hi.trim().parse::<u64>().map_err(|e| e.to_string())?;
    Ok((lo, hi.max(lo)))
}

fn bot_profile(args: &Args) -> BotProfile {
    let (min, max) = args.bot_delay_ms;
    BotProfile::for_difficulty(args.difficulty.into()).with_delay_ms(min, max)
}

fn load_record(args: &Args) -> Result<RoundRecord, Box<dyn std::error::Error>> {
    let mut record: RoundRecord = match &args.record {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => {
            let settings = RoundSettings::default()
                .with_players(args.players)
                .with_deck(args.deck.into());
            let seed = args.seed.unwrap_or_else(rand::random);
            let mut record = RoundRecord::new(settings, args.dealer, seed);
            if !args.headless {
                for &seat in &args.humans {
                    record = record.with_seat(seat, SeatKind::Human);
                }
            }
            record
        }
    };
    if args.headless {
        // Seats saved as human are played by bots too.
        record = record.all_bots();
    }
    record.validate()?;
    Ok(record)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "binokel=debug" } else { "binokel=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
}

fn run_headless(
    record: RoundRecord,
    bots: &BotProfile,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller =
        RoundController::new(record, ScriptedHuman::default(), TracingSink)?.with_bots(bots);
    let mut bridge = RoundBridge::new();
    let summary = controller.play(&mut bridge)?;
    println!("{summary}");
    println!("trick winners: {:?}", summary.trick_winners);
    Ok(())
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(
        stdout,
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::event::DisableMouseCapture,
        crossterm::terminal::LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_tui(record: RoundRecord, bots: BotProfile, delay: Duration) -> io::Result<()> {
    let (event_tx, event_rx) = mpsc::channel::<HostEvent>();
    let (decision_tx, decision_rx) = mpsc::channel();

    let round_record = record.clone();
    let worker = thread::spawn(move || {
        let human = ChannelHuman::new(event_tx.clone(), decision_rx);
        let sink = ChannelSink::new(event_tx.clone(), delay);
        let result = RoundController::new(round_record, human, sink)
            .and_then(|controller| controller.with_bots(&bots).play(&mut RoundBridge::new()));
        let _ = event_tx.send(HostEvent::Finished(result.map_err(|e| e.to_string())));
    });

    let mut terminal = setup_terminal()?;
    let mut app = AppState::new(record);
    let tick_rate = Duration::from_millis(100);
    let res = controller::run(&mut terminal, &mut app, &event_rx, &decision_tx, tick_rate);

    // Always attempt to restore terminal
    restore_terminal(terminal)?;
    // Unblocks a worker still waiting on a decision.
    drop(decision_tx);
    drop(event_rx);
    let _ = worker.join();
    res
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let record = load_record(&args)?;
    if args.print_record {
        println!("{}", serde_json::to_string_pretty(&record)?);
    }

    if args.headless {
        init_tracing(args.verbose);
        return run_headless(record, &bot_profile(&args));
    }
    if !io::stdout().is_terminal() {
        println!(
            "binokel TUI requires a real terminal (TTY).\nUse --headless for a bots-only round. Version: {}",
            binokel::VERSION
        );
        return Ok(());
    }
    run_tui(record, bot_profile(&args), Duration::from_millis(args.delay_ms))?;
    Ok(())
}
