use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};
use stratagem_hero::{
    app::{self, App},
    app_dirs::AppDirs,
    catalog::Catalog,
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore},
    direction::{format_arrows, format_letters},
    drill::Drill,
    effects::BellEffects,
    evaluation::{EvaluationAdapter, EvaluationTask, LocalEvaluator},
    logging,
    runtime::{CrosstermEventSource, FixedTicker, Runner},
};

const TICK_RATE_MS: u64 = 50;

/// stratagem input drill for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Reproduce directional stratagem codes against the clock. Live accuracy and throughput, per-code best times, and a graded report when the session ends."
)]
pub struct Cli {
    /// comma-separated catalog ids to practice (see --list)
    #[clap(long, value_delimiter = ',')]
    select: Option<Vec<String>>,

    /// practice randomly generated codes instead of catalog entries
    #[clap(long)]
    random: bool,

    /// how long a completed code stays on screen, in milliseconds
    #[clap(long)]
    hold_ms: Option<u64>,

    /// never contact the remote evaluator
    #[clap(long)]
    offline: bool,

    /// print the catalog and exit
    #[clap(long)]
    list: bool,

    /// write the effective settings to the config file and exit
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Command line flags take precedence over the config file
    fn apply(&self, config: &mut Config) {
        if let Some(ids) = &self.select {
            config.selected = Some(ids.clone());
        }
        if self.random {
            config.random_mode = true;
        }
        if let Some(hold_ms) = self.hold_ms {
            config.hold_ms = hold_ms;
        }
        if self.offline {
            config.offline = true;
        }
    }
}

fn print_catalog(catalog: &Catalog) {
    for s in catalog.entries() {
        println!(
            "{:<22} {:<30} {:<10} {:<10} {}",
            s.id,
            s.name,
            s.category.to_string(),
            format_letters(&s.code),
            format_arrows(&s.code)
        );
    }
}

/// Ask for press/repeat/release reporting so a held arrow key is one input.
/// Terminals without the protocol only send presses and auto-repeats.
fn key_report_flags() -> KeyboardEnhancementFlags {
    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
}

fn build_app(config: &Config, catalog: Catalog) -> Result<App, Box<dyn Error>> {
    let selection = config.selection(&catalog)?;
    let drill = Drill::with_parts(Vec::new(), SystemClock, BellEffects)
        .with_hold_ms(config.hold_ms)
        .with_random_mode(config.random_mode);

    let local = LocalEvaluator::with_delay(Duration::from_millis(config.offline_delay_ms));
    let adapter = if config.offline {
        EvaluationAdapter::offline(local)
    } else {
        EvaluationAdapter::from_config(&config.evaluator, local)
    };

    Ok(App::new(catalog, selection, drill, EvaluationTask::new(adapter)))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init(&AppDirs::log_path())?;

    let catalog = Catalog::builtin();
    if cli.list {
        print_catalog(&catalog);
        return Ok(());
    }

    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply(&mut config);

    if let Err(e) = config.selection(&catalog) {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::InvalidValue, e).exit();
    }

    if cli.save_config {
        store.save(&config)?;
        println!("saved {}", store.path().display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = build_app(&config, catalog)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // query before the event reader thread owns stdin
    let enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if enhanced {
        execute!(stdout, PushKeyboardEnhancementFlags(key_report_flags()))?;
    }
    tracing::info!(enhanced, "keyboard event reporting");

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app::run(&mut terminal, &mut app, &runner);

    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    Ok(())
}
