use std::fs::File;
use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::{info, LevelFilter};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use simplelog::{Config, WriteLogger};

use glance::app::{collect_files, run, App};
use glance::event_source::TerminalEventSource;
use glance::Settings;

#[derive(Parser)]
#[command(name = "glance", version, about = "Terminal media viewer")]
struct Args {
    /// Image file or directory to open
    path: PathBuf,

    /// Start in slideshow mode
    #[arg(short, long)]
    slideshow: bool,

    /// Right-to-left reading mode
    #[arg(long)]
    manga: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    WriteLogger::init(
        level,
        Config::default(),
        File::create("glance.log").context("creating log file")?,
    )
    .context("initializing logger")?;

    let (files, start_index) = collect_files(&args.path)?;
    if files.is_empty() {
        bail!("no supported media found at {}", args.path.display());
    }
    info!("opening {} files, starting at {}", files.len(), start_index);

    let mut settings = Settings::load();
    if args.manga {
        settings.manga_mode = true;
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(settings, files, start_index);
    let result = run(&mut app, &mut terminal, &mut TerminalEventSource, args.slideshow);

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}
