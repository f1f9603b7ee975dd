use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use forest_atlas::{AppState, AtlasConfig, Basemap, ui};
use geo::Coord;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    fs::File,
    io::{self, Stdout},
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Forest cover of Indian states on a terminal map", long_about = None)]
struct Cli {
    /// Directory holding the feature and dataset files.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// GeoJSON FeatureCollection of region points.
    #[arg(long, default_value = "features.json")]
    features: String,
    /// Forest cover time series per region.
    #[arg(long, default_value = "data.json")]
    dataset: String,
    #[arg(long, default_value_t = 79.035645, allow_negative_numbers = true)]
    center_lon: f64,
    #[arg(long, default_value_t = 23.0, allow_negative_numbers = true)]
    center_lat: f64,
    #[arg(long, default_value_t = 4.8)]
    zoom: f64,
    #[arg(long, value_enum, default_value_t = Basemap::High)]
    basemap: Basemap,
    /// Refuse to start when a feature has no dataset record.
    #[arg(long)]
    strict: bool,
    /// Write logs here; the terminal belongs to the map. Filter with RUST_LOG.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl From<Cli> for AtlasConfig {
    fn from(cli: Cli) -> Self {
        Self {
            data_dir: cli.data_dir,
            features_file: cli.features,
            dataset_file: cli.dataset,
            center: Coord { x: cli.center_lon, y: cli.center_lat },
            zoom: cli.zoom,
            basemap: cli.basemap,
            strict: cli.strict,
            log_file: cli.log_file,
        }
    }
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_ansi(false).compact();
    match log_file {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("cannot create log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(io::sink).init(),
    }
    Ok(())
}

fn main() -> Result<()> {
    let config = AtlasConfig::from(Cli::parse()).validate()?;
    init_tracing(config.log_file.as_deref())?;

    // Data errors end the program before the terminal switches to the alternate screen
    let mut state = AppState::new(&config)
        .with_context(|| format!("cannot load map data from {}", config.data_dir.display()))?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut state);
    state.unmount();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    info!("bye");
    result
}

fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, state: &mut AppState) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, state))?;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) => {
                    if state.handle_key(code) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => state.handle_mouse(mouse),
                // the next draw re-attaches the map to the new area
                Event::Resize(..) => {}
                _ => {}
            }
        }
    }
}
