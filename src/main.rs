//! Invasori Infinito - terminal entry point

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use invasori::assets::AssetLoader;
use invasori::consts::{GAME_TITLE, SCENE_BATTLE, SCENE_DODGER, SCENE_INTRO, SCENE_MENU};
use invasori::context::SceneContext;
use invasori::game::{Game, RewindControl};
use invasori::input::TerminalEvents;
use invasori::renderer::TerminalSurface;
use invasori::renderer::terminal::TerminalSession;
use invasori::scene::{BattleScene, DodgerScene, IntroScene, MenuScene, SceneManager};
use invasori::settings::SETTINGS_FILE;
use invasori::{Difficulty, GameError, HighScoreFile, Settings};

/// Used when neither the settings nor the command line name a log file
const DEFAULT_LOG_FILE: &str = "invasori.log";

#[derive(Parser)]
#[command(name = "invasori")]
#[command(about = "Invasori Infinito: a Space Invaders style shooter with time rewind", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Settings file (JSON)
    #[arg(long, default_value = SETTINGS_FILE)]
    settings: PathBuf,

    /// Target ticks per second (0 runs uncapped)
    #[arg(long)]
    tick_rate: Option<u32>,

    /// Seconds of history kept for rewind (0 disables it)
    #[arg(long)]
    rewind_seconds: Option<u32>,

    /// Fixed RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Write the log here instead of the default file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Show the FPS counter
    #[arg(long)]
    fps: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play Drop Dodger on its own
    Dodger {
        /// Plain character-grid version
        #[arg(long)]
        tty: bool,

        /// easy, medium or hard
        #[arg(long, value_parser = parse_difficulty)]
        difficulty: Option<Difficulty>,
    },
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    Difficulty::from_str(s).ok_or_else(|| format!("unknown difficulty '{}'", s))
}

fn init_logging(path: &Path) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    // The terminal UI owns stdout/stderr, so logs go to a file
    match std::fs::File::create(path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => eprintln!("Cannot open log file {}: {}", path.display(), e),
    }
    builder.init();
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(rate) = cli.tick_rate {
        settings.tick_rate = rate;
    }
    if let Some(seconds) = cli.rewind_seconds {
        settings.rewind_seconds = seconds;
    }
    if cli.seed.is_some() {
        settings.seed = cli.seed;
    }
    if cli.log_file.is_some() {
        settings.log_file = cli.log_file.clone();
    }
    if cli.fps {
        settings.show_fps = true;
    }
    if let Some(Commands::Dodger {
        difficulty: Some(difficulty),
        ..
    }) = cli.command
    {
        settings.difficulty = difficulty;
    }
}

fn run_game(settings: Settings, first_scene: &str, standalone: bool) -> Result<(), GameError> {
    let mut manager = SceneManager::new(settings.rewind_capacity());
    manager.register(SCENE_MENU, Box::new(MenuScene::new()))?;
    manager.register(SCENE_INTRO, Box::new(IntroScene::new()))?;
    manager.register(SCENE_BATTLE, Box::new(BattleScene::new()))?;
    let dodger = if standalone {
        DodgerScene::standalone()
    } else {
        DodgerScene::new()
    };
    manager.register(SCENE_DODGER, Box::new(dodger))?;

    let assets = AssetLoader::new(&settings.asset_root);
    let ctx = SceneContext::new(settings, assets);

    let session = TerminalSession::start()?;
    let events = TerminalEvents::from_terminal(session.key_release)?;
    let control = RewindControl::for_terminal(session.key_release);
    let mut game = Game::new(manager, ctx, events, TerminalSurface::stdout()).with_control(control);
    game.start(first_scene)?;
    let result = game.run();
    drop(session);
    result
}

fn run(cli: Cli, settings: Settings) -> Result<(), GameError> {
    match cli.command {
        Some(Commands::Dodger { tty: true, .. }) => {
            let seed = settings.seed.unwrap_or_else(invasori::clock::time_seed);
            let high_scores = HighScoreFile::new(&settings.high_score_file);
            let score = invasori::dodger::tty::run(settings.difficulty, seed, &high_scores)?;
            println!("Final Score: {}", score);
            println!("High Score: {}", high_scores.load());
            Ok(())
        }
        Some(Commands::Dodger { tty: false, .. }) => run_game(settings, SCENE_DODGER, true),
        None => run_game(settings, SCENE_MENU, false),
    }
}

fn main() {
    let cli = Cli::parse();

    let loaded = Settings::load(&cli.settings);
    let mut settings = match &loaded {
        Ok(settings) => settings.clone(),
        Err(_) => Settings::default(),
    };
    apply_overrides(&mut settings, &cli);

    let log_path = settings
        .log_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    init_logging(&log_path);
    log::info!("{} starting", GAME_TITLE);
    if let Err(e) = loaded {
        log::warn!("Ignoring settings at {}: {}", cli.settings.display(), e);
    }

    if let Err(e) = run(cli, settings) {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
    log::info!("{} exited cleanly", GAME_TITLE);
}
