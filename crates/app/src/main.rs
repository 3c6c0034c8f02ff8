use std::fmt;
use std::rc::Rc;

use gefen_core::model::GameSettings;
use services::narration::PlaybackInbox;
use services::{AppServices, Clock, ContentLibrary};

mod catalog;
mod play;
mod terminal;

use terminal::{PrintedAudio, PrintedEffects, PrintedSpeech, TerminalVoices};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidSeed { raw: String },
    InvalidSettings { path: String, reason: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::InvalidSettings { path, reason } => {
                write!(f, "cannot load settings from {path}: {reason}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play  [--db <sqlite_url>] [--seed <n>] [--settings <file.json>]");
    eprintln!("                            [--voice-lang <tag>] [--no-voice]");
    eprintln!("  cargo run -p app -- stats [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- reset [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:gefen.sqlite3");
    eprintln!("  --voice-lang he-IL");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  GEFEN_DB_URL, GEFEN_SEED, GEFEN_SETTINGS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Stats,
    Reset,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "stats" => Some(Self::Stats),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    seed: Option<u64>,
    settings_path: Option<String>,
    voice_lang: Option<String>,
    no_voice: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("GEFEN_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://gefen.sqlite3".into(), normalize_sqlite_url);
        let mut seed = match std::env::var("GEFEN_SEED") {
            Ok(raw) => Some(parse_seed(raw)?),
            Err(_) => None,
        };
        let mut settings_path = std::env::var("GEFEN_SETTINGS").ok();
        let mut voice_lang = None;
        let mut no_voice = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--seed" => seed = Some(parse_seed(require_value(args, "--seed")?)?),
                "--settings" => settings_path = Some(require_value(args, "--settings")?),
                "--voice-lang" => voice_lang = Some(require_value(args, "--voice-lang")?),
                "--no-voice" => no_voice = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            seed,
            settings_path,
            voice_lang,
            no_voice,
        })
    }

    fn settings(&self) -> Result<GameSettings, ArgsError> {
        let mut settings = match &self.settings_path {
            Some(path) => load_settings(path)?,
            None => GameSettings::default(),
        };
        if let Some(tag) = &self.voice_lang {
            let mut parts = tag.splitn(2, ['-', '_']);
            settings.narration.language = parts.next().unwrap_or_default().to_owned();
            settings.narration.region = parts.next().unwrap_or_default().to_owned();
        }
        Ok(settings)
    }
}

fn parse_seed(raw: String) -> Result<u64, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidSeed { raw })
}

fn load_settings(path: &str) -> Result<GameSettings, ArgsError> {
    let invalid = |reason: String| ArgsError::InvalidSettings {
        path: path.to_owned(),
        reason,
    };
    let raw = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| invalid(e.to_string()))
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let settings = parsed.settings()?;

    prepare_sqlite_file(&parsed.db_url)?;
    let app = AppServices::new_sqlite(&parsed.db_url, Clock::default_clock(), settings).await?;

    match cmd {
        Command::Stats => {
            play::print_stats(&app.progress()).await;
            Ok(())
        }
        Command::Reset => {
            let removed = app.progress().reset_all().await;
            println!("progress cleared ({removed} records)");
            Ok(())
        }
        Command::Play => {
            let inbox = PlaybackInbox::new();
            let lang = (!parsed.no_voice).then(|| app.settings().narration.language_tag());
            let narrator = app
                .narrator(
                    &TerminalVoices::new(lang),
                    Box::new(PrintedSpeech::new(inbox.clone())),
                    Box::new(PrintedAudio::new(inbox.clone())),
                    inbox,
                )
                .await?;
            if narrator.is_fallback() {
                println!("no local voice found, speaking through the online service");
            }

            let library = ContentLibrary::new(catalog::vehicles()?)
                .with_brands(catalog::brands()?)
                .with_parts(catalog::parts()?);
            let mut game = app
                .game_loop(narrator, library)?
                .with_effects(Rc::new(PrintedEffects));
            if let Some(seed) = parsed.seed {
                game = game.with_seed(seed);
            }
            play::run(game).await?;
            Ok(())
        }
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
