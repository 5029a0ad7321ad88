// Terminal study tool for the French driving theory exam (code de la route).
// - Loads modules, signs, rules, vocabulary and quiz questions from data/*.json
// - Progress, display settings and the keymap live in a per-user state directory
// - `export` / `import` / `reset` / `stats` work on progress without opening the TUI

mod logging;
mod tui;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use code_route::progress::ProgressStore;
use code_route::view::Totals;
use code_route::{App, DirSource, FileStorage, ThemeKind, EXPORT_FILE_NAME};

use crate::logging::{init_logging, LogConfig};

const STATE_FILE: &str = "state.json";
const LOG_FILE: &str = "code-route.log";
const KEYMAP_FILE: &str = "keymap.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ThemeArg {
    Dark,
    Light,
}

impl From<ThemeArg> for ThemeKind {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Dark => ThemeKind::Dark,
            ThemeArg::Light => ThemeKind::Light,
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "code-route", about = "Bilingual FR/EN driving theory study tool", version)]
struct Cli {
    /// Directory holding modules.json, signs.json, rules.json, vocab.json and
    /// questions.json. Defaults to the nearest `data/` directory upward.
    #[arg(long, env = "CODE_ROUTE_CONTENT", global = true)]
    content: Option<PathBuf>,

    /// Directory for progress, settings, keymap and logs.
    #[arg(long, env = "CODE_ROUTE_STATE", global = true)]
    state: Option<PathBuf>,

    /// Theme for this and later sessions: dark | light
    #[arg(long, value_enum, global = true)]
    theme: Option<ThemeArg>,

    /// Log file, `<state>/code-route.log` by default
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Interactive study session (default)
    Tui,
    /// Write progress as JSON
    Export {
        /// Target file or directory, `./code-route-progress.json` by default
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Replace progress with a previously exported JSON file
    Import { path: PathBuf },
    /// Delete all progress
    Reset {
        #[arg(long, action = ArgAction::SetTrue)]
        yes: bool,
    },
    /// Print learning and quiz totals
    Stats,
}

fn content_dir(cli: &Cli) -> PathBuf {
    if let Some(p) = &cli.content {
        return p.clone();
    }
    // probe upward from the working directory, then next to the executable
    let mut roots: Vec<PathBuf> = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.extend(cwd.ancestors().map(Path::to_path_buf));
    }
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }
    roots
        .into_iter()
        .map(|r| r.join("data"))
        .find(|d| d.join("modules.json").exists())
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn state_dir(cli: &Cli) -> PathBuf {
    if let Some(p) = &cli.state {
        return p.clone();
    }
    dirs::data_dir()
        .map(|d| d.join("code-route"))
        .unwrap_or_else(|| PathBuf::from(".code-route"))
}

fn open_storage(state: &Path) -> Result<FileStorage> {
    FileStorage::open(state.join(STATE_FILE))
        .with_context(|| format!("failed to open state in {}", state.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let state = state_dir(&cli);
    let log_file = cli.log_file.clone().unwrap_or_else(|| state.join(LOG_FILE));
    init_logging(&LogConfig::from_verbosity(cli.verbose, log_file))?;
    tracing::info!(state = %state.display(), "starting");

    match cli.command.clone().unwrap_or(Command::Tui) {
        Command::Tui => run_tui(&cli, &state),
        Command::Export { out } => {
            let store = ProgressStore::open(open_storage(&state)?);
            let target = out.unwrap_or_else(|| PathBuf::from(EXPORT_FILE_NAME));
            let path = if target.is_dir() {
                target.join(EXPORT_FILE_NAME)
            } else {
                target
            };
            store.export_to(&path)?;
            println!("{}", path.display());
            Ok(())
        }
        Command::Import { path } => {
            let mut store = ProgressStore::open(open_storage(&state)?);
            if let Err(err) = store.import_from(&path) {
                eprintln!("{}", err.user_message());
                return Err(err).with_context(|| format!("import of {} failed", path.display()));
            }
            println!("Imported {} entries.", store.map().len());
            Ok(())
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("refusing to reset progress without --yes");
            }
            let mut store = ProgressStore::open(open_storage(&state)?);
            store.reset()?;
            println!("All progress reset.");
            Ok(())
        }
        Command::Stats => {
            let store = ProgressStore::open(open_storage(&state)?);
            let totals = Totals::from_progress(store.map());
            println!("Items marked learned  {}", totals.learned_items);
            println!("Total review clicks   {}", totals.total_reviews);
            println!("Quiz answered         {}", totals.quiz_answered());
            println!("Quiz accuracy         {}%", totals.accuracy_percent());
            Ok(())
        }
    }
}

fn run_tui(cli: &Cli, state: &Path) -> Result<()> {
    let content = content_dir(cli);
    let mut app = App::load(&DirSource::new(&content), open_storage(state)?).with_context(|| {
        format!(
            "failed to load study content from {} (use --content or CODE_ROUTE_CONTENT)",
            content.display()
        )
    })?;
    if let Some(theme) = cli.theme {
        app.set_theme(theme.into())?;
    }

    let keymap_paths = [state.join(KEYMAP_FILE), PathBuf::from(KEYMAP_FILE)];
    let keymap = tui::keymap::load_keymap(&keymap_paths).unwrap_or_else(|err| {
        tracing::warn!("{err:#}, using default keys");
        tui::keymap::default_keymap()
    });
    let export_dir = std::env::current_dir().unwrap_or_else(|_| state.to_path_buf());

    tui::Tui::new(app, keymap, export_dir).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_to_tui() {
        let cli = Cli::try_parse_from(["code-route"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn cli_parses_subcommands_and_globals() {
        let cli = Cli::try_parse_from([
            "code-route",
            "export",
            "--out",
            "/tmp/p.json",
            "--state",
            "/tmp/s",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.state, Some(PathBuf::from("/tmp/s")));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Some(Command::Export { out: Some(_) })));

        let cli = Cli::try_parse_from(["code-route", "--theme", "light", "reset", "--yes"]).unwrap();
        assert_eq!(cli.theme, Some(ThemeArg::Light));
        assert!(matches!(cli.command, Some(Command::Reset { yes: true })));
    }

    #[test]
    fn explicit_content_dir_wins() {
        let cli = Cli::try_parse_from(["code-route", "--content", "/srv/data"]).unwrap();
        assert_eq!(content_dir(&cli), PathBuf::from("/srv/data"));
    }
}
