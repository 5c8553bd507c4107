//! Command line arguments and user config file handling.

use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{Result, bail};
use clap::Parser;
use clap_complete::Shell;
use itertools::Itertools;
use serde::Deserialize;

use crate::print_error;
use crate::types::CollisionPolicy;

const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

/// Path to the user config file: `$HOME/.config/case-mover.toml`
///
/// Returns `None` if the home directory cannot be determined.
pub static CONFIG_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    let home_dir = dirs::home_dir()?;
    Some(home_dir.join(".config").join(format!("{PROJECT_NAME}.toml")))
});

#[derive(Parser, Debug, Default)]
#[command(
    author,
    version,
    name = "casemover",
    about = "Move folders whose names contain CaseIDs to a destination root"
)]
pub struct Args {
    /// CSV, TSV, or text file with one CaseID per row
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub case_ids_file: Option<PathBuf>,

    /// Root directory to scan for matching folders
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub source_root: Option<PathBuf>,

    /// Directory to move matched folders into
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub dest_root: Option<PathBuf>,

    /// Only report what would be moved without moving anything
    #[arg(short, long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Report file path (default: move_report_<timestamp>.csv in the current directory)
    #[arg(short, long, name = "FILE")]
    pub report: Option<PathBuf>,

    /// Sheet name for spreadsheet CaseID sources
    #[arg(long, name = "SHEET_NAME")]
    pub sheet: Option<String>,

    /// Stop after this many successful live moves
    #[arg(long, name = "MOVES")]
    pub max_moves: Option<usize>,

    /// Stop indexing after this many folders
    #[arg(long, name = "FOLDERS")]
    pub max_folders: Option<usize>,

    /// Process only the first N CaseIDs
    #[arg(long = "caseid-limit", name = "N")]
    pub caseid_limit: Option<usize>,

    /// What to do when the destination name is already taken
    #[arg(long, value_enum, name = "POLICY")]
    pub collision: Option<CollisionPolicy>,

    /// Exclude folders whose name matches the given glob pattern
    #[arg(short = 'e', long, num_args = 1, action = clap::ArgAction::Append, name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Skip pairs already resolved in the given report file
    #[arg(long = "resume-from", name = "REPORT")]
    pub resume_from: Option<PathBuf>,

    /// Match CaseIDs against folder names case-insensitively
    #[arg(short, long)]
    pub ignore_case: bool,

    /// Print debug information
    #[arg(short = 'D', long)]
    pub debug: bool,

    /// Generate shell completion
    #[arg(short = 'l', long, name = "SHELL")]
    pub completion: Option<Shell>,

    /// Print verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Config from the user config file
#[derive(Debug, Default, Deserialize)]
struct CaseMoverConfig {
    #[serde(default)]
    dryrun: bool,
    #[serde(default)]
    yes: bool,
    #[serde(default)]
    debug: bool,
    #[serde(default)]
    verbose: bool,
    #[serde(default)]
    ignore_case: bool,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    collision: Option<CollisionPolicy>,
    #[serde(default)]
    max_moves: Option<usize>,
    #[serde(default)]
    max_folders: Option<usize>,
    #[serde(default)]
    caseid_limit: Option<usize>,
}

/// Wrapper needed for parsing the user config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    casemover: CaseMoverConfig,
}

impl CaseMoverConfig {
    /// Try to read user config from the file if it exists.
    /// Otherwise, fall back to default config.
    fn get_user_config() -> Self {
        CONFIG_PATH
            .as_deref()
            .filter(|path| path.is_file())
            .and_then(|path| {
                fs::read_to_string(path)
                    .map_err(|e| {
                        print_error!("Error reading config file {}: {e}", path.display());
                    })
                    .ok()
            })
            .and_then(|config_string| Self::from_toml_str(&config_string).ok())
            .unwrap_or_default()
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str::<UserConfig>(toml_str)
            .map(|config| config.casemover)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {e}"))
    }
}

/// Final config combined from CLI arguments and user config file.
#[derive(Debug)]
pub struct Config {
    pub case_ids_file: PathBuf,
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    pub dry_run: bool,
    pub yes: bool,
    pub report: Option<PathBuf>,
    pub sheet: Option<String>,
    pub max_moves: Option<usize>,
    pub max_folders: Option<usize>,
    pub caseid_limit: Option<usize>,
    pub collision: CollisionPolicy,
    pub exclude: Vec<String>,
    pub resume_from: Option<PathBuf>,
    pub case_sensitive: bool,
    pub verbose: bool,
    pub debug: bool,
}

impl Config {
    /// Create config from given command line args and user config file.
    ///
    /// # Errors
    /// Returns an error if any required positional argument is missing.
    pub fn from_args(args: Args) -> Result<Self> {
        Self::merge(args, CaseMoverConfig::get_user_config())
    }

    fn merge(args: Args, user_config: CaseMoverConfig) -> Result<Self> {
        let Some(case_ids_file) = args.case_ids_file else {
            bail!("Missing required argument: CASE_IDS_FILE");
        };
        let Some(source_root) = args.source_root else {
            bail!("Missing required argument: SOURCE_ROOT");
        };
        let Some(dest_root) = args.dest_root else {
            bail!("Missing required argument: DEST_ROOT");
        };

        let exclude: Vec<String> = user_config.exclude.into_iter().chain(args.exclude).unique().collect();
        let debug = args.debug || user_config.debug;

        Ok(Self {
            case_ids_file,
            source_root,
            dest_root,
            dry_run: args.dry_run || user_config.dryrun,
            yes: args.yes || user_config.yes,
            report: args.report,
            sheet: args.sheet,
            max_moves: args.max_moves.or(user_config.max_moves),
            max_folders: args.max_folders.or(user_config.max_folders),
            caseid_limit: args.caseid_limit.or(user_config.caseid_limit),
            collision: args.collision.or(user_config.collision).unwrap_or_default(),
            exclude,
            resume_from: args.resume_from,
            case_sensitive: !(args.ignore_case || user_config.ignore_case),
            verbose: args.verbose || user_config.verbose || debug,
            debug,
        })
    }
}
