//! Command-line argument parsing for the replay tool
//!
//! Supports:
//! - Replaying a script file, or keys given inline
//! - Overriding the platform, chord timeout and keymap
//! - Text or JSON transcripts

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::InteractionConfig;
use crate::keymap::Platform;

/// Replay keystrokes through the shortcut pipeline
#[derive(Parser, Debug)]
#[command(
    name = "trackline",
    version,
    about = "Replay keystrokes through the shortcut pipeline"
)]
pub struct CliArgs {
    /// Replay script (one command per line)
    #[arg(value_name = "SCRIPT", conflicts_with = "keys")]
    pub script: Option<PathBuf>,

    /// Keys to press, space separated (e.g. "c g")
    #[arg(short, long, value_name = "KEYS")]
    pub keys: Option<String>,

    /// Keymap file merged over the defaults
    #[arg(long, value_name = "FILE")]
    pub keymap: Option<PathBuf>,

    /// Modifier roles to use instead of the detected platform
    #[arg(long, value_enum)]
    pub platform: Option<PlatformArg>,

    /// Chord timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Milliseconds between keys on one script line
    #[arg(long, value_name = "MS", default_value_t = 100)]
    pub gap: u64,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print the active shortcuts and exit
    #[arg(long)]
    pub list: bool,

    /// Persist --platform, --timeout and --keymap to the config file and exit
    #[arg(long)]
    pub save_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlatformArg {
    Mac,
    Other,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Mac => Platform::Mac,
            PlatformArg::Other => Platform::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Where the replay input comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaySource {
    Script(PathBuf),
    Inline(String),
    None,
}

/// Settings derived from CLI arguments layered over the config file
#[derive(Debug, Clone)]
pub struct ReplaySettings {
    pub source: ReplaySource,
    pub platform: Platform,
    pub timeout: Duration,
    pub gap: Duration,
    pub keymap: Option<PathBuf>,
    pub format: OutputFormat,
    pub list: bool,
    /// Config to write back, when `--save-config` was given
    pub save: Option<InteractionConfig>,
}

impl CliArgs {
    /// Apply CLI overrides on top of the persisted config
    pub fn into_settings(self, config: &InteractionConfig) -> ReplaySettings {
        let save = self.save_config.then(|| InteractionConfig {
            chord_timeout_ms: self.timeout.unwrap_or(config.chord_timeout_ms),
            platform: self.platform.map(Platform::from).or(config.platform),
            keymap: self.keymap.clone().or_else(|| config.keymap.clone()),
        });
        let source = match (self.script, self.keys) {
            (Some(path), _) => ReplaySource::Script(path),
            (None, Some(keys)) => ReplaySource::Inline(keys),
            (None, None) => ReplaySource::None,
        };

        ReplaySettings {
            source,
            platform: self
                .platform
                .map(Platform::from)
                .unwrap_or_else(|| config.platform()),
            timeout: self
                .timeout
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.chord_timeout()),
            gap: Duration::from_millis(self.gap),
            keymap: self.keymap.or_else(|| config.keymap_path()),
            format: self.format,
            list: self.list,
            save,
        }
    }
}
