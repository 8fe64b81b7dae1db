//! Command-line interface definitions.

use crate::calendar::DateKey;
use crate::constants::{APP_DESCRIPTION, APP_NAME, LOG_FORMAT_JSON, LOG_FORMAT_TEXT, PSALMS_COUNT};
use crate::journal::Mood;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// A daily Psalm devotional with a private mood and prayer journal
#[derive(Parser, Debug)]
#[command(name = APP_NAME, about = APP_DESCRIPTION)]
#[command(author, version, long_about = None)]
pub struct CliArgs {
    /// Log output format
    #[arg(long, global = true, default_value = LOG_FORMAT_TEXT, value_parser = [LOG_FORMAT_TEXT, LOG_FORMAT_JSON])]
    pub log_format: String,

    /// Print debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Manage the PIN that guards the journal
    Pin {
        #[command(subcommand)]
        action: PinCommand,
    },

    /// Enter the PIN for this session
    Unlock,

    /// Lock the journal again
    Lock,

    /// Today's Psalm, mood, and streak
    Today,

    /// Show what a step of the devotional displays (0-152)
    Step { index: usize },

    /// Record how you feel (mania, mixed, depressive, baseline, not_sure)
    Mood {
        mood: Mood,

        /// Day to record (YYYY-MM-DD or YYYYMMDD), defaults to today
        #[arg(short = 'd', long)]
        date: Option<DateKey>,
    },

    /// Write freely; reads stdin when no text is given
    Vent {
        text: Option<String>,

        /// Day to record (YYYY-MM-DD or YYYYMMDD), defaults to today
        #[arg(short = 'd', long)]
        date: Option<DateKey>,

        /// Revise the day's vent text in $DEVOTIONS_EDITOR
        #[arg(short = 'e', long, conflicts_with = "text")]
        editor: bool,
    },

    /// Read a Psalm (defaults to today's) and your response to it
    Psalm {
        #[arg(value_parser = clap::value_parser!(u16).range(1..=PSALMS_COUNT as i64))]
        number: Option<u16>,

        /// Print without terminal styling
        #[arg(long)]
        plain: bool,
    },

    /// Record a prayer or reflection for a Psalm
    Respond {
        #[arg(value_parser = clap::value_parser!(u16).range(1..=PSALMS_COUNT as i64))]
        number: u16,

        #[arg(short = 'p', long)]
        prayer: Option<String>,

        #[arg(short = 'r', long)]
        reflection: Option<String>,
    },

    /// List journal entries, newest first
    Journal,

    /// Consecutive days with an entry, ending today
    Streak,

    /// Write every journal entry to a JSON file
    Export {
        /// Directory for the export file, defaults to the current directory
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Merge entries from an export file
    Import { file: PathBuf },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum PinCommand {
    /// Set the PIN, or replace it while unlocked
    Set,
}

impl Commands {
    /// Whether the command may run while the journal is locked.
    pub fn runs_locked(&self) -> bool {
        matches!(
            self,
            Commands::Pin { .. } | Commands::Unlock | Commands::Lock
        )
    }
}

impl CliArgs {
    pub fn is_json_logging(&self) -> bool {
        self.log_format == LOG_FORMAT_JSON
    }
}
