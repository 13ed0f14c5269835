//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum, ValueHint};

/// Cascading configuration: merge ordered directories x file names into one tree
#[derive(Parser, Debug)]
#[command(name = "cascade")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Project directory holding .cascade.toml and relative search dirs (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    /// Search directory, repeatable; replaces the configured list
    #[arg(short, long = "dir", global = true, value_hint = ValueHint::DirPath)]
    pub dirs: Vec<PathBuf>,

    /// File name tried in every directory, repeatable; replaces the configured list
    #[arg(short, long = "file", global = true)]
    pub files: Vec<String>,

    /// Extra file merged after the cascade, repeatable
    #[arg(short, long = "push", global = true, value_hint = ValueHint::FilePath)]
    pub push: Vec<PathBuf>,

    /// Hostname substituted for {hostname} in file names
    #[arg(long, global = true, env = "CASCADE_HOSTNAME")]
    pub hostname: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the merged configuration
    Show {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Toml)]
        format: OutputFormat,
    },

    /// Print one value by dotted key (exit 69 if not set)
    Get {
        /// Dotted key, e.g. database.host
        key: String,
    },

    /// Exit 0 if the key exists, 1 otherwise
    Has {
        /// Dotted key
        key: String,
    },

    /// List merged files in cascade order
    Files,

    /// Show the merged configuration as tree
    Tree,

    /// Manage cascade's own settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,

    /// Print a settings template
    Template,

    /// Show settings file paths
    Path,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Toml,
    Json,
}
