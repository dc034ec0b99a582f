//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Arena-backed trees: render, walk and query indented outlines
#[derive(Parser, Debug)]
#[command(name = "arbor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Directory holding a local .arbor.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the outline as a tree
    Show {
        /// Outline file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Print nodes in traversal order
    Walk {
        /// Outline file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// pre-order, post-order or breadth-first (default from config)
        #[arg(short, long, env = "ARBOR_ORDER")]
        order: Option<String>,
        /// Start at the first node with this label instead of every root
        #[arg(short, long)]
        from: Option<String>,
    },

    /// Print the ancestors of a node, nearest first
    Ancestors {
        /// Outline file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Node label
        label: String,
    },

    /// Print the siblings of a node
    Siblings {
        /// Outline file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Node label
        label: String,
    },

    /// Check whether a label exists below a node (exit 1 if not)
    Contains {
        /// Outline file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Label to search for
        label: String,
        /// Restrict the search to the subtree of this label
        #[arg(short, long)]
        under: Option<String>,
    },

    /// Show all branches linearly, leaf first
    Branches {
        /// Outline file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Show node, leaf and depth counts
    Stats {
        /// Outline file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Manage settings
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
    /// Print a template config file
    Template,
    /// Print config file locations
    Path,
}
