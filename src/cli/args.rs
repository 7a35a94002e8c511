//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::ROOT_ID;

/// Form tree editor: build, relabel, restructure and prune question trees
#[derive(Parser, Debug)]
#[command(name = "formtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file (default: ./.formtree.toml if present)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the form tree
    Show {
        /// Form id
        form: String,
        /// Show node ids next to labels
        #[arg(short, long)]
        ids: bool,
    },

    /// Print the form tree as JSON
    Export {
        /// Form id
        form: String,
    },

    /// Replace the form tree with a JSON forest from a file
    Import {
        /// Form id
        form: String,
        /// JSON file holding `[{"id": "root", "label": ..., "children": [...]}]`
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Save the built-in sample questionnaire as the form tree
    Seed {
        /// Form id
        form: String,
        /// Overwrite an existing form tree
        #[arg(short, long)]
        force: bool,
    },

    /// Append a child node
    Add {
        /// Form id
        form: String,
        /// Parent node id
        #[arg(short, long, default_value = ROOT_ID)]
        parent: String,
        /// Label of the new node
        label: String,
    },

    /// Change the label of a node
    Rename {
        /// Form id
        form: String,
        /// Node id
        id: String,
        /// New label
        label: String,
    },

    /// Show the nodes selected by toggling the given ids with all their children
    Select {
        /// Form id
        form: String,
        /// Toggled node ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Delete nodes; their children move up into the freed slot
    Delete {
        /// Form id
        form: String,
        /// Node ids to delete
        #[arg(required = true)]
        ids: Vec<String>,
        /// Also delete every descendant of the given nodes
        #[arg(long)]
        children: bool,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
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
    /// Show merged config
    Show,

    /// Show config paths
    Path,
}
