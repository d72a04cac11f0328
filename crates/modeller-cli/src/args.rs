//! Command-line argument definitions for the Modeller CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Global arguments select the configuration file and the
//! logging verbosity; each [`Command`] names its own inputs and output.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for the Modeller diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile catalogue elements and their relationships into one diagram
    Compile {
        /// Path to the catalogue JSON file
        #[arg(short = 'k', long)]
        catalogue: String,

        /// Element ids to include (all elements when omitted)
        #[arg(short, long = "element", value_delimiter = ',')]
        elements: Vec<u64>,

        /// Diagram title
        #[arg(long, default_value = "Diagram")]
        title: String,

        /// Lay the diagram out left to right
        #[arg(long)]
        left_to_right: bool,

        /// Keep only elements of this enterprise
        #[arg(long)]
        enterprise: Option<String>,

        #[arg(long, value_enum, default_value_t = Emit::Markup)]
        emit: Emit,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Generate the single-element diagram of one element
    Element {
        /// Path to the catalogue JSON file
        #[arg(short = 'k', long)]
        catalogue: String,

        /// Element id
        id: u64,

        #[arg(long, value_enum, default_value_t = Emit::Markup)]
        emit: Emit,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Encode a markup file into a rendering token
    Encode {
        /// Path to the markup file
        input: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Decode a rendering token back into markup
    Decode {
        /// The encoded token
        token: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Propose standard relationships missing from the catalogue (JSON)
    DeriveRelationships {
        /// Path to the catalogue JSON file
        #[arg(short = 'k', long)]
        catalogue: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// What a compile writes out.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emit {
    /// The markup document
    Markup,
    /// The encoded token
    Token,
    /// The rendering service URL
    Url,
}
