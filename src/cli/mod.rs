//! CLI module for permitbot
//!
//! Provides the command-line front end using clap. Each invocation acts on
//! behalf of the employee bound to `--session`.

pub mod commands;
pub mod context;
pub mod render;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::schemas::{Phase, RoleFilter};

/// Permitbot - work permit lifecycle and PPE evidence checks
#[derive(Parser, Debug)]
#[command(name = "permitbot")]
#[command(version)]
#[command(about = "Work permit lifecycle with photo evidence and PPE compliance checks")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Override the working directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Use this data directory instead of searching for .permitbot
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Session identifier the login is bound to
    #[arg(long, global = true, env = "PERMITBOT_SESSION", default_value = "local")]
    pub session: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory with a default config.json
    Init {
        /// Overwrite an existing config.json
        #[arg(long)]
        force: bool,
    },

    /// Load employees and permits from a JSON file
    Import {
        /// File with `employees` and `permits` arrays
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Log in with an access token
    Login {
        /// Employee access token
        token: String,
    },

    /// Log out of the current session
    Logout,

    /// Show the logged-in employee
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List permits where you are supervisor or executor
    List {
        /// Only permits where you hold this role (supervisor, executor)
        #[arg(long)]
        role: Option<RoleFilter>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show details of a permit
    Show {
        /// Permit number
        number: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Upload evidence photos and submit the permit for approval
    Submit {
        /// Permit number
        number: String,

        /// Evidence phase (start, completion)
        #[arg(long)]
        phase: Phase,

        /// Photo file handles, relative to the file root
        #[arg(required = true)]
        handles: Vec<String>,
    },

    /// Approve submitted evidence
    Approve {
        /// Permit number
        number: String,

        /// Evidence phase (start, completion)
        #[arg(long)]
        phase: Phase,
    },

    /// Reject submitted evidence
    Reject {
        /// Permit number
        number: String,

        /// Evidence phase (start, completion)
        #[arg(long)]
        phase: Phase,
    },

    /// List evidence photos of a phase
    Photos {
        /// Permit number
        number: String,

        /// Evidence phase (start, completion)
        #[arg(long)]
        phase: Phase,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check PPE compliance on a phase's photos
    Analyze {
        /// Permit number
        number: String,

        /// Evidence phase (start, completion)
        #[arg(long)]
        phase: Phase,

        /// Write annotated copies of the photos to the annotations directory
        #[arg(long)]
        annotate: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
