//! Mealgate CLI library: exposed for integration tests

pub mod commands;
pub mod host;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mealgate")]
#[command(about = "Trial and subscription gate for the meal-planning client", long_about = None)]
#[command(version = mealgate_core::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Key/value store file (default: ~/.config/mealgate/store.json)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize .mealgate.toml configuration
    Init {
        /// Directory to initialize (default: current directory)
        path: Option<PathBuf>,
    },

    /// Record the signed-in user
    Login {
        /// User id used to namespace lifecycle keys
        #[arg(long)]
        uid: String,

        #[arg(long, default_value = "")]
        email: String,

        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, default_value = "user")]
        role: String,
    },

    /// Forget the signed-in user (lifecycle keys are kept)
    Logout,

    /// Show trial, subscription and gate state
    Status {
        /// Path the gate is evaluated for
        #[arg(long, default_value = "/")]
        path: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Start or reset the free trial
    Trial {
        #[command(subcommand)]
        action: commands::trial::TrialAction,
    },

    /// Grant access for a number of days
    Activate {
        /// Number of days to add
        #[arg(long)]
        days: u32,

        #[arg(long)]
        plan_id: Option<String>,

        #[arg(long)]
        plan_name: Option<String>,

        /// Payment reference to attach
        #[arg(long)]
        reference: Option<String>,
    },

    /// Verify a payment reference with the backend
    Verify {
        /// Reference returned by the payment provider
        reference: String,
    },

    /// Mount the gate on a path and exit non-zero if it blocks
    Check {
        /// Path to check
        path: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Keep a gate mounted and report every refresh (Ctrl-C to stop)
    Watch {
        /// Initial path; type further paths on stdin to navigate
        #[arg(long, default_value = "/")]
        path: String,
    },
}
