use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ecfanctl")]
#[command(about = "Read and rewrite the fan curve tables of an ITE embedded controller")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Run against an in-memory simulated EC instead of real hardware
    #[arg(long, global = true)]
    pub simulate: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show fan speeds, duty targets and the active curve point
    Status,

    /// Print the ten curve/timing/threshold tables stored in the EC
    Tables,

    /// Show EC chip identification and firmware version
    Info,

    /// Dump the EC's current tables to a JSON config file
    Export {
        /// Destination file
        path: PathBuf,
    },

    /// Write the tables from a JSON config file to the EC
    Apply {
        /// Config file produced by 'export' (or edited by hand)
        path: PathBuf,

        /// Re-read the tables afterwards and report any mismatch
        #[arg(long)]
        verify: bool,

        /// Also write the raw duty-cycle registers (DCR4/DCR5) from the
        /// target curve value; normally the EC recomputes these itself
        #[arg(long)]
        raw_duty: bool,
    },

    /// Monitor fan speeds in real time
    Monitor {
        /// Refresh interval in seconds
        #[arg(short, long, default_value = "1")]
        interval: u64,
    },
}
