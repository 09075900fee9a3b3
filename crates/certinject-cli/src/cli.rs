use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use certinject_core::DEFAULT_EXPIRE_PERIOD_SECS;

#[derive(Parser, Debug)]
#[command(
    name = "certinject",
    author,
    version,
    about = "Inject certificates into a trust store and expire stale entries"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "CERTINJECT_STORE_ROOT",
        help = "Directory holding the store hierarchy (default: ~/.certinject/store)"
    )]
    pub store_root: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        default_value = "system",
        help = "Physical store scope: current-user, system, enterprise, group-policy"
    )]
    pub physical_store: String,
    #[arg(
        long,
        global = true,
        default_value = "Root",
        help = "Logical store to file certificates under (Root, CA, Disallowed, ...)"
    )]
    pub logical_store: String,
    #[arg(short, long, action = ArgAction::Count, global = true, help = "Increase logging (-vv reaches trace)")]
    pub verbose: u8,
    #[arg(short, long, global = true, help = "Suppress human output")]
    pub quiet: bool,
    #[arg(long, global = true, help = "Emit JSON output")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the store container for the selected scope and logical store
    Init,
    /// Inject a DER-encoded certificate into the store
    Inject {
        /// Path to the DER-encoded certificate
        cert: PathBuf,
    },
    /// Delete expired entries previously injected by this tool
    Clean {
        #[arg(
            long,
            default_value_t = DEFAULT_EXPIRE_PERIOD_SECS,
            help = "Age in seconds past which an injected entry is deleted"
        )]
        expire_period: u64,
    },
}
