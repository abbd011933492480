use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "execdiff")]
#[command(about = "See which files and packages an AI assistant or a command changed")]
#[command(version)]
pub struct Cli {
    /// Show debug logging and list skipped items
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Snapshot, wait for Enter, snapshot again and record what changed
    Trace(WorkspaceArgs),

    /// Take the "before" snapshot and leave the trace open
    Start(WorkspaceArgs),

    /// Close a trace opened with `start` and record what changed
    Stop(WorkspaceArgs),

    /// Trace a single command
    Run(RunArgs),

    /// Display the most recently recorded trace
    Summary(SummaryArgs),

    /// List recorded traces
    History(HistoryArgs),
}

#[derive(Args)]
pub struct WorkspaceArgs {
    /// Workspace directory to trace
    #[arg(long, short = 'w', default_value = ".")]
    pub workspace: PathBuf,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub target: WorkspaceArgs,

    /// Report every difference, not only changes stamped while the command ran
    #[arg(long, default_value_t = false)]
    pub full: bool,

    /// Widen the capture window on both ends, e.g. "2s" (overrides config)
    #[arg(long)]
    pub slack: Option<String>,

    /// Append the result to the trace history
    #[arg(long, default_value_t = false)]
    pub record: bool,

    /// Output the diff as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Command to run, after `--`
    #[arg(trailing_var_arg = true, required = true, num_args = 1..)]
    pub command: Vec<String>,
}

#[derive(Args)]
pub struct SummaryArgs {
    /// Only consider traces of this workspace
    #[arg(long, short = 'w')]
    pub workspace: Option<PathBuf>,

    /// Output the diff as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Only list traces of this workspace
    #[arg(long, short = 'w')]
    pub workspace: Option<PathBuf>,

    /// Show at most this many of the newest traces
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}
