use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "prefmend", about = concat!("prefmend v", env!("CARGO_PKG_VERSION"), " - keeps stored preferences in step with the app"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use this store directory instead of searching for .prefmend/
    #[arg(short = 'C', long = "store-dir", global = true)]
    pub store_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a .prefmend/ store in the current directory
    Init(InitArgs),
    /// Bring the stored preferences up to the current schema
    Reconcile(ReconcileArgs),
    /// Print the stored preferences
    Show(ShowArgs),
    /// Print the canonical defaults and field policies
    Schema,
    /// View or manage the recovery log
    Recovery(RecoveryCmd),
}

#[derive(Args)]
pub struct InitArgs {
    /// Rewrite the config even if a store already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ReconcileArgs {
    /// Report changes without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Dotted path of a single field (e.g. settings.appBadge)
    pub path: Option<String>,
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
    /// Show entries after this timestamp (RFC 3339)
    #[arg(long)]
    pub since: Option<String>,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Remove old entries
    Prune(RecoveryPruneArgs),
    /// Print the absolute path to the recovery log
    Path,
}

#[derive(Args)]
pub struct RecoveryPruneArgs {
    /// Remove entries older than this timestamp (default: 30 days ago)
    #[arg(long)]
    pub before: Option<String>,
    /// Remove all entries
    #[arg(long)]
    pub all: bool,
}
