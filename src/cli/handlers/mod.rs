mod init;
pub use init::cmd_init;

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::recovery;
use crate::io::state_io::{self, StoredState};
use crate::io::store::{self, Store, StoreError};
use crate::model::user::user_schema;
use crate::ops::session::{BootstrapOptions, bootstrap};

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    let store_dir = cli.store_dir;

    match cli.command {
        Commands::Init(args) => cmd_init(args),
        Commands::Schema => cmd_schema(json),
        Commands::Reconcile(args) => cmd_reconcile(&open_store(store_dir.as_deref())?, args, json),
        Commands::Show(args) => cmd_show(&open_store(store_dir.as_deref())?, args),
        Commands::Recovery(args) => cmd_recovery(&open_store(store_dir.as_deref())?, args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Open the store named by `-C`, or the nearest `.prefmend/` above the cwd.
pub fn open_store(override_dir: Option<&str>) -> Result<Store, StoreError> {
    let dir = match override_dir {
        Some(dir) => PathBuf::from(dir),
        None => store::discover_store(&std::env::current_dir()?)?,
    };
    Store::open(&dir)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{}': {}", s, e).into())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_reconcile(
    store: &Store,
    args: ReconcileArgs,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let schema = user_schema();
    let session = bootstrap(
        store,
        &schema,
        BootstrapOptions {
            dry_run: args.dry_run,
        },
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reconcile_json(&session))?);
    } else {
        print!("{}", format_reconcile_text(&session, args.dry_run));
    }
    Ok(())
}

/// Print the stored tree, or a field of it. A store that has never been
/// written shows the defaults a session would install.
fn cmd_show(store: &Store, args: ShowArgs) -> Result<(), Box<dyn std::error::Error>> {
    let tree = match state_io::read_state(&store.state_path())? {
        StoredState::Parsed(tree) => tree,
        StoredState::Absent => user_schema().default_tree(),
        StoredState::Unparseable { error, .. } => {
            return Err(format!("{} is not valid JSON: {}", store.config.storage.state_file, error).into());
        }
    };

    let value = match args.path.as_deref() {
        Some(path) => tree
            .lookup(path)
            .ok_or_else(|| format!("no field at '{}'", path))?,
        None => &tree,
    };
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_schema(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let schema = user_schema();
    if json {
        println!("{}", serde_json::to_string_pretty(&schema_json(&schema))?);
    } else {
        print!("{}", format_schema_text(&schema));
    }
    Ok(())
}

fn cmd_recovery(
    store: &Store,
    args: RecoveryCmd,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match args.action {
        Some(RecoveryAction::Path) => {
            println!("{}", recovery::recovery_log_path(&store.dir).display());
        }
        Some(RecoveryAction::Prune(prune)) => {
            let before = prune.before.as_deref().map(parse_timestamp).transpose()?;
            let removed = recovery::prune_recovery(&store.dir, before, prune.all)?;
            println!("removed {} recovery entr{}", removed, if removed == 1 { "y" } else { "ies" });
        }
        None => {
            let since = args.since.as_deref().map(parse_timestamp).transpose()?;
            let entries =
                recovery::read_recovery_entries(&store.dir, Some(args.limit.unwrap_or(10)), since);
            if json {
                let values: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else if entries.is_empty() {
                println!("recovery log is empty");
            } else {
                for entry in &entries {
                    print!("{}", entry.to_display_markdown());
                }
            }
        }
    }
    Ok(())
}
