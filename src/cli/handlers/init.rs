use crate::cli::commands::InitArgs;
use crate::io::store;

/// Create `.prefmend/` in the current directory.
pub fn cmd_init(args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let dir = store::init_store(&cwd, args.force)?;
    println!("initialized preference store in {}", dir.display());
    println!("run `prefmend reconcile` to bring stored preferences up to date");
    Ok(())
}
