use crate::cli::{Commands, GlobalFlags};
use crate::commands;

/// Dispatch a parsed command to its handler.
pub async fn dispatch(command: Commands, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Import(args) => commands::import::handle(&args, flags).await,
        Commands::Photometry(args) => commands::photometry::handle(&args, flags).await,
        Commands::Reconcile(args) => commands::reconcile::handle(&args, flags).await,
        Commands::Resolve(args) => commands::resolve::handle(&args, flags).await,
        Commands::Coord(args) => commands::coord::handle(&args, flags),
    }
}
