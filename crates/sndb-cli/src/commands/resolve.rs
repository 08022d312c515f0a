use std::sync::Arc;

use anyhow::Context;
use sndb_config::SndbConfig;
use sndb_core::Coordinate;
use sndb_ingest::{Disambiguation, NonInteractive};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ResolveArgs;
use crate::context::AppContext;
use crate::output::output;
use crate::prompt::ConsoleDisambiguation;

/// Handle `sndb resolve`.
pub async fn handle(args: &ResolveArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let coordinate = match (&args.ra, &args.dec) {
        (Some(ra), Some(dec)) => Some(Coordinate::parse(ra, dec)?),
        _ => None,
    };
    if args.name.is_none() && coordinate.is_none() {
        anyhow::bail!("nothing to resolve: pass --name, or --ra with --dec");
    }

    let config = SndbConfig::load_with_dotenv().context("failed to load configuration")?;
    let ctx = AppContext::init(config, args.registry.clone())?;
    let prompt: Arc<dyn Disambiguation> = if args.interactive > 0 {
        Arc::new(ConsoleDisambiguation)
    } else {
        Arc::new(NonInteractive)
    };

    let resolution = ctx
        .matcher()
        .resolve_identity(
            args.name.as_deref(),
            coordinate.as_ref(),
            args.interactive,
            &*prompt,
        )
        .await?;
    output(&resolution, flags.format)
}
