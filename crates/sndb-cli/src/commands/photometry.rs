use std::sync::Arc;

use anyhow::Context;
use sndb_catalog::RegistryStore;
use sndb_config::SndbConfig;
use sndb_ingest::{Importer, NonInteractive};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::PhotometryArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `sndb photometry`.
pub async fn handle(args: &PhotometryArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let config = SndbConfig::load_with_dotenv().context("failed to load configuration")?;
    let ingest = config.ingest.clone();
    let ctx = AppContext::init(config, args.registry.clone())?;

    let store: Arc<dyn RegistryStore> = ctx.store.clone();
    let importer = Importer::new(ingest, ctx.matcher(), store, ctx.runs.clone(), Arc::new(NonInteractive));
    let report = importer.import_light_curves(&args.folder, &ctx.light_curves).await;
    tracing::info!(
        imported = report.imported.len(),
        failed = report.failed.len(),
        "photometry import finished"
    );
    ctx.save()?;
    output(&report, flags.format)
}
