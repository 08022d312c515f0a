use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use sndb_catalog::RegistryStore;
use sndb_config::{IngestConfig, SndbConfig};
use sndb_core::ObservingRun;
use sndb_ingest::{
    AcceptNearest, Disambiguation, ImportReport, Importer, NonInteractive, SnidRunner,
};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ImportArgs;
use crate::context::AppContext;
use crate::output::output;
use crate::prompt::ConsoleDisambiguation;

#[derive(Debug, Serialize)]
struct ImportSummary {
    #[serde(flatten)]
    report: ImportReport,
    runs: Vec<ObservingRun>,
}

/// Handle `sndb import`.
pub async fn handle(args: &ImportArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let config = SndbConfig::load_with_dotenv().context("failed to load configuration")?;
    let ingest = ingest_config(&config.ingest, args);
    let ctx = AppContext::init(config, args.registry.clone())?;

    let importer = build_importer(&ctx, ingest, args);

    let report = importer.import_folder(&args.folder).await;
    tracing::info!(
        imported = report.imported.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "import finished"
    );
    ctx.save()?;

    let summary = ImportSummary {
        report,
        runs: ctx.runs.runs()?,
    };
    output(&summary, flags.format)
}

/// An importer over the context's registry and runs, with the prompt the
/// flags ask for.
fn build_importer(ctx: &AppContext, ingest: IngestConfig, args: &ImportArgs) -> Importer {
    let (prompt, budget): (Arc<dyn Disambiguation>, usize) = if args.accept_nearest {
        (Arc::new(AcceptNearest), 1)
    } else if ingest.interactive_budget > 0 {
        (Arc::new(ConsoleDisambiguation), ingest.interactive_budget)
    } else {
        (Arc::new(NonInteractive), 0)
    };
    let ingest = IngestConfig {
        interactive_budget: budget,
        ..ingest
    };

    let store: Arc<dyn RegistryStore> = ctx.store.clone();
    let importer = Importer::new(ingest, ctx.matcher(), store, ctx.runs.clone(), prompt);
    match &args.snid {
        Some(program) => importer.with_typing(SnidRunner::new(program.clone())),
        None => importer,
    }
}

/// Command-line flags layered over the configured ingest settings.
fn ingest_config(base: &IngestConfig, args: &ImportArgs) -> IngestConfig {
    IngestConfig {
        include_details: base.include_details || args.details,
        require_calibration: base.require_calibration || args.require_calibration,
        interactive_budget: args.interactive.unwrap_or(base.interactive_budget),
        ..base.clone()
    }
}
