use std::sync::Arc;

use anyhow::Context;
use regex::Regex;
use sndb_catalog::RegistryStore;
use sndb_config::SndbConfig;
use sndb_ingest::{Disambiguation, NameReconciler, NameUpdate, NonInteractive, ReconcileOptions};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ReconcileArgs;
use crate::context::AppContext;
use crate::output::output;
use crate::prompt::ConsoleDisambiguation;

/// Handle `sndb reconcile`.
pub async fn handle(args: &ReconcileArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let options = reconcile_options(args)?;
    let config = SndbConfig::load_with_dotenv().context("failed to load configuration")?;
    let ctx = AppContext::init(config, args.registry.clone())?;
    let prompt: Arc<dyn Disambiguation> = if args.interactive > 0 {
        Arc::new(ConsoleDisambiguation)
    } else {
        Arc::new(NonInteractive)
    };

    let store: Arc<dyn RegistryStore> = ctx.store.clone();
    let reconciler = NameReconciler::new(ctx.matcher(), store, prompt)
        .with_runs(ctx.runs.clone())
        .with_light_curves(ctx.light_curves.clone());
    let report = reconciler.reconcile_names(&options).await?;
    tracing::info!(
        updated = report.updated.len(),
        untouched = report.untouched.len(),
        failed = report.failed.len(),
        "reconciliation finished"
    );
    ctx.save()?;
    output(&report, flags.format)
}

fn reconcile_options(args: &ReconcileArgs) -> anyhow::Result<ReconcileOptions> {
    let pattern = Regex::new(&args.pattern)
        .with_context(|| format!("invalid name pattern '{}'", args.pattern))?;
    let update = if args.rename {
        NameUpdate::Rename
    } else {
        NameUpdate::AltName
    };
    Ok(ReconcileOptions {
        fill_details: args.fill,
        interactive_budget: args.interactive,
        ..ReconcileOptions::new(pattern, update)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pattern: &str) -> ReconcileArgs {
        ReconcileArgs {
            pattern: pattern.to_string(),
            rename: true,
            fill: false,
            interactive: 3,
            registry: None,
        }
    }

    #[test]
    fn flags_become_options() {
        let options = reconcile_options(&args("(?i)psn")).unwrap();
        assert_eq!(options.update, NameUpdate::Rename);
        assert!(!options.fill_details);
        assert_eq!(options.interactive_budget, 3);
        assert!(options.pattern.is_match("PSN J1234"));
    }

    #[test]
    fn bad_pattern_is_an_error() {
        assert!(reconcile_options(&args("(psn")).is_err());
    }
}
