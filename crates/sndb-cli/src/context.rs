use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sndb_catalog::{
    CatalogResolver, HistoricalSurveyIndex, HostCatalogService, InMemoryRegistry, LocalRegistry,
    RegistryStore, RetryPolicy, RochesterPages, TransientNameServer, http::build_client,
};
use sndb_config::SndbConfig;
use sndb_ingest::{IdentityMatcher, LightCurveBook, RunAggregator};

/// Catalog clients and the registry, built once per invocation.
///
/// With a snapshot in use, observing runs and light curves are kept next to
/// it as `<snapshot>.runs.json` and `<snapshot>.photometry.json`.
pub struct AppContext {
    pub config: SndbConfig,
    pub store: Arc<InMemoryRegistry>,
    pub runs: Arc<RunAggregator>,
    pub light_curves: Arc<LightCurveBook>,
    snapshot: Option<PathBuf>,
    registry: Arc<dyn CatalogResolver>,
    transient: Arc<dyn CatalogResolver>,
    survey: Arc<dyn CatalogResolver>,
    host: Arc<dyn CatalogResolver>,
}

impl AppContext {
    /// Build clients from `config`. `snapshot` overrides the configured
    /// registry snapshot path.
    pub fn init(config: SndbConfig, snapshot: Option<PathBuf>) -> anyhow::Result<Self> {
        let catalogs = &config.catalogs;
        let http = build_client(&catalogs.user_agent, Duration::from_secs(catalogs.timeout_secs))
            .context("failed to build HTTP client")?;

        let snapshot = snapshot.or_else(|| {
            config
                .registry
                .has_snapshot()
                .then(|| PathBuf::from(&config.registry.snapshot_path))
        });
        let (store, runs, light_curves) = match &snapshot {
            Some(path) => {
                let store = InMemoryRegistry::load_json(path)
                    .with_context(|| format!("failed to load registry snapshot {}", path.display()))?;
                let runs_path = runs_sidecar(path);
                let runs = RunAggregator::load_json(&runs_path)
                    .with_context(|| format!("failed to load runs {}", runs_path.display()))?;
                let photometry_path = photometry_sidecar(path);
                let light_curves = LightCurveBook::load_json(&photometry_path)
                    .with_context(|| format!("failed to load light curves {}", photometry_path.display()))?;
                (store, runs, light_curves)
            }
            None => (InMemoryRegistry::new(), RunAggregator::new(), LightCurveBook::new()),
        };
        let store = Arc::new(store);
        tracing::debug!(objects = store.len()?, snapshot = ?snapshot, "registry loaded");

        let registry_store: Arc<dyn RegistryStore> = store.clone();
        let registry = LocalRegistry::new(
            registry_store,
            config.registry.search_radius_sq,
            config.registry.search_limit,
        );
        let transient =
            TransientNameServer::new(http.clone(), &catalogs.tns_url, catalogs.tns_radius_arcmin);
        let pages = RochesterPages::new(
            http.clone(),
            &catalogs.rochester_active_url,
            &catalogs.rochester_historical_url,
        );
        let survey = HistoricalSurveyIndex::new(Arc::new(pages));
        let host = HostCatalogService::new(http, &catalogs.simbad_url);

        Ok(Self {
            store,
            runs: Arc::new(runs),
            light_curves: Arc::new(light_curves),
            snapshot,
            registry: Arc::new(registry),
            transient: Arc::new(transient),
            survey: Arc::new(survey),
            host: Arc::new(host),
            config,
        })
    }

    /// A matcher over the shared catalog clients.
    #[must_use]
    pub fn matcher(&self) -> IdentityMatcher {
        let retry = &self.config.retry;
        IdentityMatcher::new(
            self.registry.clone(),
            self.transient.clone(),
            self.survey.clone(),
            self.host.clone(),
        )
        .with_retry(RetryPolicy::from_millis(
            retry.max_attempts,
            retry.base_delay_ms,
            retry.max_delay_ms,
        ))
    }

    /// Write the registry, runs and light curves back, if a snapshot is in use.
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        self.store
            .save_json(path)
            .with_context(|| format!("failed to save registry snapshot {}", path.display()))?;
        let runs_path = runs_sidecar(path);
        self.runs
            .save_json(&runs_path)
            .with_context(|| format!("failed to save runs {}", runs_path.display()))?;
        let photometry_path = photometry_sidecar(path);
        self.light_curves
            .save_json(&photometry_path)
            .with_context(|| format!("failed to save light curves {}", photometry_path.display()))?;
        tracing::info!(path = %path.display(), "registry snapshot saved");
        Ok(())
    }
}

fn runs_sidecar(snapshot: &Path) -> PathBuf {
    snapshot.with_extension("runs.json")
}

fn photometry_sidecar(snapshot: &Path) -> PathBuf {
    snapshot.with_extension("photometry.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use chrono::NaiveDate;
    use sndb_core::{ObjectRecord, RunId};
    use sndb_ingest::RunSighting;
    use tempfile::TempDir;

    fn sighting() -> RunSighting {
        RunSighting {
            date: NaiveDate::from_ymd_opt(2020, 1, 15).unwrap(),
            observer: "Filippenko".to_string(),
            instrument: Some("Kast".to_string()),
            telescope: None,
            seeing: None,
            reducer: None,
        }
    }

    #[tokio::test]
    async fn snapshot_is_loaded_and_saved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");

        let ctx = AppContext::init(SndbConfig::default(), Some(path.clone())).unwrap();
        assert_eq!(ctx.store.len().unwrap(), 0);
        ctx.store.insert(ObjectRecord::new("SN 2011fe")).await.unwrap();
        ctx.save().unwrap();

        let reloaded = AppContext::init(SndbConfig::default(), Some(path)).unwrap();
        assert_eq!(reloaded.store.len().unwrap(), 1);
    }

    #[test]
    fn runs_persist_across_invocations() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");

        let first = AppContext::init(SndbConfig::default(), Some(path.clone())).unwrap();
        let id = first.runs.group_or_create_run(&sighting(), "SN 2020abc").unwrap();
        first.save().unwrap();
        assert!(dir.path().join("registry.runs.json").exists());
        assert!(dir.path().join("registry.photometry.json").exists());

        let second = AppContext::init(SndbConfig::default(), Some(path)).unwrap();
        let again = second.runs.group_or_create_run(&sighting(), "SN 2020abd").unwrap();
        assert_eq!(again, id);
        assert_eq!(id, RunId(1));
        let runs = second.runs.runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].targets.joined(), "SN 2020abc | SN 2020abd");
    }

    #[test]
    fn configured_snapshot_is_the_fallback() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("configured.json");
        let mut config = SndbConfig::default();
        config.registry.snapshot_path = path.display().to_string();

        let ctx = AppContext::init(config, None).unwrap();
        ctx.save().unwrap();
        assert!(path.exists());
    }
}
