mod common;

use std::path::Path;
use std::sync::Arc;

use common::{Catalogs, FakeCatalog, at, touch, write_fits, write_spectrum};
use pretty_assertions::assert_eq;
use sndb_catalog::{InMemoryRegistry, RegistryStore};
use sndb_config::IngestConfig;
use sndb_core::{CatalogSource, RecordField, RunId};
use sndb_ingest::{Importer, MatchedBy, NonInteractive, RunAggregator};
use tempfile::TempDir;

fn night(root: &Path, stem: &str, date: &str, observer: &str) {
    let folder = stem.split('-').next().unwrap();
    write_spectrum(&root.join(folder).join(format!("{stem}.flm")));
    write_fits(
        &root.join(folder).join(format!("{stem}.fits")),
        &[
            format!("DATE-OBS= '{date}'").as_str(),
            format!("OBSERVER= '{observer}'").as_str(),
            "INSTRUME= 'shane'",
        ],
    );
}

fn observing_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    night(root, "sn2020abc-20200115.345", "2020-01-15T04:12:00", "Filippenko");
    night(root, "sn2020abc-20200220.100", "2020-02-20", "Filippenko");

    // Header without a date.
    write_spectrum(&root.join("sn2011fe/sn2011fe-20110901.flm"));
    write_fits(
        &root.join("sn2011fe/sn2011fe-20110901.fits"),
        &["OBSERVER= 'Silverman'"],
    );

    // Spectrum with no calibration file at all.
    touch(&root.join("sn2012aw/sn2012aw-20120320.flm"));

    // Details folders are skipped by default.
    night(&root.join("sn2020abc"), "details-20200115", "2020-01-15", "Filippenko");
    dir
}

fn catalogs() -> Catalogs {
    Catalogs::new(
        InMemoryRegistry::new(),
        FakeCatalog::new(CatalogSource::TransientNameServer).with_name(at("SN 2020abc", 187.7, 12.39)),
        FakeCatalog::new(CatalogSource::HistoricalSurveyIndex),
        FakeCatalog::new(CatalogSource::HostCatalog),
    )
}

fn importer(catalogs: &Catalogs, runs: &Arc<RunAggregator>) -> Importer {
    Importer::new(
        IngestConfig::default(),
        catalogs.matcher(),
        catalogs.store(),
        runs.clone(),
        Arc::new(NonInteractive),
    )
}

#[tokio::test]
async fn imports_registers_and_groups() {
    let tree = observing_tree();
    let catalogs = catalogs();
    let runs = Arc::new(RunAggregator::new());
    let report = importer(&catalogs, &runs).import_folder(tree.path()).await;

    assert_eq!(report.total(), 4);

    let imported: Vec<_> = report
        .imported
        .iter()
        .map(|f| (f.object.as_str(), f.source, f.registered, f.run))
        .collect();
    assert_eq!(
        imported,
        vec![
            ("SN 2020abc", CatalogSource::TransientNameServer, true, RunId(1)),
            ("SN 2020abc", CatalogSource::LocalRegistry, false, RunId(2)),
        ]
    );
    assert!(report.imported.iter().all(|f| f.matched_by == MatchedBy::Name));
    assert!(report.imported[0].calibration.ends_with("sn2020abc-20200115.345.fits"));
    let spectrum = report.imported[0].spectrum;
    assert_eq!((spectrum.min_wavelength, spectrum.max_wavelength), (3500.0, 3504.0));
    assert_eq!(spectrum.snr, None);

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].kind, "data_integrity");
    assert!(report.failed[0].observation.ends_with("sn2011fe-20110901.flm"));

    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].observation.ends_with("sn2012aw-20120320.flm"));

    let stored = catalogs.store.find_by_name("SN 2020abc").await.unwrap().unwrap();
    assert_eq!(
        stored.source_of(RecordField::Coordinate),
        Some(CatalogSource::TransientNameServer)
    );

    let runs = runs.runs().unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].instrument.as_deref(), Some("Kast"));
    assert_eq!(runs[0].telescope.as_deref(), Some("Lick 3m, Shane"));
    assert_eq!(runs[0].targets.joined(), "SN 2020abc");
}

#[tokio::test]
async fn reimport_is_idempotent() {
    let tree = observing_tree();
    let catalogs = catalogs();
    let runs = Arc::new(RunAggregator::new());
    let importer = importer(&catalogs, &runs);

    importer.import_folder(tree.path()).await;
    let before = runs.runs().unwrap();
    let report = importer.import_folder(tree.path()).await;

    assert!(report.imported.iter().all(|f| !f.registered));
    assert_eq!(runs.runs().unwrap(), before);
    assert_eq!(catalogs.store.len().unwrap(), 1);
}

#[tokio::test]
async fn details_are_imported_on_request() {
    let tree = observing_tree();
    let catalogs = catalogs();
    let runs = Arc::new(RunAggregator::new());
    let config = IngestConfig {
        include_details: true,
        require_calibration: true,
        ..IngestConfig::default()
    };
    let importer = Importer::new(
        config,
        catalogs.matcher(),
        catalogs.store(),
        runs.clone(),
        Arc::new(NonInteractive),
    );
    let report = importer.import_folder(tree.path()).await;

    assert!(report.skipped.is_empty());
    assert_eq!(report.imported.len(), 2);
    // The folder name "details" is not a catalog name.
    let details: Vec<_> = report
        .failed
        .iter()
        .filter(|f| f.observation.ends_with("details/details-20200115.flm"))
        .collect();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].kind, "not_found");
}

#[tokio::test]
async fn unreadable_spectrum_fails_the_file() {
    let tree = observing_tree();
    touch(&tree.path().join("sn2020abc/sn2020abc-20200115.345.flm"));
    let catalogs = catalogs();
    let runs = Arc::new(RunAggregator::new());
    let report = importer(&catalogs, &runs).import_folder(tree.path()).await;

    let failed: Vec<_> = report
        .failed
        .iter()
        .filter(|f| f.observation.ends_with("sn2020abc-20200115.345.flm"))
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].kind, "data_integrity");
    assert_eq!(report.imported.len(), 1);
}
