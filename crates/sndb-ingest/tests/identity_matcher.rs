mod common;

use common::{Catalogs, FakeCatalog, ScriptedPrompt, at};
use pretty_assertions::assert_eq;
use sndb_catalog::InMemoryRegistry;
use sndb_core::{CatalogSource, Coordinate, CoreError, ObjectRecord, RecordField};
use sndb_ingest::{MatchedBy, NonInteractive};

fn target(ra: f64, dec: f64) -> Coordinate {
    Coordinate::from_degrees(ra, dec).unwrap()
}

#[tokio::test]
async fn registry_name_hit_short_circuits() {
    let catalogs = Catalogs::new(
        InMemoryRegistry::from_records([at("SN 2011fe", 210.774, 54.274)]),
        FakeCatalog::new(CatalogSource::TransientNameServer).with_name(at("SN 2011fe", 0.0, 0.0)),
        FakeCatalog::new(CatalogSource::HistoricalSurveyIndex),
        FakeCatalog::new(CatalogSource::HostCatalog),
    );
    let resolution = catalogs
        .matcher()
        .resolve_identity(Some("SN 2011fe"), None, 0, &NonInteractive)
        .await
        .unwrap();
    assert_eq!(resolution.source, CatalogSource::LocalRegistry);
    assert!(resolution.is_registered());
    assert_eq!(catalogs.transient.name_calls(), 0);
    assert_eq!(catalogs.host.name_calls(), 0);
}

#[tokio::test]
async fn transient_name_server_precedes_survey() {
    let mut tns = at("SN 2020abc", 187.7, 12.39);
    tns.object_type = Some("Ia".to_string());
    let mut survey = at("SN 2020abc", 187.7, 12.39);
    survey.object_type = Some("II".to_string());
    let catalogs = Catalogs::new(
        InMemoryRegistry::new(),
        FakeCatalog::new(CatalogSource::TransientNameServer).with_name(tns),
        FakeCatalog::new(CatalogSource::HistoricalSurveyIndex).with_name(survey),
        FakeCatalog::new(CatalogSource::HostCatalog),
    );
    let resolution = catalogs
        .matcher()
        .resolve_identity(Some("SN 2020abc"), None, 0, &NonInteractive)
        .await
        .unwrap();
    assert_eq!(resolution.source, CatalogSource::TransientNameServer);
    assert_eq!(resolution.record.object_type.as_deref(), Some("Ia"));
    assert_eq!(catalogs.survey.name_calls(), 0);
}

#[tokio::test]
async fn survey_is_retried_with_name_variants() {
    let catalogs = Catalogs::new(
        InMemoryRegistry::new(),
        FakeCatalog::new(CatalogSource::TransientNameServer),
        FakeCatalog::new(CatalogSource::HistoricalSurveyIndex).with_name(ObjectRecord::new("SN 1994D")),
        FakeCatalog::new(CatalogSource::HostCatalog),
    );
    let resolution = catalogs
        .matcher()
        .resolve_identity(Some("sn1994d"), None, 0, &NonInteractive)
        .await
        .unwrap();
    assert_eq!(resolution.record.name, "SN 1994D");
    assert_eq!(resolution.source, CatalogSource::HistoricalSurveyIndex);
    assert_eq!(catalogs.survey.name_calls(), 2);
}

#[tokio::test]
async fn exact_registry_coordinate_skips_prompt() {
    let catalogs = Catalogs::new(
        InMemoryRegistry::from_records([at("SN 2011fe", 210.774, 54.274), at("SN 2011fg", 210.9, 54.3)]),
        FakeCatalog::new(CatalogSource::TransientNameServer).with_near(at("AT 2011xx", 210.775, 54.274)),
        FakeCatalog::new(CatalogSource::HistoricalSurveyIndex),
        FakeCatalog::new(CatalogSource::HostCatalog),
    );
    let prompt = ScriptedPrompt::answering(Some(1));
    let resolution = catalogs
        .matcher()
        .resolve_identity(Some("unknown folder"), Some(&target(210.774, 54.274)), 5, &prompt)
        .await
        .unwrap();
    assert_eq!(resolution.record.name, "SN 2011fe");
    assert_eq!(resolution.matched_by, MatchedBy::ExactCoordinate);
    assert_eq!(prompt.calls(), 0);
}

#[tokio::test]
async fn several_inexact_candidates_without_budget_are_ambiguous() {
    let catalogs = Catalogs::new(
        InMemoryRegistry::new(),
        FakeCatalog::new(CatalogSource::TransientNameServer)
            .with_near(at("AT 2020a", 10.01, 10.0))
            .with_near(at("AT 2020b", 10.02, 10.0)),
        FakeCatalog::new(CatalogSource::HistoricalSurveyIndex),
        FakeCatalog::new(CatalogSource::HostCatalog),
    );
    let err = catalogs
        .matcher()
        .resolve_identity(None, Some(&target(10.0, 10.0)), 0, &NonInteractive)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::AmbiguousMatch { candidates: 2, .. }));
}

#[tokio::test]
async fn single_inexact_candidate_without_budget_is_not_found() {
    let catalogs = Catalogs::new(
        InMemoryRegistry::new(),
        FakeCatalog::new(CatalogSource::TransientNameServer).with_near(at("AT 2020a", 10.01, 10.0)),
        FakeCatalog::new(CatalogSource::HistoricalSurveyIndex),
        FakeCatalog::new(CatalogSource::HostCatalog),
    );
    let err = catalogs
        .matcher()
        .resolve_identity(None, Some(&target(10.0, 10.0)), 0, &NonInteractive)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
}

fn crowded_field() -> Catalogs {
    Catalogs::new(
        InMemoryRegistry::from_records([at("SN 2000reg", 10.02, 10.0)]),
        FakeCatalog::new(CatalogSource::TransientNameServer)
            .with_near(at("AT 2020far", 10.03, 10.0))
            .with_near(at("AT 2020tie", 10.02, 10.0))
            .with_near(at("AT 2020near", 10.01, 10.0)),
        FakeCatalog::new(CatalogSource::HistoricalSurveyIndex).with_coordinates(),
        FakeCatalog::new(CatalogSource::HostCatalog),
    )
}

#[tokio::test]
async fn prompt_sees_budgeted_candidates_in_merged_order() {
    let catalogs = crowded_field();
    let prompt = ScriptedPrompt::answering(Some(1));
    let resolution = catalogs
        .matcher()
        .resolve_identity(None, Some(&target(10.0, 10.0)), 3, &prompt)
        .await
        .unwrap();

    let shown = prompt.shown.lock().unwrap().clone();
    assert_eq!(shown, vec![vec!["AT 2020near", "SN 2000reg", "AT 2020tie"]]);
    assert_eq!(resolution.record.name, "SN 2000reg");
    assert_eq!(resolution.source, CatalogSource::LocalRegistry);
    assert_eq!(resolution.matched_by, MatchedBy::Selection);
}

#[tokio::test]
async fn declined_or_out_of_range_selection_is_not_found() {
    for answer in [None, Some(7)] {
        let catalogs = crowded_field();
        let prompt = ScriptedPrompt::answering(answer);
        let err = catalogs
            .matcher()
            .resolve_identity(None, Some(&target(10.0, 10.0)), 2, &prompt)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }), "answer {answer:?}");
        assert_eq!(prompt.calls(), 1);
    }
}

#[tokio::test]
async fn enrichment_fills_only_absent_host_fields() {
    let mut primary = at("SN 2020abc", 187.7, 12.39);
    primary.host_name = Some("M87".to_string());
    primary.host_type = Some("E0".to_string());
    let mut host = ObjectRecord::new("M87");
    host.host_name = Some("M87".to_string());
    host.host_type = Some("cD".to_string());
    host.host_redshift = Some(0.004283);

    let catalogs = Catalogs::new(
        InMemoryRegistry::new(),
        FakeCatalog::new(CatalogSource::TransientNameServer).with_name(primary),
        FakeCatalog::new(CatalogSource::HistoricalSurveyIndex),
        FakeCatalog::new(CatalogSource::HostCatalog).with_name(host),
    );
    let resolution = catalogs
        .matcher()
        .resolve_identity(Some("SN 2020abc"), None, 0, &NonInteractive)
        .await
        .unwrap();
    let record = &resolution.record;
    assert_eq!(record.host_type.as_deref(), Some("E0"));
    assert_eq!(record.host_redshift, Some(0.004283));
    assert_eq!(
        record.source_of(RecordField::HostType),
        Some(CatalogSource::TransientNameServer)
    );
    assert_eq!(
        record.source_of(RecordField::HostRedshift),
        Some(CatalogSource::HostCatalog)
    );
    assert_eq!(resolution.enriched, vec![RecordField::HostRedshift]);
}

#[tokio::test]
async fn failing_catalog_is_a_miss_after_retries() {
    let catalogs = Catalogs::new(
        InMemoryRegistry::new(),
        FakeCatalog::new(CatalogSource::TransientNameServer).failing(),
        FakeCatalog::new(CatalogSource::HistoricalSurveyIndex).with_name(ObjectRecord::new("sn 1987a")),
        FakeCatalog::new(CatalogSource::HostCatalog),
    );
    let resolution = catalogs
        .matcher()
        .resolve_identity(Some("SN 1987A"), None, 0, &NonInteractive)
        .await
        .unwrap();
    assert_eq!(resolution.source, CatalogSource::HistoricalSurveyIndex);
    assert_eq!(catalogs.transient.name_calls(), 2);
}

#[tokio::test]
async fn resolution_is_idempotent() {
    let catalogs = crowded_field();
    let matcher = catalogs.matcher();
    let name = Some("SN 2000reg");
    let coord = target(10.0, 10.0);
    let first = matcher
        .resolve_identity(name, Some(&coord), 0, &NonInteractive)
        .await
        .unwrap();
    let second = matcher
        .resolve_identity(name, Some(&coord), 0, &NonInteractive)
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn nothing_to_go_on_is_not_found() {
    let err = Catalogs::empty()
        .matcher()
        .resolve_identity(None, None, 0, &NonInteractive)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
}
