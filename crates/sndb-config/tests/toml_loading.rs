//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for sandboxed cwd and env var manipulation.

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;
use sndb_config::{LOCAL_CONFIG_FILE, SndbConfig};

#[test]
fn loads_catalog_section_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[catalogs]
tns_url = "http://localhost:8080"
tns_radius_arcmin = 2.5
simbad_url = "http://localhost:8081/sim-id"
timeout_secs = 5
"#,
        )?;

        let config: SndbConfig = Figment::from(Serialized::defaults(SndbConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.catalogs.tns_url, "http://localhost:8080");
        assert_eq!(config.catalogs.simbad_url, "http://localhost:8081/sim-id");
        assert_eq!(config.catalogs.timeout_secs, 5);
        assert!((config.catalogs.tns_radius_arcmin - 2.5).abs() < f64::EPSILON);
        // Untouched keys keep their defaults.
        assert!(config.catalogs.rochester_active_url.ends_with("snactive.html"));
        Ok(())
    });
}

#[test]
fn local_project_file_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_file(
            LOCAL_CONFIG_FILE,
            r#"
[ingest]
observation_suffix = ".ascii"
photometry_suffix = ".phot"
require_calibration = true
interactive_budget = 3

[registry]
snapshot_path = "registry.json"
"#,
        )?;

        let config = SndbConfig::load().expect("config loads");
        assert_eq!(config.ingest.observation_suffix, ".ascii");
        assert_eq!(config.ingest.photometry_suffix, ".phot");
        assert!(config.ingest.require_calibration);
        assert_eq!(config.ingest.interactive_budget, 3);
        assert!(config.registry.has_snapshot());
        Ok(())
    });
}

#[test]
fn invalid_cutoff_fails_load() {
    Jail::expect_with(|jail| {
        jail.create_file(LOCAL_CONFIG_FILE, "[ingest]\nmatch_cutoff = 2.0\n")?;
        assert!(SndbConfig::load().is_err());
        Ok(())
    });
}
