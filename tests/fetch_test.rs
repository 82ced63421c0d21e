//! Integration tests for fetching external repositories with the system `git`.
//!
//! Every test builds its remote as a local repository (see `common`), so no
//! network access is needed, but a working `git` binary is.
//!
//! ## Running These Tests
//!
//! ```bash
//! cargo test --features integration-tests --test fetch_test
//! ```

mod common;

use common::prelude::*;
use nomenclature_repos::config::NomenclatureConfig;
use nomenclature_repos::dimension::Dimension;
use nomenclature_repos::error::Error;
use nomenclature_repos::fetcher::RepositoryFetcher;
use nomenclature_repos::git;
use nomenclature_repos::repository::{Pin, Repository};

fn head_of(path: &std::path::Path) -> Option<String> {
    git::rev_parse(path, "HEAD").unwrap()
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_clone_tracks_default_branch() {
    let origin = GitFixture::new().with_definitions();
    let workspace = TempDir::new().unwrap();
    let target = workspace.child("common-definitions");

    let resolved = RepositoryFetcher::new()
        .fetch("common-definitions", &Repository::new(origin.url()), target.path())
        .unwrap();

    assert_eq!(resolved.local_path(), target.path());
    target
        .child("definitions/region/regions.yaml")
        .assert(predicate::path::is_file());
    assert_eq!(head_of(target.path()), Some(origin.head()));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_auto_update_picks_up_new_commits() {
    let origin = GitFixture::new().with_definitions();
    let workspace = TempDir::new().unwrap();
    let target = workspace.child("common-definitions");
    let repository = Repository::new(origin.url());
    let fetcher = RepositoryFetcher::new();

    fetcher
        .fetch("common-definitions", &repository, target.path())
        .unwrap();
    let latest = origin.commit(
        "definitions/variable/emissions.yaml",
        "- Emissions|CO2:\n    unit: Mt CO2/yr\n",
        "Add emissions",
    );
    fetcher
        .fetch("common-definitions", &repository, target.path())
        .unwrap();

    target
        .child("definitions/variable/emissions.yaml")
        .assert(predicate::path::is_file());
    assert_eq!(head_of(target.path()), Some(latest));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_release_pin_is_checked_out() {
    let origin = GitFixture::new().with_definitions();
    let v1 = origin.tag("v1.0.0");
    origin.commit(
        "definitions/region/regions.yaml",
        "- common:\n  - World\n  - R5_ASIA\n",
        "Add R5 regions",
    );
    let workspace = TempDir::new().unwrap();
    let target = workspace.child("common-definitions");

    let repository = Repository::pinned(origin.url(), Pin::Release("v1.0.0".to_string()));
    RepositoryFetcher::new()
        .fetch("common-definitions", &repository, target.path())
        .unwrap();

    assert_eq!(head_of(target.path()), Some(v1));
    target
        .child("definitions/region/regions.yaml")
        .assert(predicate::str::contains("R5_ASIA").not());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_release_pin_on_branch_is_checked_out() {
    let origin = GitFixture::new().with_definitions();
    let develop = origin.branch(
        "develop",
        "definitions/region/regions.yaml",
        "- common:\n  - World\n  - R10_AFRICA\n",
    );
    let workspace = TempDir::new().unwrap();
    let target = workspace.child("common-definitions");
    let repository = Repository::pinned(origin.url(), Pin::Release("develop".to_string()));
    let fetcher = RepositoryFetcher::new();

    fetcher
        .fetch("common-definitions", &repository, target.path())
        .unwrap();
    assert_eq!(head_of(target.path()), Some(develop.clone()));
    target
        .child("definitions/region/regions.yaml")
        .assert(predicate::str::contains("R10_AFRICA"));

    // Already at the branch commit, fetching again keeps it
    fetcher
        .fetch("common-definitions", &repository, target.path())
        .unwrap();
    assert_eq!(head_of(target.path()), Some(develop));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_hash_pin_is_checked_out() {
    let origin = GitFixture::new().with_definitions();
    let first = origin.head();
    origin.commit("README.md", "# Definitions\n", "Add readme");
    let workspace = TempDir::new().unwrap();
    let target = workspace.child("common-definitions");

    let repository = Repository::pinned(origin.url(), Pin::Hash(first.clone()));
    RepositoryFetcher::new()
        .fetch("common-definitions", &repository, target.path())
        .unwrap();

    assert_eq!(head_of(target.path()), Some(first));
    target.child("README.md").assert(predicate::path::missing());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_changed_release_is_checked_out() {
    let origin = GitFixture::new().with_definitions();
    origin.tag("v1.0.0");
    let workspace = TempDir::new().unwrap();
    let target = workspace.child("common-definitions");
    let fetcher = RepositoryFetcher::new();

    let v1 = Repository::pinned(origin.url(), Pin::Release("v1.0.0".to_string()));
    fetcher.fetch("common-definitions", &v1, target.path()).unwrap();

    origin.commit("README.md", "# Definitions\n", "Add readme");
    let v2_commit = origin.tag("v2.0.0");
    let v2 = Repository::pinned(origin.url(), Pin::Release("v2.0.0".to_string()));
    fetcher.fetch("common-definitions", &v2, target.path()).unwrap();

    assert_eq!(head_of(target.path()), Some(v2_commit));
    target.child("README.md").assert(predicate::path::is_file());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_unknown_release_fails_without_leaving_a_checkout() {
    let origin = GitFixture::new().with_definitions();
    let workspace = TempDir::new().unwrap();
    let target = workspace.child("common-definitions");

    let repository = Repository::pinned(origin.url(), Pin::Release("v9.9.9".to_string()));
    let err = RepositoryFetcher::new()
        .fetch("common-definitions", &repository, target.path())
        .unwrap_err();

    assert!(matches!(err, Error::GitCheckout { ref revision, .. } if revision == "v9.9.9"));
    target.assert(predicate::path::missing());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_changed_url_is_recloned() {
    testing_logger::setup();
    let first = GitFixture::new().with_definitions();
    let second = GitFixture::new();
    second.commit("definitions/region/other.yaml", "- other:\n  - Mars\n", "Init");
    let workspace = TempDir::new().unwrap();
    let target = workspace.child("common-definitions");
    let fetcher = RepositoryFetcher::new();

    fetcher
        .fetch("common-definitions", &Repository::new(first.url()), target.path())
        .unwrap();
    fetcher
        .fetch("common-definitions", &Repository::new(second.url()), target.path())
        .unwrap();

    assert_eq!(git::remote_url(target.path()).unwrap(), Some(second.url()));
    target
        .child("definitions/region/other.yaml")
        .assert(predicate::path::is_file());
    target
        .child("definitions/region/regions.yaml")
        .assert(predicate::path::missing());

    testing_logger::validate(|logs| {
        assert!(logs
            .iter()
            .any(|log| log.level == log::Level::Warn
                && log.body.contains("Repository URL changed for 'common-definitions'")));
    });
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_from_file_resolves_next_to_config() {
    let origin = GitFixture::new().with_definitions();
    let project = TempDir::new().unwrap();
    let config_file = project.child("nomenclature.yaml");
    config_file
        .write_str(&configs::SHARED.replace("{url}", &origin.url()))
        .unwrap();

    let config = NomenclatureConfig::from_file(config_file.path()).unwrap();

    let resolved = config.resolved_repositories().unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(
        config.local_path("common-definitions"),
        Some(project.child("common-definitions").path())
    );

    let region = config.dimension_sources(Dimension::Region).unwrap();
    let variable = config.dimension_sources(Dimension::Variable).unwrap();
    let mappings = config.mapping_sources().unwrap();
    assert!(region[0].path.join("regions.yaml").is_file());
    assert!(variable[0].path.join("variables.yaml").is_file());
    assert!(mappings[0].path.join("model.yaml").is_file());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_from_file_with_release() {
    let origin = GitFixture::new().with_definitions();
    let v1 = origin.tag("v1.0.0");
    origin.commit("README.md", "# Definitions\n", "Add readme");
    let project = TempDir::new().unwrap();
    let config_file = project.child("nomenclature.yaml");
    config_file
        .write_str(
            &configs::RELEASE
                .replace("{url}", &origin.url())
                .replace("{release}", "v1.0.0"),
        )
        .unwrap();

    let config = NomenclatureConfig::from_file(config_file.path()).unwrap();

    let local_path = config.local_path("common-definitions").unwrap();
    assert_eq!(head_of(local_path), Some(v1));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_double_stacked_external_repo_raises() {
    let nested = std::fs::read_to_string(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/testdata/double_stacked_external_repo/nomenclature.yaml"),
    )
    .unwrap();
    let origin = GitFixture::new().with_definitions();
    origin.commit("nomenclature.yaml", &nested, "Declare external repositories");

    let project = TempDir::new().unwrap();
    let config_file = project.child("nomenclature.yaml");
    config_file
        .write_str(&configs::SHARED.replace("{url}", &origin.url()))
        .unwrap();

    let err = NomenclatureConfig::from_file(config_file.path()).unwrap_err();
    assert!(matches!(err, Error::DoubleStacking { ref name, .. } if name == "common-definitions"));
    assert!(err
        .to_string()
        .contains("External repos cannot again refer to external repos"));
}
