// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Probe-phase early stopping and failure containment

mod common;

use brain_atlas_cache::{CacheLoad, CacheService, LabelStatus};
use brain_atlas_sync::{SyncError, SyncMode, SyncRequest};
use chrono::{Duration, Utc};
use common::Harness;
use serde_json::json;

fn paths(prefix: &str, n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("sub-{}/sub-{}_ses-{:02}_ecephys.nwb", prefix, prefix, i))
        .collect()
}

fn add(harness: &Harness, id: &str, paths: &[String]) {
    let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    harness
        .catalog
        .add(id, Utc::now() - Duration::days(1), true, &refs);
}

fn request(mode: SyncMode, workers: usize) -> SyncRequest {
    SyncRequest {
        mode,
        workers,
        bypass_cache: false,
    }
}

fn open_cache(harness: &Harness) -> CacheService {
    let dir = &harness.config.system.cache_dir;
    CacheService::open(
        &dir.join("label_cache.jsonl"),
        &dir.join("electrode_cache.jsonl"),
        CacheLoad::Warm,
    )
    .unwrap()
}

#[tokio::test]
async fn unmatched_probe_stops_the_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    let assets = paths("a", 8);
    add(&harness, "000010", &assets);
    for path in &assets {
        harness.extractor.set_locations("000010", path, &["somewhere odd"]);
    }

    let report = harness.orchestrator().run(&request(SyncMode::Full, 4)).await.unwrap();

    // five probed assets, two reads each, nothing after
    assert_eq!(harness.extractor.calls_for("000010"), 10);
    assert!(report.early_stopped.contains("000010"));
    assert_eq!(report.assets_processed, 5);
    assert!(report.failures.is_empty());

    let cache = open_cache(&harness);
    let labels = cache.label_snapshot();
    assert_eq!(labels.len(), 5);
    assert!(labels.iter().all(|l| l.status == LabelStatus::NoMatch));
    assert_eq!(labels[0].unmatched_locations, vec!["somewhere odd"]);

    // probed assets are still published, in processing order
    let listed = harness.data_file("dandiset_assets.json");
    let listed_paths: Vec<&str> = listed["000010"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["path"].as_str().unwrap())
        .collect();
    let expected: Vec<&str> = assets[..5].iter().map(String::as_str).collect();
    assert_eq!(listed_paths, expected);
}

#[tokio::test]
async fn match_in_probe_processes_everything_in_the_pool() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    let assets = paths("b", 12);
    add(&harness, "000011", &assets);
    harness.extractor.set_locations("000011", &assets[3], &["CA1"]);

    let report = harness.orchestrator().run(&request(SyncMode::Full, 3)).await.unwrap();

    assert!(report.early_stopped.is_empty());
    assert_eq!(report.assets_processed, 12);
    assert_eq!(harness.extractor.calls_for("000011"), 24);
    assert_eq!(open_cache(&harness).len(), (12, 12));
}

#[tokio::test]
async fn short_dataset_without_matches_is_not_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    add(&harness, "000012", &paths("c", 3));

    let report = harness.orchestrator().run(&request(SyncMode::Full, 2)).await.unwrap();
    assert!(report.early_stopped.is_empty());
    assert_eq!(report.assets_processed, 3);

    let labels = open_cache(&harness).label_snapshot();
    assert!(labels.iter().all(|l| l.status == LabelStatus::NoLocations));
}

#[tokio::test]
async fn species_probe_failure_excludes_only_that_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    let good = paths("d", 1);
    add(&harness, "000020", &good);
    add(&harness, "000021", &paths("e", 1));
    harness.extractor.set_locations("000020", &good[0], &["VISp"]);
    harness.catalog.broken_metadata.lock().insert("000021".into());

    let report = harness.orchestrator().run(&request(SyncMode::Full, 2)).await.unwrap();

    assert_eq!(report.dandisets_checked, 2);
    assert_eq!(report.dandisets_updated, 1);
    assert!(report.failures.is_empty());
    assert!(!harness.catalog.asset_page_calls.lock().contains_key("000021"));
    assert_eq!(harness.extractor.calls_for("000021"), 0);
    assert!(harness.data_file("dandiset_assets.json").get("000021").is_none());
    // species probes run in sorted order
    assert_eq!(*harness.catalog.metadata_calls.lock(), vec!["000020", "000021"]);
}

#[tokio::test]
async fn listing_failure_aborts_only_that_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    let good = paths("f", 2);
    add(&harness, "000030", &good);
    add(&harness, "000031", &paths("g", 2));
    harness.extractor.set_locations("000030", &good[0], &["VISp"]);

    // earlier outputs of the dataset whose listing will fail
    let data_dir = harness.config.system.data_dir.clone();
    std::fs::create_dir_all(&data_dir).unwrap();
    std::fs::write(
        data_dir.join("dandiset_assets.json"),
        json!({"000031": [{"path": "sub-g/old.nwb", "asset_id": "old", "regions": []}]}).to_string(),
    )
    .unwrap();
    harness.catalog.broken_listings.lock().insert("000031".into());

    let report = harness
        .orchestrator()
        .run(&request(SyncMode::Targeted(["000030".into(), "000031".into()].into()), 2))
        .await
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert!(report.failures["000031"].contains("503"));
    assert_eq!(report.assets_processed, 2);

    let listing = harness.data_file("dandiset_assets.json");
    assert_eq!(listing["000030"].as_array().unwrap().len(), 2);
    assert_eq!(listing["000031"][0]["asset_id"], "old");
}

#[tokio::test]
async fn full_rebuild_drops_outputs_of_a_failed_listing() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    add(&harness, "000030", &paths("f", 2));
    add(&harness, "000031", &paths("g", 2));

    let data_dir = harness.config.system.data_dir.clone();
    std::fs::create_dir_all(&data_dir).unwrap();
    std::fs::write(
        data_dir.join("dandiset_assets.json"),
        json!({"000031": [{"path": "sub-g/old.nwb", "asset_id": "old", "regions": []}]}).to_string(),
    )
    .unwrap();
    harness.catalog.broken_listings.lock().insert("000031".into());

    let report = harness.orchestrator().run(&request(SyncMode::Full, 2)).await.unwrap();

    assert!(report.failures.contains_key("000031"));
    let listing = harness.data_file("dandiset_assets.json");
    assert_eq!(listing["000030"].as_array().unwrap().len(), 2);
    assert!(listing.get("000031").is_none());
}

#[tokio::test]
async fn unreadable_asset_becomes_an_error_entry() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    let assets = paths("h", 2);
    add(&harness, "000040", &assets);
    harness.extractor.set_locations("000040", &assets[1], &["VISp"]);
    harness
        .extractor
        .broken
        .lock()
        .insert(format!("000040/{}", common::asset_id_of(&assets[0])));

    let report = harness.orchestrator().run(&request(SyncMode::Full, 2)).await.unwrap();
    assert_eq!(report.errors, 1);
    assert_eq!(report.assets_processed, 2);

    let labels = open_cache(&harness).label_snapshot();
    let failed = labels.iter().find(|l| l.status == LabelStatus::Error).unwrap();
    assert!(failed.error.as_deref().unwrap().contains("truncated file"));

    // the failed asset is still listed, without regions
    let listing = harness.data_file("dandiset_assets.json");
    assert!(listing["000040"][0]["regions"].as_array().unwrap().is_empty());
    assert_eq!(listing["000040"][1]["regions"][0]["acronym"], "VISp");
}

#[tokio::test]
async fn missing_ontology_is_fatal_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = Harness::new(dir.path());
    add(&harness, "000050", &paths("i", 1));
    harness.ontology = None;

    let err = harness
        .orchestrator()
        .run(&request(SyncMode::Full, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Ontology(_)));
    assert!(!harness.config.system.data_dir.join("dandiset_assets.json").exists());
    assert!(!harness.config.system.data_dir.join("last_updated.json").exists());
    assert_eq!(harness.extractor.calls_for("000050"), 0);
}

#[tokio::test]
async fn unavailable_meshes_are_listed() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = Harness::new(dir.path());
    let assets = paths("j", 1);
    add(&harness, "000060", &assets);
    harness.extractor.set_locations("000060", &assets[0], &["CA1"]);
    harness.geometry = std::sync::Arc::new(common::FakeGeometry {
        unavailable: [382].into(),
        ..Default::default()
    });

    let report = harness.orchestrator().run(&request(SyncMode::Full, 1)).await.unwrap();
    assert_eq!(report.missing_meshes, 1);

    let manifest = harness.data_file("mesh_manifest.json");
    assert_eq!(manifest["no_mesh"], json!([382]));
    assert_eq!(manifest["data_structures"], json!([8, 382, 997]));
}

#[tokio::test]
async fn bypass_reprocesses_cached_assets() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path());
    let assets = paths("k", 2);
    add(&harness, "000070", &assets);
    harness.extractor.set_locations("000070", &assets[0], &["VISp"]);
    let orchestrator = harness.orchestrator();

    orchestrator.run(&request(SyncMode::Full, 1)).await.unwrap();
    assert_eq!(harness.extractor.calls_for("000070"), 4);

    let mut bypass = request(SyncMode::Targeted(["000070".into()].into()), 1);
    bypass.bypass_cache = true;
    let report = orchestrator.run(&bypass).await.unwrap();
    assert_eq!(report.assets_processed, 2);
    assert_eq!(harness.extractor.calls_for("000070"), 8);

    // both runs appended; the logs were never truncated
    let log = std::fs::read_to_string(harness.config.system.cache_dir.join("label_cache.jsonl")).unwrap();
    assert_eq!(log.lines().count(), 4);
}
