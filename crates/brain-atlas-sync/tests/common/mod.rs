// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-process collaborators for orchestrator tests

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use brain_atlas_config::AtlasConfig;
use brain_atlas_services::{
    AssetSummary, CatalogService, ContentExtractor, Coordinate, DatasetSummary, GeometrySource,
    LocationSet, OntologySource, Page, PageCursor, ServiceError, ServiceResult,
};
use brain_atlas_sync::SyncOrchestrator;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};

/// Mouse-brain excerpt: root > grey > (Isocortex > (VISp, VISrl), CA1)
pub fn structure_graph() -> Value {
    json!({
        "success": true,
        "msg": [{
            "id": 997, "acronym": "root", "name": "root", "color_hex_triplet": "FFFFFF",
            "parent_structure_id": null,
            "children": [{
                "id": 8, "acronym": "grey", "name": "Basic cell groups and regions",
                "color_hex_triplet": "BFDAE3", "parent_structure_id": 997,
                "children": [
                    {
                        "id": 315, "acronym": "Isocortex", "name": "Isocortex",
                        "color_hex_triplet": "70FF71", "parent_structure_id": 8,
                        "children": [
                            {"id": 385, "acronym": "VISp", "name": "Primary visual area",
                             "color_hex_triplet": "08858C", "parent_structure_id": 315, "children": []},
                            {"id": 417, "acronym": "VISrl", "name": "Rostrolateral visual area",
                             "color_hex_triplet": "009FAC", "parent_structure_id": 315, "children": []}
                        ]
                    },
                    {"id": 382, "acronym": "CA1", "name": "Field CA1",
                     "color_hex_triplet": "7ED04B", "parent_structure_id": 8, "children": []}
                ]
            }]
        }]
    })
}

/// One dataset of the fake catalog
#[derive(Clone)]
pub struct FakeDataset {
    pub modified: DateTime<Utc>,
    pub mouse: bool,
    pub assets: Vec<AssetSummary>,
}

#[derive(Default)]
pub struct FakeCatalog {
    pub datasets: Mutex<BTreeMap<String, FakeDataset>>,
    /// Datasets whose asset listing fails
    pub broken_listings: Mutex<HashSet<String>>,
    /// Datasets whose metadata lookup fails
    pub broken_metadata: Mutex<HashSet<String>>,
    pub asset_page_calls: Mutex<HashMap<String, usize>>,
    pub metadata_calls: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn add(&self, id: &str, modified: DateTime<Utc>, mouse: bool, paths: &[&str]) {
        let assets = paths
            .iter()
            .map(|path| AssetSummary {
                asset_id: asset_id_of(path),
                path: path.to_string(),
            })
            .collect();
        self.datasets.lock().insert(
            id.to_string(),
            FakeDataset {
                modified,
                mouse,
                assets,
            },
        );
    }
}

/// Asset ids are derived from paths so tests can name assets by path
pub fn asset_id_of(path: &str) -> String {
    path.replace(['/', '.'], "-")
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn dataset_page(&self, cursor: Option<&PageCursor>) -> ServiceResult<Page<DatasetSummary>> {
        let mut datasets: Vec<DatasetSummary> = self
            .datasets
            .lock()
            .iter()
            .map(|(id, ds)| DatasetSummary {
                identifier: id.clone(),
                modified: ds.modified,
            })
            .collect();
        datasets.sort_by(|a, b| b.modified.cmp(&a.modified));

        // two datasets per page
        let start: usize = cursor.map_or(0, |c| c.parse().unwrap_or(0));
        let end = (start + 2).min(datasets.len());
        let next = (end < datasets.len()).then(|| end.to_string());
        Ok(Page {
            items: datasets[start..end].to_vec(),
            next,
        })
    }

    async fn asset_page(
        &self,
        dataset_id: &str,
        _cursor: Option<&PageCursor>,
    ) -> ServiceResult<Page<AssetSummary>> {
        *self
            .asset_page_calls
            .lock()
            .entry(dataset_id.to_string())
            .or_default() += 1;
        if self.broken_listings.lock().contains(dataset_id) {
            return Err(ServiceError::Http {
                status: 503,
                url: format!("fake://{}/assets", dataset_id),
            });
        }
        let assets = self
            .datasets
            .lock()
            .get(dataset_id)
            .map(|ds| ds.assets.clone())
            .ok_or_else(|| ServiceError::NotFound {
                resource: "dandiset".into(),
                id: dataset_id.into(),
            })?;
        Ok(Page::last(assets))
    }

    async fn dataset_metadata(&self, dataset_id: &str) -> ServiceResult<Value> {
        self.metadata_calls.lock().push(dataset_id.to_string());
        if self.broken_metadata.lock().contains(dataset_id) {
            return Err(ServiceError::Timeout(format!("fake://{}", dataset_id)));
        }
        let mouse = self
            .datasets
            .lock()
            .get(dataset_id)
            .map_or(false, |ds| ds.mouse);
        let species = if mouse {
            "http://purl.obolibrary.org/obo/NCBITaxon_10090"
        } else {
            "http://purl.obolibrary.org/obo/NCBITaxon_9606"
        };
        Ok(json!({"assetsSummary": {"species": [{"identifier": species}]}}))
    }

    fn asset_locator(&self, dataset_id: &str, asset_id: &str) -> String {
        format!("{}/{}", dataset_id, asset_id)
    }
}

/// Extractor answering from per-locator tables
#[derive(Default)]
pub struct FakeExtractor {
    pub locations: Mutex<HashMap<String, LocationSet>>,
    pub coordinates: Mutex<HashMap<String, Vec<Coordinate>>>,
    /// Locators whose reads fail
    pub broken: Mutex<HashSet<String>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeExtractor {
    pub fn set_locations(&self, dataset_id: &str, path: &str, electrodes: &[&str]) {
        self.locations.lock().insert(
            format!("{}/{}", dataset_id, asset_id_of(path)),
            LocationSet {
                electrodes: electrodes.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
        );
    }

    pub fn set_coordinates(&self, dataset_id: &str, path: &str, coords: Vec<Coordinate>) {
        self.coordinates
            .lock()
            .insert(format!("{}/{}", dataset_id, asset_id_of(path)), coords);
    }

    /// Number of extraction calls for one dataset
    pub fn calls_for(&self, dataset_id: &str) -> usize {
        let prefix = format!("{}/", dataset_id);
        self.calls.lock().iter().filter(|l| l.starts_with(&prefix)).count()
    }
}

#[async_trait]
impl ContentExtractor for FakeExtractor {
    async fn extract_locations(&self, locator: &str) -> ServiceResult<LocationSet> {
        self.calls.lock().push(locator.to_string());
        if self.broken.lock().contains(locator) {
            return Err(ServiceError::Extraction(format!("truncated file {}", locator)));
        }
        Ok(self.locations.lock().get(locator).cloned().unwrap_or_default())
    }

    async fn extract_coordinates(&self, locator: &str) -> ServiceResult<Vec<Coordinate>> {
        self.calls.lock().push(locator.to_string());
        if self.broken.lock().contains(locator) {
            return Err(ServiceError::Extraction(format!("truncated file {}", locator)));
        }
        Ok(self.coordinates.lock().get(locator).cloned().unwrap_or_default())
    }
}

pub struct FakeOntology {
    pub payload: Option<Value>,
}

#[async_trait]
impl OntologySource for FakeOntology {
    async fn fetch_structure_graph(&self) -> ServiceResult<Value> {
        self.payload.clone().ok_or_else(|| ServiceError::Http {
            status: 500,
            url: "fake://structure_graph".into(),
        })
    }
}

#[derive(Default)]
pub struct FakeGeometry {
    pub requested: Mutex<Vec<u32>>,
    pub unavailable: HashSet<u32>,
}

#[async_trait]
impl GeometrySource for FakeGeometry {
    async fn fetch_geometry(&self, structure_id: u32) -> ServiceResult<Vec<u8>> {
        self.requested.lock().push(structure_id);
        if self.unavailable.contains(&structure_id) {
            return Err(ServiceError::NotFound {
                resource: "mesh".into(),
                id: structure_id.to_string(),
            });
        }
        Ok(format!("o {}\nv 0 0 0\n", structure_id).into_bytes())
    }
}

/// Collaborators plus a configuration rooted in a temporary directory
pub struct Harness {
    pub config: AtlasConfig,
    pub catalog: Arc<FakeCatalog>,
    pub extractor: Arc<FakeExtractor>,
    pub geometry: Arc<FakeGeometry>,
    pub ontology: Option<Value>,
}

impl Harness {
    pub fn new(root: &Path) -> Self {
        let mut config = AtlasConfig::default();
        config.system.data_dir = root.join("data");
        config.system.cache_dir = root.join("cache");
        config.geometry.pause_every = 0;
        config.sync.workers = 3;

        Self {
            config,
            catalog: Arc::new(FakeCatalog::default()),
            extractor: Arc::new(FakeExtractor::default()),
            geometry: Arc::new(FakeGeometry::default()),
            ontology: Some(structure_graph()),
        }
    }

    pub fn orchestrator(&self) -> SyncOrchestrator {
        SyncOrchestrator::new(
            self.config.clone(),
            self.catalog.clone(),
            self.extractor.clone(),
            Arc::new(FakeOntology {
                payload: self.ontology.clone(),
            }),
            self.geometry.clone(),
        )
    }

    pub fn data_file(&self, name: &str) -> Value {
        let path = self.config.system.data_dir.join(name);
        let bytes = std::fs::read(&path).unwrap_or_else(|e| panic!("{}: {}", path.display(), e));
        serde_json::from_slice(&bytes).unwrap()
    }

    pub fn data_bytes(&self, name: &str) -> Vec<u8> {
        std::fs::read(self.config.system.data_dir.join(name)).unwrap()
    }
}
