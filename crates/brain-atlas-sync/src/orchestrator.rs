// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Synchronization run.

A run moves through fixed steps:

1. Fetch the structure ontology (the only fatal failure) and save it.
2. Resolve target datasets for the mode.
3. Keep the targets that declare the configured species.
4. Open the caches and invalidate the datasets about to be reprocessed.
5. Process datasets one after another: a sequential probe phase, then a
   bounded worker pool for the remaining assets.
6. Consolidate the caches into the listings, carry forward datasets
   outside this run's scope, rebuild the region table and mesh manifest.
7. Write the checkpoint.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use brain_atlas_cache::{CacheLoad, CacheService, Checkpoint, CheckpointMode, LabelStatus};
use brain_atlas_config::AtlasConfig;
use brain_atlas_regions::{MeshDirectory, MeshPacing, MeshSetPlanner, MeshStore, RegionAggregator};
use brain_atlas_services::{
    collect_all_datasets, collect_assets, dataset_has_species, datasets_modified_since,
    AllenAtlasClient, AssetSummary, CatalogService, CommandContentExtractor, ContentExtractor,
    DandiCatalogClient, GeometrySource, OntologySource,
};
use brain_atlas_structures::{subject_of, LocationMatcher, StructureGraph, StructureId};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::consolidate::{build_asset_listing, build_electrode_listing, carry_forward};
use crate::error::{SyncError, SyncResult};
use crate::exclusions::ExclusionRules;
use crate::outputs::OutputStore;
use crate::request::{RunOutcome, SyncMode, SyncReport, SyncRequest};
use crate::worker::AssetWorker;

/// Datasets selected for a run
#[derive(Debug)]
struct Targets {
    mode: CheckpointMode,
    ids: BTreeSet<String>,
    /// Caches start empty and nothing is carried forward
    full: bool,
    /// Selected by modification since a checkpoint
    since_checkpoint: bool,
}

/// How one dataset's processing ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DatasetOutcome {
    NoAssets,
    Processed,
    EarlyStopped,
}

/// Drives synchronization runs against the collaborator services
pub struct SyncOrchestrator {
    config: AtlasConfig,
    catalog: Arc<dyn CatalogService>,
    extractor: Arc<dyn ContentExtractor>,
    ontology: Arc<dyn OntologySource>,
    geometry: Arc<dyn GeometrySource>,
    meshes: Arc<dyn MeshStore>,
    exclusions: ExclusionRules,
}

impl SyncOrchestrator {
    /// Orchestrator over the given collaborators
    ///
    /// Meshes are kept in the configured mesh directory and the default
    /// exclusion rules apply.
    pub fn new(
        config: AtlasConfig,
        catalog: Arc<dyn CatalogService>,
        extractor: Arc<dyn ContentExtractor>,
        ontology: Arc<dyn OntologySource>,
        geometry: Arc<dyn GeometrySource>,
    ) -> Self {
        let meshes: Arc<dyn MeshStore> = Arc::new(MeshDirectory::new(config.mesh_dir()));
        Self {
            config,
            catalog,
            extractor,
            ontology,
            geometry,
            meshes,
            exclusions: ExclusionRules::with_defaults(),
        }
    }

    /// Orchestrator over the DANDI catalog, the Allen atlas and the
    /// configured extraction helper
    pub fn from_config(config: AtlasConfig) -> SyncResult<Self> {
        let catalog = Arc::new(DandiCatalogClient::new(&config.catalog, &config.retry)?);
        let extractor = Arc::new(CommandContentExtractor::new(&config.extractor, &config.retry));
        let atlas = Arc::new(AllenAtlasClient::new(
            &config.ontology,
            &config.geometry,
            &config.retry,
        )?);
        Ok(Self::new(config, catalog, extractor, atlas.clone(), atlas))
    }

    pub fn with_mesh_store(mut self, meshes: Arc<dyn MeshStore>) -> Self {
        self.meshes = meshes;
        self
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionRules) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Execute one synchronization run
    pub async fn run(&self, request: &SyncRequest) -> SyncResult<SyncReport> {
        let started = Instant::now();
        let outputs = OutputStore::new(&self.config.system.data_dir, &self.config.outputs);

        info!(target: "brain-atlas-sync", "Step 1: Fetching structure graph");
        let graph = self.load_ontology(&outputs).await?;

        info!(target: "brain-atlas-sync", "Step 2: Resolving target dandisets");
        let targets = self.resolve_targets(&request.mode, &outputs).await?;

        if targets.since_checkpoint && targets.ids.is_empty() {
            info!(target: "brain-atlas-sync", "No changes detected");
            Checkpoint::now(targets.mode, 0, 0, 0).save(&outputs.checkpoint_path())?;
            let mut report = SyncReport::new(targets.mode, RunOutcome::NoChanges);
            report.elapsed = started.elapsed();
            return Ok(report);
        }

        info!(target: "brain-atlas-sync", "Step 3: Filtering by species");
        let eligible = self.filter_species(&targets.ids).await;

        let mut report = SyncReport::new(targets.mode, RunOutcome::Completed);
        report.dandisets_checked = targets.ids.len();
        report.dandisets_updated = eligible.len();

        if eligible.is_empty() {
            info!(target: "brain-atlas-sync", "No eligible dandisets to process");
            Checkpoint::now(targets.mode, targets.ids.len(), 0, 0).save(&outputs.checkpoint_path())?;
            report.outcome = RunOutcome::NoEligibleDatasets;
            report.elapsed = started.elapsed();
            return Ok(report);
        }

        info!(target: "brain-atlas-sync", "Step 4: Loading caches");
        let cache = Arc::new(self.open_cache(&targets, request.bypass_cache)?);
        if !targets.full {
            let (labels, electrodes) = cache.invalidate(&eligible);
            if labels > 0 || electrodes > 0 {
                info!(
                    target: "brain-atlas-sync",
                    "Invalidated {} label + {} electrode cache entries for modified dandisets",
                    labels,
                    electrodes
                );
            }
        }

        let workers = request.workers.max(1);
        info!(
            target: "brain-atlas-sync",
            "Step 5: Processing {} dandisets ({} workers)",
            eligible.len(),
            workers
        );
        let worker = Arc::new(AssetWorker::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.extractor),
            LocationMatcher::new(Arc::clone(&graph)),
            Arc::clone(&cache),
        ));

        for dataset_id in &eligible {
            info!(target: "brain-atlas-sync", "--- Dandiset {} ---", dataset_id);
            match self.sync_dataset(dataset_id, &worker, workers).await {
                Ok(DatasetOutcome::EarlyStopped) => {
                    report.early_stopped.insert(dataset_id.clone());
                }
                Ok(DatasetOutcome::Processed | DatasetOutcome::NoAssets) => {}
                Err(e) => {
                    error!(target: "brain-atlas-sync", "Dandiset {} failed: {}", dataset_id, e);
                    report.failures.insert(dataset_id.clone(), e.to_string());
                }
            }
        }

        info!(target: "brain-atlas-sync", "Step 6: Building data files");
        // outside full mode a failed dataset keeps its previous outputs;
        // a full rebuild carries nothing forward
        let processed: BTreeSet<String> = eligible
            .iter()
            .filter(|id| !report.failures.contains_key(*id))
            .cloned()
            .collect();
        let (regions, missing_meshes) = self
            .consolidate(&graph, &cache, &outputs, &processed, targets.full)
            .await?;

        let counters = cache.counters();
        Checkpoint::now(
            targets.mode,
            targets.ids.len(),
            eligible.len(),
            counters.assets_processed,
        )
        .save(&outputs.checkpoint_path())?;

        report.assets_processed = counters.assets_processed;
        report.cache_hits = counters.cache_hits;
        report.errors = counters.errors;
        report.regions = regions;
        report.missing_meshes = missing_meshes;
        report.elapsed = started.elapsed();
        Ok(report)
    }

    async fn load_ontology(&self, outputs: &OutputStore) -> SyncResult<Arc<StructureGraph>> {
        let raw = self
            .ontology
            .fetch_structure_graph()
            .await
            .map_err(|e| SyncError::Ontology(e.to_string()))?;
        let graph = StructureGraph::from_json_tree(&raw).map_err(|e| SyncError::Ontology(e.to_string()))?;
        info!(target: "brain-atlas-sync", "  {} structures", graph.len());

        outputs.write_structure_graph(&raw)?;
        debug!(
            target: "brain-atlas-sync",
            "Saved {}",
            outputs.structure_graph_path().display()
        );
        Ok(Arc::new(graph))
    }

    async fn resolve_targets(&self, mode: &SyncMode, outputs: &OutputStore) -> SyncResult<Targets> {
        let checkpoint = match mode {
            SyncMode::Targeted(ids) => {
                info!(target: "brain-atlas-sync", "  Targeting {} specified dandisets", ids.len());
                return Ok(Targets {
                    mode: CheckpointMode::Targeted,
                    ids: ids.clone(),
                    full: false,
                    since_checkpoint: false,
                });
            }
            SyncMode::Full => None,
            SyncMode::Incremental => match Checkpoint::load(&outputs.checkpoint_path()) {
                Ok(Some(checkpoint)) => Some(checkpoint),
                Ok(None) => {
                    warn!(target: "brain-atlas-sync", "No checkpoint found, falling back to full mode");
                    None
                }
                Err(e) => {
                    warn!(
                        target: "brain-atlas-sync",
                        "Unreadable checkpoint ({}), falling back to full mode",
                        e
                    );
                    None
                }
            },
        };

        match checkpoint {
            Some(checkpoint) => {
                info!(
                    target: "brain-atlas-sync",
                    "  Last updated: {}",
                    checkpoint.timestamp.format("%Y-%m-%dT%H:%M:%SZ")
                );
                let ids: BTreeSet<String> =
                    datasets_modified_since(self.catalog.as_ref(), checkpoint.timestamp)
                        .await?
                        .into_iter()
                        .map(|dataset| dataset.identifier)
                        .collect();
                info!(target: "brain-atlas-sync", "  {} dandisets modified since last update", ids.len());
                Ok(Targets {
                    mode: CheckpointMode::Incremental,
                    ids,
                    full: false,
                    since_checkpoint: true,
                })
            }
            None => {
                let ids: BTreeSet<String> = collect_all_datasets(self.catalog.as_ref())
                    .await?
                    .into_iter()
                    .map(|dataset| dataset.identifier)
                    .collect();
                info!(target: "brain-atlas-sync", "  Found {} dandisets for full rebuild", ids.len());
                Ok(Targets {
                    mode: CheckpointMode::Full,
                    ids,
                    full: true,
                    since_checkpoint: false,
                })
            }
        }
    }

    /// Targets declaring the configured species, probed in sorted order
    ///
    /// A failed probe excludes only that dataset.
    async fn filter_species(&self, ids: &BTreeSet<String>) -> BTreeSet<String> {
        let taxon = &self.config.sync.species_taxon;
        let mut eligible = BTreeSet::new();
        for dataset_id in ids {
            match dataset_has_species(self.catalog.as_ref(), dataset_id, taxon).await {
                Ok(true) => {
                    eligible.insert(dataset_id.clone());
                }
                Ok(false) => {
                    debug!(target: "brain-atlas-sync", "{} skipped (species)", dataset_id);
                }
                Err(e) => {
                    warn!(target: "brain-atlas-sync", "Species check failed for {}: {}", dataset_id, e);
                }
            }
        }
        info!(
            target: "brain-atlas-sync",
            "  {} dandisets with taxon {}, {} skipped",
            eligible.len(),
            taxon,
            ids.len() - eligible.len()
        );
        eligible
    }

    fn open_cache(&self, targets: &Targets, bypass: bool) -> SyncResult<CacheService> {
        let load = if targets.full || bypass {
            CacheLoad::Empty
        } else {
            CacheLoad::Warm
        };
        let cache_dir = &self.config.system.cache_dir;
        Ok(CacheService::open(
            &cache_dir.join(&self.config.outputs.label_cache_file),
            &cache_dir.join(&self.config.outputs.electrode_cache_file),
            load,
        )?)
    }

    async fn sync_dataset(
        &self,
        dataset_id: &str,
        worker: &Arc<AssetWorker>,
        workers: usize,
    ) -> SyncResult<DatasetOutcome> {
        let assets = collect_assets(self.catalog.as_ref(), dataset_id).await?;
        info!(target: "brain-atlas-sync", "  {} NWB assets", assets.len());

        let work = work_list(dataset_id, assets, &self.exclusions);
        if work.is_empty() {
            return Ok(DatasetOutcome::NoAssets);
        }

        let probe_len = self.config.sync.probe_size.min(work.len());
        let (probe, remaining) = work.split_at(probe_len);

        let mut found_match = false;
        for asset in probe {
            if worker.process(dataset_id, asset).await? == LabelStatus::Matched {
                found_match = true;
            }
        }

        if !found_match && !remaining.is_empty() {
            info!(
                target: "brain-atlas-sync",
                "  Skipping remaining {} assets (no matches in first {})",
                remaining.len(),
                probe.len()
            );
            return Ok(DatasetOutcome::EarlyStopped);
        }

        run_pool(dataset_id, remaining.to_vec(), worker, workers).await?;
        Ok(DatasetOutcome::Processed)
    }

    /// Rebuild every consolidated output; returns (regions, missing meshes)
    async fn consolidate(
        &self,
        graph: &StructureGraph,
        cache: &CacheService,
        outputs: &OutputStore,
        processed: &BTreeSet<String>,
        full: bool,
    ) -> SyncResult<(usize, usize)> {
        let hidden: HashSet<StructureId> =
            self.config.ontology.hidden_region_ids.iter().copied().collect();
        let mut assets = build_asset_listing(&cache.label_snapshot(), &hidden);
        let mut electrodes = build_electrode_listing(&cache.electrode_snapshot());

        if !full {
            carry_forward(&mut assets, outputs.load_assets()?, processed);
            carry_forward(&mut electrodes, outputs.load_electrodes()?, processed);
        }

        outputs.write_assets(&assets)?;
        outputs.write_electrodes(&electrodes)?;

        info!(target: "brain-atlas-sync", "Step 7: Building region table");
        let regions = RegionAggregator::new(graph).aggregate(&assets);
        outputs.write_regions(&regions)?;

        info!(target: "brain-atlas-sync", "Step 8: Checking meshes");
        let pacing = MeshPacing {
            every: self.config.geometry.pause_every,
            pause: Duration::from_millis(self.config.geometry.pause_millis),
        };
        let manifest = MeshSetPlanner::new(graph, self.config.ontology.outline_structure_id)
            .plan(&regions)
            .reconcile(self.meshes.as_ref(), self.geometry.as_ref(), pacing)
            .await;
        outputs.write_mesh_manifest(&manifest)?;

        Ok((regions.len(), manifest.no_mesh.len()))
    }
}

/// Processing order of a dataset's assets
///
/// Excluded assets are dropped; the rest are grouped by subject, subjects
/// in sorted order and assets within a subject sorted by path.
pub(crate) fn work_list(
    dataset_id: &str,
    assets: Vec<AssetSummary>,
    exclusions: &ExclusionRules,
) -> Vec<AssetSummary> {
    let mut by_subject: BTreeMap<String, Vec<AssetSummary>> = BTreeMap::new();
    let mut excluded = 0usize;
    for asset in assets {
        if exclusions.excludes(dataset_id, &asset.path) {
            excluded += 1;
            continue;
        }
        by_subject
            .entry(subject_of(&asset.path).to_string())
            .or_default()
            .push(asset);
    }
    if excluded > 0 {
        debug!(target: "brain-atlas-sync", "  Excluded {} legacy file variants", excluded);
    }

    by_subject
        .into_values()
        .flat_map(|mut assets| {
            assets.sort_by(|a, b| a.path.cmp(&b.path));
            assets
        })
        .collect()
}

/// Process assets on at most `workers` concurrent tasks
///
/// Every task runs to completion; the first failure is returned afterwards.
async fn run_pool(
    dataset_id: &str,
    assets: Vec<AssetSummary>,
    worker: &Arc<AssetWorker>,
    workers: usize,
) -> SyncResult<()> {
    if assets.is_empty() {
        return Ok(());
    }

    let semaphore = Arc::new(Semaphore::new(workers));
    let dataset_id: Arc<str> = Arc::from(dataset_id);
    let mut join_set: JoinSet<SyncResult<LabelStatus>> = JoinSet::new();

    for asset in assets {
        let sem = Arc::clone(&semaphore);
        let worker = Arc::clone(worker);
        let dataset_id = Arc::clone(&dataset_id);
        join_set.spawn(async move {
            let _permit = sem
                .acquire()
                .await
                .map_err(|_| SyncError::Worker("worker pool closed".into()))?;
            worker.process(&dataset_id, &asset).await
        });
    }

    let mut first_error = None;
    while let Some(joined) = join_set.join_next().await {
        let result = joined
            .map_err(|e| SyncError::Worker(format!("asset task panicked: {e}")))
            .and_then(|result| result);
        if let Err(e) = result {
            error!(target: "brain-atlas-sync", "  Worker error in {}: {}", dataset_id, e);
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
