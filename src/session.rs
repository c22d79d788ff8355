//! Session - the trigger surface over one staged batch
//!
//! A session owns the staged batch and the clear gate for one user. The
//! store is opened per action and closed when the action returns.

use std::path::{Path, PathBuf};
use serde::Serialize;
use crate::{Error, Result};
use crate::catalog::QueryCatalog;
use crate::collector::{Collector, PageProgress, PageSource, StopReason};
use crate::config::HarvestConfig;
use crate::eraser::{ClearGate, ClearState, ClearStep};
use crate::staging::{StagePolicy, StagedBatch, StagedCounts};
use crate::storage::{ArtifactStore, ClearReport, ColorPolicy, DbStats, MigrateReport, QueryTable, Table};

/// Collection settings a session runs with
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub page_size: u32,
    pub max_pages: u32,
    pub categories: Vec<String>,
    pub stage_policy: StagePolicy,
    pub color_policy: ColorPolicy,
}

impl From<&HarvestConfig> for SessionOptions {
    fn from(config: &HarvestConfig) -> Self {
        Self {
            page_size: config.collect.page_size,
            max_pages: config.collect.max_pages,
            categories: config.collect.categories.clone(),
            stage_policy: config.collect.stage_policy,
            color_policy: config.migrate.colors,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&HarvestConfig::default())
    }
}

/// Outcome of a collect action
#[derive(Debug, Clone, Serialize)]
pub struct CollectReport {
    pub category: String,
    pub requests: u32,
    /// Raw records fetched by this run
    pub records: usize,
    /// Staged totals after this run
    pub staged: StagedCounts,
    pub stop: StopReason,
}

impl CollectReport {
    pub fn is_partial(&self) -> bool {
        matches!(self.stop, StopReason::RemoteUnavailable(_))
    }
}

/// Outcome of a clear action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "deleted", rename_all = "lowercase")]
pub enum ClearOutcome {
    /// Nothing deleted; the next consecutive clear confirms
    Armed,
    Cleared(ClearReport),
}

pub struct Session {
    db_path: PathBuf,
    source: Box<dyn PageSource>,
    options: SessionOptions,
    staged: StagedBatch,
    gate: ClearGate,
}

impl Session {
    /// Create a session, ensuring the store schema first.
    ///
    /// Fails with `StoreUnavailable` when the database cannot be used.
    pub fn new(db_path: &Path, source: Box<dyn PageSource>, options: SessionOptions) -> Result<Self> {
        ArtifactStore::open(db_path)?;
        tracing::debug!("Session store ready at {}", db_path.display());

        Ok(Self {
            db_path: db_path.to_path_buf(),
            source,
            options,
            staged: StagedBatch::new(),
            gate: ClearGate::new(),
        })
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    pub fn categories(&self) -> &[String] {
        &self.options.categories
    }

    pub fn staged(&self) -> &StagedBatch {
        &self.staged
    }

    pub fn clear_state(&self) -> ClearState {
        self.gate.state()
    }

    fn open_store(&self) -> Result<ArtifactStore> {
        ArtifactStore::open(&self.db_path)
    }

    /// Collect a category into the staged batch
    pub fn collect(&mut self, category: &str) -> Result<CollectReport> {
        self.collect_with(category, &mut |_| {})
    }

    /// Collect a category, reporting each fetched page.
    ///
    /// A remote failure is not an error here: records fetched before it are
    /// staged and the report's stop reason carries the failure.
    pub fn collect_with(
        &mut self,
        category: &str,
        on_page: &mut dyn FnMut(PageProgress),
    ) -> Result<CollectReport> {
        self.gate.disarm();

        let category = self
            .options
            .categories
            .iter()
            .find(|c| c.eq_ignore_ascii_case(category.trim()))
            .cloned()
            .ok_or_else(|| Error::UnknownCategory(category.to_string()))?;

        let collector = Collector::new(
            self.source.as_ref(),
            self.options.page_size,
            self.options.max_pages,
        );
        let collection = collector.collect_with(&category, on_page);

        self.staged.stage(&collection.records, self.options.stage_policy);
        let report = CollectReport {
            category,
            requests: collection.requests,
            records: collection.records.len(),
            staged: self.staged.counts(),
            stop: collection.stop,
        };
        tracing::info!(
            "Collected {} {} records ({}); staged {}",
            report.records,
            report.category,
            report.stop,
            report.staged
        );
        Ok(report)
    }

    /// Persist the staged batch. The batch stays staged afterwards.
    pub fn migrate(&mut self) -> Result<MigrateReport> {
        self.gate.disarm();

        if self.staged.is_empty() {
            return Err(Error::EmptyBatch);
        }

        let mut store = self.open_store()?;
        store.migrate(&self.staged, self.options.color_policy)
    }

    /// Run a catalog query by key or number
    pub fn run_query(&mut self, key: &str) -> Result<QueryTable> {
        self.gate.disarm();

        let store = self.open_store()?;
        QueryCatalog::new(&store).run(key)
    }

    /// First rows of one persisted table
    pub fn preview(&mut self, table: Table, limit: usize) -> Result<QueryTable> {
        self.gate.disarm();

        let store = self.open_store()?;
        store.table_rows(table, limit)
    }

    /// Two-step clear: the first call arms, the second consecutive call
    /// deletes every persisted row, compacts the store and drops the
    /// staged batch.
    pub fn clear(&mut self) -> Result<ClearOutcome> {
        match self.gate.trigger() {
            ClearStep::Armed => {
                tracing::info!("Clear requested; awaiting confirmation");
                Ok(ClearOutcome::Armed)
            }
            ClearStep::Confirmed => {
                let mut store = self.open_store()?;
                let report = store.clear_all()?;
                self.staged.clear();
                Ok(ClearOutcome::Cleared(report))
            }
        }
    }

    /// Cancel a pending clear
    pub fn cancel_clear(&mut self) {
        self.gate.disarm();
    }

    pub fn stats(&mut self) -> Result<DbStats> {
        self.gate.disarm();

        self.open_store()?.stats()
    }
}
