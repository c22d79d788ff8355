//! Staged batch - normalized rows waiting for a migrate

use serde::{Deserialize, Serialize};
use crate::record::{ArtifactRow, ColorRow, MediaRow, RawRecord};

/// What a new collection does with rows that are already staged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagePolicy {
    /// Drop the previous batch; one category in flight at a time
    #[default]
    Replace,
    /// Append to the previous batch across collections
    Accumulate,
}

/// Normalized rows held in memory between collect and migrate.
///
/// The three lists stay index-aligned for metadata and media: the Nth raw
/// record staged produced the Nth entry of both.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StagedBatch {
    pub artifacts: Vec<ArtifactRow>,
    pub media: Vec<MediaRow>,
    pub colors: Vec<ColorRow>,
}

impl StagedBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize records into a fresh batch
    pub fn from_records(records: &[RawRecord]) -> Self {
        let mut batch = Self::new();
        batch.extend_from_records(records);
        batch
    }

    /// Normalize records and append them, preserving input order
    pub fn extend_from_records(&mut self, records: &[RawRecord]) {
        for record in records {
            self.artifacts.push(record.artifact_row());
            self.media.push(record.media_row());
            self.colors.extend(record.color_rows());
        }
    }

    /// Stage a collection result according to the policy
    pub fn stage(&mut self, records: &[RawRecord], policy: StagePolicy) {
        if policy == StagePolicy::Replace {
            self.clear();
        }
        self.extend_from_records(records);
    }

    pub fn clear(&mut self) {
        self.artifacts.clear();
        self.media.clear();
        self.colors.clear();
    }

    /// A batch with no artifacts has nothing worth migrating
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Counts plus the first `limit` rows of each list
    pub fn preview(&self, limit: usize) -> StagedPreview {
        StagedPreview {
            counts: self.counts(),
            artifacts: self.artifacts.iter().take(limit).cloned().collect(),
            media: self.media.iter().take(limit).cloned().collect(),
            colors: self.colors.iter().take(limit).cloned().collect(),
        }
    }

    pub fn counts(&self) -> StagedCounts {
        StagedCounts {
            artifacts: self.artifacts.len(),
            media: self.media.len(),
            colors: self.colors.len(),
        }
    }
}

/// Row counts of a staged batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StagedCounts {
    pub artifacts: usize,
    pub media: usize,
    pub colors: usize,
}

impl std::fmt::Display for StagedCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} artifacts, {} media rows, {} colors",
            self.artifacts, self.media, self.colors
        )
    }
}

/// Leading rows of a staged batch, for inspection before a migrate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagedPreview {
    pub counts: StagedCounts,
    pub artifacts: Vec<ArtifactRow>,
    pub media: Vec<MediaRow>,
    pub colors: Vec<ColorRow>,
}
