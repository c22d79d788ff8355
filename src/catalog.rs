//! Query catalog - fixed analytical questions over the persisted tables
//!
//! Every entry is parameterless and read-only. Entries are addressed by a
//! stable slug (`byzantine-11th-century`) or by their position (`1`..`25`).

use serde::Serialize;
use crate::{Error, Result};
use crate::storage::{ArtifactStore, QueryTable};

/// One named catalog query
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CatalogEntry {
    pub number: u8,
    pub key: &'static str,
    pub question: &'static str,
    pub sql: &'static str,
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        number: 1,
        key: "byzantine-11th-century",
        question: "List all artifacts from the 11th century belonging to Byzantine culture.",
        sql: "SELECT * FROM artifact_metadata WHERE century LIKE '%11%' AND culture = 'Byzantine'",
    },
    CatalogEntry {
        number: 2,
        key: "unique-cultures",
        question: "What are the unique cultures represented in the artifacts?",
        sql: "SELECT DISTINCT culture FROM artifact_metadata WHERE culture IS NOT NULL",
    },
    CatalogEntry {
        number: 3,
        key: "archaic-period",
        question: "List all artifacts from the Archaic Period.",
        sql: "SELECT * FROM artifact_metadata WHERE period LIKE '%Archaic%'",
    },
    CatalogEntry {
        number: 4,
        key: "titles-by-accession-year",
        question: "List artifact titles ordered by accession year in descending order.",
        sql: "SELECT title, accessionyear FROM artifact_metadata ORDER BY accessionyear DESC",
    },
    CatalogEntry {
        number: 5,
        key: "artifacts-per-department",
        question: "How many artifacts are there per department?",
        sql: "SELECT department, COUNT(*) AS count FROM artifact_metadata GROUP BY department",
    },
    CatalogEntry {
        number: 6,
        key: "more-than-one-image",
        question: "Which artifacts have more than 1 image?",
        sql: "SELECT * FROM artifact_media WHERE imagecount > 1",
    },
    CatalogEntry {
        number: 7,
        key: "average-rank",
        question: "What is the average rank of all artifacts?",
        sql: "SELECT AVG(rank) AS average_rank FROM artifact_media",
    },
    CatalogEntry {
        number: 8,
        key: "colorcount-above-mediacount",
        question: "Which artifacts have a higher colorcount than mediacount?",
        sql: "SELECT * FROM artifact_media WHERE colorcount > mediacount",
    },
    CatalogEntry {
        number: 9,
        key: "accessioned-1500-1600",
        question: "List all artifacts created between 1500 and 1600.",
        sql: "SELECT * FROM artifact_metadata WHERE accessionyear BETWEEN 1500 AND 1600",
    },
    CatalogEntry {
        number: 10,
        key: "without-media",
        question: "How many artifacts have no media files?",
        sql: "SELECT COUNT(*) AS without_media FROM artifact_media WHERE mediacount = 0",
    },
    CatalogEntry {
        number: 11,
        key: "distinct-hues",
        question: "What are all the distinct hues used in the dataset?",
        sql: "SELECT DISTINCT hue FROM artifact_colors WHERE hue IS NOT NULL",
    },
    CatalogEntry {
        number: 12,
        key: "top-colors",
        question: "What are the top 5 most used colors by frequency?",
        sql: "SELECT color, COUNT(*) AS frequency FROM artifact_colors \
              GROUP BY color ORDER BY frequency DESC LIMIT 5",
    },
    CatalogEntry {
        number: 13,
        key: "average-coverage-per-hue",
        question: "What is the average coverage percentage for each hue?",
        sql: "SELECT hue, AVG(percent) AS avg_coverage FROM artifact_colors GROUP BY hue",
    },
    CatalogEntry {
        number: 14,
        key: "colors-per-artifact",
        question: "List all colors recorded for each artifact ID.",
        sql: "SELECT objectid, color, spectrum, hue, percent, css3 FROM artifact_colors \
              WHERE objectid IS NOT NULL ORDER BY objectid",
    },
    CatalogEntry {
        number: 15,
        key: "total-color-entries",
        question: "What is the total number of color entries in the dataset?",
        sql: "SELECT COUNT(*) AS total_colors FROM artifact_colors",
    },
    CatalogEntry {
        number: 16,
        key: "byzantine-titles-and-hues",
        question: "List artifact titles and hues for all artifacts belonging to the Byzantine culture.",
        sql: "SELECT a.title, c.hue FROM artifact_metadata a \
              JOIN artifact_colors c ON a.id = c.objectid \
              WHERE a.culture = 'Byzantine'",
    },
    CatalogEntry {
        number: 17,
        key: "titles-with-hues",
        question: "List each artifact title with its associated hues.",
        sql: "SELECT a.title, c.hue FROM artifact_metadata a \
              JOIN artifact_colors c ON a.id = c.objectid",
    },
    CatalogEntry {
        number: 18,
        key: "titles-cultures-ranks-with-period",
        question: "Get artifact titles, cultures, and media ranks where the period is not null.",
        sql: "SELECT a.title, a.culture, m.rank FROM artifact_metadata a \
              JOIN artifact_media m ON a.id = m.objectid \
              WHERE a.period IS NOT NULL",
    },
    CatalogEntry {
        number: 19,
        key: "top-ranked-grey",
        question: "Find artifact titles ranked in the top 10 that include the color hue 'Grey'.",
        sql: "SELECT DISTINCT a.title, m.rank FROM artifact_metadata a \
              JOIN artifact_media m ON a.id = m.objectid \
              JOIN artifact_colors c ON m.objectid = c.objectid \
              WHERE c.hue = 'Grey' \
              ORDER BY m.rank DESC LIMIT 10",
    },
    CatalogEntry {
        number: 20,
        key: "classification-media-averages",
        question: "How many artifacts exist per classification, and what is the average media count for each?",
        sql: "SELECT a.classification, COUNT(*) AS count, AVG(m.mediacount) AS avg_media_count \
              FROM artifact_metadata a \
              JOIN artifact_media m ON a.id = m.objectid \
              GROUP BY a.classification",
    },
    CatalogEntry {
        number: 21,
        key: "all-artifacts",
        question: "List all artifacts in the database along with their ID, title, and culture.",
        sql: "SELECT id, title, culture FROM artifact_metadata",
    },
    CatalogEntry {
        number: 22,
        key: "rank-above-50",
        question: "List artifacts with media rank greater than 50.",
        sql: "SELECT objectid, rank FROM artifact_media WHERE rank > 50 ORDER BY rank DESC",
    },
    CatalogEntry {
        number: 23,
        key: "green-artifacts",
        question: "Count how many artifacts contain the color hue 'Green'.",
        sql: "SELECT COUNT(DISTINCT objectid) AS a_green FROM artifact_colors WHERE hue = 'Green'",
    },
    CatalogEntry {
        number: 24,
        key: "sculpture-top-hues",
        question: "Top 5 hues used in artifacts classified as 'Sculpture'.",
        sql: "SELECT c.hue, COUNT(*) AS usage_count FROM artifact_metadata m \
              JOIN artifact_colors c ON m.id = c.objectid \
              WHERE m.classification = 'Sculpture' \
              GROUP BY c.hue ORDER BY usage_count DESC LIMIT 5",
    },
    CatalogEntry {
        number: 25,
        key: "16th-century-red-rank-above-50",
        question: "Find artifacts from the 16th century with rank > 50 and color hue 'Red'.",
        sql: "SELECT m.title, me.rank, c.hue FROM artifact_metadata m \
              JOIN artifact_media me ON m.id = me.objectid \
              JOIN artifact_colors c ON m.id = c.objectid \
              WHERE m.century = '16th century' AND me.rank > 50 AND c.hue = 'Red'",
    },
];

/// All catalog entries in menu order
pub fn entries() -> &'static [CatalogEntry] {
    CATALOG
}

/// Look up an entry by slug or by its number
pub fn find(key: &str) -> Option<&'static CatalogEntry> {
    let key = key.trim();
    if let Ok(number) = key.parse::<u8>() {
        return CATALOG.iter().find(|e| e.number == number);
    }
    CATALOG.iter().find(|e| e.key.eq_ignore_ascii_case(key))
}

/// Runs catalog entries against a store
pub struct QueryCatalog<'a> {
    store: &'a ArtifactStore,
}

impl<'a> QueryCatalog<'a> {
    pub fn new(store: &'a ArtifactStore) -> Self {
        Self { store }
    }

    /// Execute the entry named by `key`.
    ///
    /// A store error is reported as `QueryFailed` for this key only.
    pub fn run(&self, key: &str) -> Result<QueryTable> {
        let entry = find(key).ok_or_else(|| Error::UnknownQuery(key.to_string()))?;
        self.run_entry(entry)
    }

    pub fn run_entry(&self, entry: &CatalogEntry) -> Result<QueryTable> {
        tracing::debug!("Running catalog query {} ({})", entry.number, entry.key);
        self.store
            .query_table(entry.sql)
            .map_err(|e| Error::QueryFailed {
                key: entry.key.to_string(),
                message: e.to_string(),
            })
    }
}
