//! Database schema definitions

/// SQL to create the artifact metadata table
pub const CREATE_ARTIFACT_METADATA_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS artifact_metadata (
    id INTEGER PRIMARY KEY,
    title TEXT,
    culture TEXT,
    period TEXT,
    century TEXT,
    medium TEXT,
    dimensions TEXT,
    description TEXT,
    department TEXT,
    classification TEXT,
    accessionyear INTEGER,
    accessionmethod TEXT
)
"#;

/// SQL to create the media statistics table
pub const CREATE_ARTIFACT_MEDIA_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS artifact_media (
    objectid INTEGER PRIMARY KEY,
    imagecount INTEGER,
    mediacount INTEGER,
    colorcount INTEGER,
    rank REAL,
    datebegin INTEGER,
    dateend INTEGER,
    FOREIGN KEY (objectid) REFERENCES artifact_metadata(id)
)
"#;

/// SQL to create the color annotation table
/// No uniqueness: an artifact carries any number of color rows
pub const CREATE_ARTIFACT_COLORS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS artifact_colors (
    objectid INTEGER,
    color TEXT,
    spectrum TEXT,
    hue TEXT,
    percent REAL,
    css3 TEXT,
    FOREIGN KEY (objectid) REFERENCES artifact_metadata(id)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_colors_objectid ON artifact_colors(objectid)",
    "CREATE INDEX IF NOT EXISTS idx_colors_hue ON artifact_colors(hue)",
    "CREATE INDEX IF NOT EXISTS idx_metadata_culture ON artifact_metadata(culture)",
    "CREATE INDEX IF NOT EXISTS idx_metadata_classification ON artifact_metadata(classification)",
];

/// The three persisted tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Metadata,
    Media,
    Colors,
}

impl Table {
    /// SQL table name
    pub fn name(&self) -> &'static str {
        match self {
            Table::Metadata => "artifact_metadata",
            Table::Media => "artifact_media",
            Table::Colors => "artifact_colors",
        }
    }

    /// Column set the table must expose, in declaration order
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Table::Metadata => &[
                "id",
                "title",
                "culture",
                "period",
                "century",
                "medium",
                "dimensions",
                "description",
                "department",
                "classification",
                "accessionyear",
                "accessionmethod",
            ],
            Table::Media => &[
                "objectid",
                "imagecount",
                "mediacount",
                "colorcount",
                "rank",
                "datebegin",
                "dateend",
            ],
            Table::Colors => &["objectid", "color", "spectrum", "hue", "percent", "css3"],
        }
    }

    pub fn all() -> &'static [Table] {
        &[Table::Metadata, Table::Media, Table::Colors]
    }
}

impl std::str::FromStr for Table {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "metadata" | "meta" | "artifact_metadata" | "artifacts" => Ok(Table::Metadata),
            "media" | "artifact_media" => Ok(Table::Media),
            "colors" | "colours" | "artifact_colors" => Ok(Table::Colors),
            _ => Err(crate::Error::UnknownTable(s.to_string())),
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_ARTIFACT_METADATA_TABLE,
        CREATE_ARTIFACT_MEDIA_TABLE,
        CREATE_ARTIFACT_COLORS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
