use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

/// Material a listing can be declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Plastic,
    Metal,
    Glass,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Plastic, Category::Metal, Category::Glass];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Plastic => "PLASTIC",
            Category::Metal => "METAL",
            Category::Glass => "GLASS",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category {:?} (expected PLASTIC, METAL or GLASS)", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Case-insensitive, so "plastic", "Plastic" and "PLASTIC" all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Category inferred from an image. `Unknown` only appears when the
/// detector produced no usable label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedCategory {
    Known(Category),
    Unknown,
}

impl DetectedCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectedCategory::Known(c) => c.as_str(),
            DetectedCategory::Unknown => "UNKNOWN",
        }
    }

    pub fn matches(&self, declared: Category) -> bool {
        matches!(self, DetectedCategory::Known(c) if *c == declared)
    }
}

impl fmt::Display for DetectedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DetectedCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DetectedCategory {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.eq_ignore_ascii_case("UNKNOWN") {
            return Ok(DetectedCategory::Unknown);
        }
        raw.parse()
            .map(DetectedCategory::Known)
            .map_err(serde::de::Error::custom)
    }
}

// ==========================================
// Keyword table
// ==========================================

const METAL_KEYWORDS: &[&str] = &[
    "metal", "spoke", "steel", "iron", "aluminum", "aluminium", "can", "foil", "scrap", "tin",
    "screw", "nail", "bolt", "copper", "zinc", "bronze",
];

const PLASTIC_KEYWORDS: &[&str] = &[
    "plastic", "bottle", "container", "polyethylene", "wrapper", "bag", "cap", "lid", "pet",
    "packaging", "nylon", "bucket", "jug", "dispenser", "straw",
];

const GLASS_KEYWORDS: &[&str] = &[
    "glass", "jar", "cup", "wine", "beer", "mug", "vase", "mirror", "window", "goblet", "flask",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordSet {
    pub category: Category,
    pub keywords: Vec<String>,
}

/// Ordered category -> substring mapping.
///
/// Order is the tie-break: the first set with a matching substring wins, so
/// overlapping keywords resolve deterministically. Labels matching nothing
/// fall back to `fallback`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordTable {
    pub sets: Vec<KeywordSet>,
    pub fallback: Category,
}

static BUILTIN_TABLE: OnceLock<KeywordTable> = OnceLock::new();

impl KeywordTable {
    /// The table shipped with the service: METAL, then PLASTIC, then GLASS,
    /// falling back to PLASTIC.
    pub fn builtin() -> &'static KeywordTable {
        BUILTIN_TABLE.get_or_init(|| KeywordTable {
            sets: vec![
                KeywordSet::from_static(Category::Metal, METAL_KEYWORDS),
                KeywordSet::from_static(Category::Plastic, PLASTIC_KEYWORDS),
                KeywordSet::from_static(Category::Glass, GLASS_KEYWORDS),
            ],
            fallback: Category::Plastic,
        })
    }

    /// Loads a replacement table from JSON, e.g.
    /// `{"sets":[{"category":"METAL","keywords":["steel"]},...],"fallback":"PLASTIC"}`.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let table: KeywordTable = serde_json::from_str(&raw)?;
        table.normalized()
    }

    fn normalized(mut self) -> anyhow::Result<Self> {
        for set in &mut self.sets {
            set.keywords = set
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
        }
        for category in Category::ALL {
            if !self.sets.iter().any(|s| s.category == category) {
                anyhow::bail!("keyword table has no entry for {}", category);
            }
        }
        Ok(self)
    }

    pub fn map_label(&self, label: &str) -> Category {
        let lower = label.to_lowercase();
        self.sets
            .iter()
            .find(|set| set.keywords.iter().any(|k| lower.contains(k.as_str())))
            .map(|set| set.category)
            .unwrap_or(self.fallback)
    }
}

impl KeywordSet {
    fn from_static(category: Category, keywords: &[&str]) -> Self {
        Self {
            category,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Maps a detector label with the builtin table.
pub fn map_label(label: &str) -> Category {
    KeywordTable::builtin().map_label(label)
}
