//! Filename-based category inference.
//!
//! Maps a document's file name to one of a closed set of categories by
//! matching substrings against an ordered rule table. The first matching
//! keyword wins, so re-ingesting an unchanged file always produces the
//! same category.

use serde::Serialize;

/// Semantic category assigned to a document and inherited by its chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Info,
    Menu,
    Location,
    Contact,
    Hours,
    Special,
    Policy,
    Generic,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Info => "info",
            Category::Menu => "menu",
            Category::Location => "location",
            Category::Contact => "contact",
            Category::Hours => "hours",
            Category::Special => "special",
            Category::Policy => "policy",
            Category::Generic => "generic",
        }
    }

    pub fn from_str(s: &str) -> Category {
        match s {
            "info" => Category::Info,
            "menu" => Category::Menu,
            "location" => Category::Location,
            "contact" => Category::Contact,
            "hours" => Category::Hours,
            "special" => Category::Special,
            "policy" => Category::Policy,
            _ => Category::Generic,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword rules in priority order. Earlier entries win ties, so the
/// table order is part of the contract: reordering it changes the
/// categories of ambiguous file names.
const RULES: &[(&str, Category)] = &[
    ("menu", Category::Menu),
    ("food", Category::Menu),
    ("dish", Category::Menu),
    ("course", Category::Menu),
    ("location", Category::Location),
    ("address", Category::Location),
    ("where", Category::Location),
    ("map", Category::Location),
    ("contact", Category::Contact),
    ("phone", Category::Contact),
    ("email", Category::Contact),
    ("hours", Category::Hours),
    ("schedule", Category::Hours),
    ("time", Category::Hours),
    ("open", Category::Hours),
    ("special", Category::Special),
    ("promo", Category::Special),
    ("offer", Category::Special),
    ("policy", Category::Policy),
    ("terms", Category::Policy),
    ("rules", Category::Policy),
    ("info", Category::Info),
];

/// Infer a category from a file name (not a full path). Matching is
/// case-insensitive; a name matching no rule is `Generic`.
pub fn categorize(file_name: &str) -> Category {
    let lower = file_name.to_lowercase();
    for (keyword, category) in RULES {
        if lower.contains(keyword) {
            return *category;
        }
    }
    Category::Generic
}
