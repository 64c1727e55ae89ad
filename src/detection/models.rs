//! Detection data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Entity category.
///
/// The seven structured categories drive value-level substitution. Any other
/// label produced by a backend is kept verbatim as [`Category::Domain`] and
/// treated as a medical/domain-specific term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Person,
    Location,
    Organization,
    Email,
    Phone,
    Date,
    Identifier,
    Domain(String),
}

impl Category {
    /// Maps a backend-specific tag to a category.
    ///
    /// Labels are compared case-insensitively; unrecognized labels pass
    /// through unchanged (uppercased) as domain categories.
    pub fn normalize(raw: &str) -> Self {
        let label = raw.trim().to_uppercase();
        match label.as_str() {
            "PER" | "PERSON" | "PERS" => Category::Person,
            "LOC" | "GPE" | "LOCATION" => Category::Location,
            "ORG" | "ORGANIZATION" => Category::Organization,
            "DATE" | "TIME" => Category::Date,
            "EMAIL" => Category::Email,
            "PHONE" => Category::Phone,
            "IDENTIFIER" => Category::Identifier,
            _ => Category::Domain(label),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Category::Person => "PERSON",
            Category::Location => "LOCATION",
            Category::Organization => "ORGANIZATION",
            Category::Email => "EMAIL",
            Category::Phone => "PHONE",
            Category::Date => "DATE",
            Category::Identifier => "IDENTIFIER",
            Category::Domain(label) => label,
        }
    }

    /// True for labels outside the structured set
    pub fn is_domain(&self) -> bool {
        matches!(self, Category::Domain(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Category::normalize(&label)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.label().to_string()
    }
}

/// A traceable entity found in a column sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedEntity {
    pub text: String,
    pub category: Category,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f64,
    /// Originating signal (backend name, `pattern`, `lexical`)
    pub source: String,
    /// Row of the sampled value the entity came from
    pub row_index: Option<usize>,
}

impl DetectedEntity {
    pub fn new(
        text: impl Into<String>,
        category: Category,
        confidence: f64,
        source: impl Into<String>,
        row_index: Option<usize>,
    ) -> Self {
        Self {
            text: text.into(),
            category,
            confidence: confidence.clamp(0.0, 1.0),
            source: source.into(),
            row_index,
        }
    }
}

/// Per-category entity counts, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityCounts(Vec<(Category, usize)>);

impl EntityCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, category: &Category) {
        match self.0.iter_mut().find(|(c, _)| c == category) {
            Some((_, count)) => *count += 1,
            None => self.0.push((category.clone(), 1)),
        }
    }

    pub fn get(&self, category: &Category) -> usize {
        self.0
            .iter()
            .find(|(c, _)| c == category)
            .map_or(0, |(_, n)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Category, usize)> {
        self.0.iter().map(|(c, n)| (c, *n))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> usize {
        self.0.iter().map(|(_, n)| n).sum()
    }
}

impl FromIterator<(Category, usize)> for EntityCounts {
    fn from_iter<I: IntoIterator<Item = (Category, usize)>>(iter: I) -> Self {
        let mut counts = EntityCounts::new();
        for (category, n) in iter {
            for _ in 0..n {
                counts.increment(&category);
            }
        }
        counts
    }
}

/// Sensitivity verdict for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnClassification {
    pub column_name: String,
    pub is_sensitive: bool,
    pub confidence: f64,
    /// Triggered categories, in decision order, without duplicates
    pub categories: Vec<Category>,
    pub reasoning: String,
    /// Up to five original values
    pub sample_values: Vec<String>,
    pub detected_entities: Vec<DetectedEntity>,
}

impl ColumnClassification {
    /// Verdict for a column with no non-null value
    pub fn empty(column_name: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            is_sensitive: false,
            confidence: 0.0,
            categories: Vec::new(),
            reasoning: "empty".to_string(),
            sample_values: Vec::new(),
            detected_entities: Vec::new(),
        }
    }
}

/// Summary counts of a detection report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub sensitive: usize,
    pub public: usize,
}

/// Classification of every column of one dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub run_id: Uuid,
    pub file: String,
    pub source_format: String,
    /// `(rows, columns)`
    pub shape: (usize, usize),
    /// Verdicts in dataset column order
    pub columns: Vec<ColumnClassification>,
    pub summary: ReportSummary,
    /// Extraction ran on the fallback tagger
    pub degraded: bool,
    /// Recoverable failures observed during detection
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl DetectionReport {
    pub fn new(
        file: impl Into<String>,
        source_format: impl Into<String>,
        shape: (usize, usize),
        columns: Vec<ColumnClassification>,
    ) -> Self {
        let sensitive = columns.iter().filter(|c| c.is_sensitive).count();
        let summary = ReportSummary {
            total: columns.len(),
            sensitive,
            public: columns.len() - sensitive,
        };

        Self {
            run_id: Uuid::new_v4(),
            file: file.into(),
            source_format: source_format.into(),
            shape,
            columns,
            summary,
            degraded: false,
            warnings: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnClassification> {
        self.columns.iter().find(|c| c.column_name == name)
    }

    pub fn sensitive_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_sensitive)
            .map(|c| c.column_name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_table() {
        for raw in ["PER", "person", "Pers"] {
            assert_eq!(Category::normalize(raw), Category::Person);
        }
        for raw in ["LOC", "gpe", "LOCATION"] {
            assert_eq!(Category::normalize(raw), Category::Location);
        }
        assert_eq!(Category::normalize("ORG"), Category::Organization);
        assert_eq!(Category::normalize("ORGANIZATION"), Category::Organization);
        assert_eq!(Category::normalize("TIME"), Category::Date);
    }

    #[test]
    fn test_unknown_label_passes_through() {
        let category = Category::normalize("disease_disorder");
        assert_eq!(category, Category::Domain("DISEASE_DISORDER".to_string()));
        assert!(category.is_domain());
        assert_eq!(category.label(), "DISEASE_DISORDER");
    }

    #[test]
    fn test_category_serializes_as_label() {
        let categories = vec![Category::Email, Category::normalize("drug")];
        let json = serde_json::to_string(&categories).unwrap();
        assert_eq!(json, r#"["EMAIL","DRUG"]"#);
        let back: Vec<Category> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0], Category::Email);
    }

    #[test]
    fn test_entity_counts_keep_first_seen_order() {
        let mut counts = EntityCounts::new();
        counts.increment(&Category::Date);
        counts.increment(&Category::Person);
        counts.increment(&Category::Date);

        let order: Vec<_> = counts.iter().map(|(c, n)| (c.clone(), n)).collect();
        assert_eq!(order, vec![(Category::Date, 2), (Category::Person, 1)]);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.get(&Category::Email), 0);
    }

    #[test]
    fn test_report_summary() {
        let mut sensitive = ColumnClassification::empty("email");
        sensitive.is_sensitive = true;
        let report = DetectionReport::new(
            "patients.csv",
            "csv",
            (10, 2),
            vec![sensitive, ColumnClassification::empty("notes")],
        );

        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.sensitive, 1);
        assert_eq!(report.summary.public, 1);
        assert_eq!(report.sensitive_columns(), vec!["email"]);
        assert_eq!(report.column("notes").unwrap().reasoning, "empty");
    }
}
