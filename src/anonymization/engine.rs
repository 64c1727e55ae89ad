//! Substitution engine
//!
//! Rewrites the sensitive columns of a dataset according to the detection
//! report. Each column is handled by one [`Strategy`] picked from its
//! categories:
//!
//! - whole-value substitutions (names, places, organizations, emails, phones)
//!   go through the shared [`SubstitutionStore`] so an original value always
//!   maps to the same synthetic value
//! - dates are shifted by a single per-store day offset, keeping their format
//! - identifiers become a prefixed truncated SHA-256 digest
//! - any other category masks the flagged spans inside free text
//!
//! Columns that already contain masked terms are returned unchanged.

use crate::anonymization::dates::DateValue;
use crate::anonymization::store::SubstitutionStore;
use crate::anonymization::strategy::Strategy;
use crate::anonymization::synth::SyntheticGenerator;
use crate::config::AnonymizationConfig;
use crate::detection::contact::digit_ratio;
use crate::detection::{Category, DetectedEntity, DetectionReport};
use crate::domain::{CellValue, Column, Dataset};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Arc;

/// Lowest digit ratio a value needs to be treated as a phone number
const PHONE_DIGIT_RATIO: f64 = 0.5;

/// Number space of masked-term suffixes
const MASK_MODULUS: u64 = 10_000;

/// Replaces sensitive values with consistent substitutes
pub struct SubstitutionEngine {
    store: Arc<SubstitutionStore>,
    generator: Arc<SyntheticGenerator>,
    config: AnonymizationConfig,
    stopwords: HashSet<String>,
}

impl SubstitutionEngine {
    pub fn new(
        config: &AnonymizationConfig,
        store: Arc<SubstitutionStore>,
        generator: Arc<SyntheticGenerator>,
    ) -> Self {
        let stopwords = config
            .masking
            .stopwords
            .iter()
            .map(|w| w.to_lowercase())
            .collect();

        Self {
            store,
            generator,
            config: config.clone(),
            stopwords,
        }
    }

    /// Engine with its own store and generator built from `config`
    pub fn from_config(config: &AnonymizationConfig) -> Self {
        Self::new(
            config,
            Arc::new(SubstitutionStore::new(config.cache_capacity)),
            Arc::new(SyntheticGenerator::new(config.seed)),
        )
    }

    pub fn store(&self) -> &Arc<SubstitutionStore> {
        &self.store
    }

    /// Anonymizes every column flagged sensitive in `report`.
    ///
    /// Columns absent from the report or classified public are copied as is,
    /// so the result always has the shape and column order of `dataset`.
    pub fn substitute(&self, dataset: &Dataset, report: &DetectionReport) -> Dataset {
        let columns = dataset
            .columns()
            .iter()
            .map(|column| match report.column(column.name()) {
                Some(verdict) if verdict.is_sensitive => self.substitute_column(
                    column,
                    &verdict.categories,
                    &verdict.detected_entities,
                ),
                _ => column.clone(),
            })
            .collect();

        Dataset::with_columns(columns)
    }

    /// Anonymizes one column given its categories and the entities found in it
    pub fn substitute_column(
        &self,
        column: &Column,
        categories: &[Category],
        entities: &[DetectedEntity],
    ) -> Column {
        if self.already_masked(column) {
            tracing::debug!(column = %column.name(), "Column already masked, left unchanged");
            return column.clone();
        }

        let strategy = Strategy::for_categories(categories);
        tracing::debug!(column = %column.name(), strategy = %strategy, "Substituting column");

        match strategy {
            Strategy::ShiftDate => self.map_values(column, |text| self.shift_date(text)),
            Strategy::HashIdentifier => self.map_values(column, |text| {
                (!self.bears_reserved_prefix(text)).then(|| self.hash_identifier(text))
            }),
            Strategy::MaskDomainTerms => self.mask_domain_terms(column, categories, entities),
            whole_value => {
                self.map_values(column, |text| self.replace_whole_value(whole_value, text))
            }
        }
    }

    /// True when any cell already carries a masked term
    fn already_masked(&self, column: &Column) -> bool {
        let prefix = self.config.mask_prefix.as_str();
        column
            .values()
            .iter()
            .filter_map(CellValue::as_text)
            .any(|text| text.contains(prefix))
    }

    /// Masked terms may sit anywhere in a value; hashed identifiers start it
    fn bears_reserved_prefix(&self, text: &str) -> bool {
        text.contains(self.config.mask_prefix.as_str())
            || text.starts_with(self.config.id_prefix.as_str())
    }

    /// Applies `replace` to every non-null cell; `None` keeps the cell as is
    fn map_values<F>(&self, column: &Column, replace: F) -> Column
    where
        F: Fn(&str) -> Option<String>,
    {
        let values = column
            .values()
            .iter()
            .map(|cell| match cell.as_text() {
                Some(text) => replace(&text).map_or_else(|| cell.clone(), CellValue::Text),
                None => CellValue::Null,
            })
            .collect();

        column.with_values(values)
    }

    fn replace_whole_value(&self, strategy: Strategy, text: &str) -> Option<String> {
        let kind = strategy.synthetic_kind()?;
        if self.bears_reserved_prefix(text) {
            return None;
        }

        match strategy {
            Strategy::SubstituteEmail if !text.contains('@') => return None,
            Strategy::SubstitutePhone if digit_ratio(text) < PHONE_DIGIT_RATIO => return None,
            _ => {}
        }

        Some(self.store.get_or_insert_with(text, || self.generator.generate(kind)))
    }

    /// Day offset shared by every date column served by this store
    pub fn date_offset(&self) -> i64 {
        let bound = self.config.date_shift_days;
        self.store.date_offset_with(|| self.generator.day_offset(bound))
    }

    /// Shifts a date by the store offset, keeping its layout.
    ///
    /// Returns `None` for values that match no known layout.
    pub fn shift_date(&self, text: &str) -> Option<String> {
        let value = DateValue::parse(text)?;
        value.shifted(self.date_offset())
    }

    /// `ID_` followed by the uppercase leading hex digits of the SHA-256 digest
    pub fn hash_identifier(&self, text: &str) -> String {
        let digest = hex_digest(text);
        let length = self.config.id_hash_length.min(digest.len());
        format!("{}{}", self.config.id_prefix, digest[..length].to_uppercase())
    }

    /// Masked token for a domain term, `MED_` followed by four digits
    pub fn mask_token(&self, term: &str) -> String {
        let digest = Sha256::digest(term.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        let number = u64::from_be_bytes(head) % MASK_MODULUS;
        format!("{}{:04}", self.config.mask_prefix, number)
    }

    /// Whether an entity passes the masking filters
    pub fn is_maskable(&self, entity: &DetectedEntity) -> bool {
        let text = entity.text.as_str();
        text.chars().count() >= self.config.masking.min_length
            && !self.stopwords.contains(&text.to_lowercase())
            && text.chars().any(char::is_alphanumeric)
            && entity.confidence >= self.config.masking.min_confidence
    }

    fn mask_domain_terms(
        &self,
        column: &Column,
        categories: &[Category],
        entities: &[DetectedEntity],
    ) -> Column {
        let domain_categories: Vec<&Category> =
            categories.iter().filter(|c| c.is_domain()).collect();
        if domain_categories.is_empty() {
            return column.clone();
        }

        let mut terms: Vec<&str> = Vec::new();
        for entity in entities {
            if domain_categories.contains(&&entity.category)
                && self.is_maskable(entity)
                && !terms.contains(&entity.text.as_str())
            {
                terms.push(entity.text.as_str());
            }
        }
        if terms.is_empty() {
            return column.clone();
        }

        // longest first, so a term is not split by one of its substrings
        terms.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));

        let rules: Vec<(TermMatcher, String)> = terms
            .into_iter()
            .filter_map(|term| {
                let matcher = TermMatcher::new(term, self.config.masking.whole_word_only)?;
                Some((matcher, self.mask_token(term)))
            })
            .collect();

        self.map_values(column, |text| {
            let mut current = text.to_string();
            for (matcher, token) in &rules {
                current = matcher.replace_all(&current, token);
            }
            (current != text).then_some(current)
        })
    }
}

impl std::fmt::Debug for SubstitutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubstitutionEngine")
            .field("store", &self.store)
            .field("generator", &self.generator)
            .finish()
    }
}

/// Finds occurrences of one masked term
enum TermMatcher {
    Substring(String),
    WholeWord(Regex),
}

impl TermMatcher {
    fn new(term: &str, whole_word_only: bool) -> Option<Self> {
        if !whole_word_only {
            return Some(TermMatcher::Substring(term.to_string()));
        }

        let is_word = |c: char| c.is_alphanumeric() || c == '_';
        let leading = term.chars().next().is_some_and(is_word);
        let trailing = term.chars().last().is_some_and(is_word);
        let pattern = format!(
            "{}{}{}",
            if leading { r"\b" } else { "" },
            regex::escape(term),
            if trailing { r"\b" } else { "" }
        );

        match Regex::new(&pattern) {
            Ok(re) => Some(TermMatcher::WholeWord(re)),
            Err(e) => {
                tracing::warn!(error = %e, "Masked term skipped, pattern rejected");
                None
            }
        }
    }

    fn replace_all(&self, text: &str, token: &str) -> String {
        match self {
            TermMatcher::Substring(term) => text.replace(term.as_str(), token),
            TermMatcher::WholeWord(re) => re.replace_all(text, regex::NoExpand(token)).into_owned(),
        }
    }
}

/// Lowercase hex SHA-256 of a string
pub fn hex_digest(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn engine() -> SubstitutionEngine {
        SubstitutionEngine::from_config(&AnonymizationConfig::default())
    }

    fn text_column(name: &str, values: &[&str]) -> Column {
        Column::new(name, values.iter().map(|v| CellValue::from(*v)).collect())
    }

    fn texts(column: &Column) -> Vec<String> {
        column.values().iter().map(|v| v.to_string()).collect()
    }

    fn domain_entity(text: &str, confidence: f64) -> DetectedEntity {
        DetectedEntity::new(
            text,
            Category::Domain("DISEASE".to_string()),
            confidence,
            "ClinicalBERT",
            Some(0),
        )
    }

    #[test]
    fn test_names_are_consistent_across_columns() {
        let engine = engine();
        let first = text_column("patient", &["Jean Dupont", "Marie Curie", "Jean Dupont"]);
        let second = text_column("doctor", &["Marie Curie"]);

        let a = engine.substitute_column(&first, &[Category::Person], &[]);
        let b = engine.substitute_column(&second, &[Category::Person], &[]);
        let a = texts(&a);

        assert_ne!(a[0], "Jean Dupont");
        assert_eq!(a[0], a[2]);
        assert_eq!(a[1], texts(&b)[0]);
    }

    #[test]
    fn test_nulls_are_preserved() {
        let engine = engine();
        let column = Column::new("city", vec![CellValue::Null, CellValue::from("Lyon")]);
        let result = engine.substitute_column(&column, &[Category::Location], &[]);
        assert!(result.values()[0].is_null());
        assert!(!result.values()[1].is_null());
    }

    #[test]
    fn test_already_masked_column_is_unchanged() {
        let engine = engine();
        let column = text_column("diagnosis", &["MED_0042", "MED_1234"]);
        let result = engine.substitute_column(&column, &[Category::Person], &[]);
        assert_eq!(result, column);
    }

    #[test]
    fn test_email_requires_at_sign() {
        let engine = engine();
        let column = text_column("email", &["a.b@example.com", "not provided"]);
        let result = texts(&engine.substitute_column(&column, &[Category::Email], &[]));
        assert_ne!(result[0], "a.b@example.com");
        assert!(result[0].contains('@'));
        assert_eq!(result[1], "not provided");
    }

    #[test]
    fn test_phone_requires_digit_ratio() {
        let engine = engine();
        let column = text_column("phone", &["06 12 34 56 78", "unknown"]);
        let result = texts(&engine.substitute_column(&column, &[Category::Phone], &[]));
        assert_ne!(result[0], "06 12 34 56 78");
        assert_eq!(result[1], "unknown");
    }

    #[test]
    fn test_date_shift_preserves_intervals_and_format() {
        let engine = engine();
        let column = text_column("visit", &["2020-01-01", "2020-01-11", "n/a"]);
        let result = texts(&engine.substitute_column(&column, &[Category::Date], &[]));

        let first = NaiveDate::parse_from_str(&result[0], "%Y-%m-%d").unwrap();
        let second = NaiveDate::parse_from_str(&result[1], "%Y-%m-%d").unwrap();
        assert_eq!((second - first).num_days(), 10);
        assert_eq!(result[2], "n/a");

        let offset = engine.date_offset();
        assert!((-365..=365).contains(&offset));
        let original = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!((first - original).num_days(), offset);
    }

    #[test]
    fn test_short_year_and_iso_dates_share_the_offset() {
        let engine = engine();
        let column = text_column("admitted", &["2021-03-05", "05/03/21"]);
        let result = texts(&engine.substitute_column(&column, &[Category::Date], &[]));

        let iso = NaiveDate::parse_from_str(&result[0], "%Y-%m-%d").unwrap();
        let short = NaiveDate::parse_from_str(&result[1], "%d/%m/%y").unwrap();
        assert_eq!(iso, short);

        let original = NaiveDate::from_ymd_opt(2021, 3, 5).unwrap();
        assert_eq!((iso - original).num_days(), engine.date_offset());
    }

    #[test]
    fn test_date_shift_keeps_day_first_layout() {
        let engine = engine();
        let shifted = engine.shift_date("15/03/2021").unwrap();
        assert!(NaiveDate::parse_from_str(&shifted, "%d/%m/%Y").is_ok());
        assert!(engine.shift_date("2021-03-15 08:30:00").unwrap().contains(':'));
    }

    #[test]
    fn test_identifier_hash_is_deterministic() {
        let engine = engine();
        let other = SubstitutionEngine::from_config(&AnonymizationConfig::default());
        let token = engine.hash_identifier("P-000123");

        assert_eq!(token, other.hash_identifier("P-000123"));
        assert_ne!(token, engine.hash_identifier("P-000124"));
        assert!(token.starts_with("ID_"));
        assert_eq!(token.len(), 3 + 8);
        assert_eq!(token[3..], token[3..].to_uppercase());
    }

    #[test]
    fn test_identifier_hash_skips_reserved_values() {
        let engine = engine();
        let column = Column::new(
            "patient_id",
            vec![CellValue::from("ID_ABCDEF12"), CellValue::Integer(1042)],
        );
        let result = texts(&engine.substitute_column(&column, &[Category::Identifier], &[]));
        assert_eq!(result[0], "ID_ABCDEF12");
        assert_eq!(result[1], engine.hash_identifier("1042"));
    }

    #[test]
    fn test_values_containing_id_marker_are_substituted() {
        let engine = engine();
        let ids = text_column("patient_id", &["PATID_0042"]);
        let names = text_column("name", &["DAVID_ROUX"]);

        let hashed = texts(&engine.substitute_column(&ids, &[Category::Identifier], &[]));
        let renamed = texts(&engine.substitute_column(&names, &[Category::Person], &[]));

        assert_eq!(hashed[0], engine.hash_identifier("PATID_0042"));
        assert_ne!(renamed[0], "DAVID_ROUX");
    }

    #[test]
    fn test_mask_token_shape() {
        let engine = engine();
        let token = engine.mask_token("diabetes");
        assert_eq!(token, engine.mask_token("diabetes"));
        assert!(token.starts_with("MED_"));
        assert_eq!(token.len(), 8);
        assert!(token[4..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_masking_filters() {
        let engine = engine();
        assert!(engine.is_maskable(&domain_entity("diabetes", 0.9)));
        assert!(!engine.is_maskable(&domain_entity("ab", 0.9)));
        assert!(!engine.is_maskable(&domain_entity("With", 0.9)));
        assert!(!engine.is_maskable(&domain_entity("---", 0.9)));
        assert!(!engine.is_maskable(&domain_entity("diabetes", 0.39)));
    }

    #[test]
    fn test_masking_replaces_whole_words_only() {
        let engine = engine();
        let column = text_column("notes", &["cell count low", "cellular debris", "no finding"]);
        let categories = vec![Category::Domain("DISEASE".to_string())];
        let entities = vec![domain_entity("cell", 0.8), domain_entity("the", 0.9)];

        let result = texts(&engine.substitute_column(&column, &categories, &entities));
        let token = engine.mask_token("cell");

        assert_eq!(result[0], format!("{token} count low"));
        assert_eq!(result[1], "cellular debris");
        assert_eq!(result[2], "no finding");
    }

    #[test]
    fn test_substring_masking_when_word_boundaries_disabled() {
        let mut config = AnonymizationConfig::default();
        config.masking.whole_word_only = false;
        let engine = SubstitutionEngine::from_config(&config);
        let column = text_column("notes", &["cellular debris"]);
        let categories = vec![Category::Domain("DISEASE".to_string())];

        let result = texts(&engine.substitute_column(
            &column,
            &categories,
            &[domain_entity("cell", 0.8)],
        ));
        assert_eq!(result[0], format!("{}ular debris", engine.mask_token("cell")));
    }

    #[test]
    fn test_substitute_leaves_public_columns_untouched() {
        let engine = engine();
        let dataset = Dataset::new(vec![
            text_column("name", &["Alice Martin", "Bob Durand"]),
            Column::new("age", vec![CellValue::Integer(34), CellValue::Integer(51)]),
        ])
        .unwrap();

        let mut name = crate::detection::ColumnClassification::empty("name");
        name.is_sensitive = true;
        name.confidence = 0.6;
        name.categories = vec![Category::Person];
        let age = crate::detection::ColumnClassification::empty("age");
        let report = DetectionReport::new("people.csv", "csv", dataset.shape(), vec![name, age]);

        let anonymized = engine.substitute(&dataset, &report);

        assert_eq!(anonymized.shape(), dataset.shape());
        assert_eq!(anonymized.column("age"), dataset.column("age"));
        assert_ne!(anonymized.column("name"), dataset.column("name"));
    }
}
