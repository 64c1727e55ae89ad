//! Column sensitivity classifier
//!
//! Fuses entity counts, contact signals and the value-uniqueness ratio of a
//! column into an additive score, clamped to [0, 1], compared against the
//! configured threshold. Signal weights and gates:
//!
//! | Signal | Contribution | Gate |
//! |---|---|---|
//! | PERSON ratio | ratio × 0.4 | count > 0 |
//! | email ratio | ratio × 0.45 | any email |
//! | phone ratio | ratio × 0.4 | any phone |
//! | identifier | 0.35 | outlier ratio above threshold and uniqueness > 0.7 |
//! | LOCATION ratio | ratio × 0.25 | count > 0 and uniqueness > 0.5 |
//! | ORGANIZATION ratio | ratio × 0.15 | count > 0 |
//! | DATE ratio | ratio × 0.2 | count > 0 and uniqueness > 0.8 |
//! | other labels | min(ratio, 0.3) | any present |
//!
//! Ratios are taken over `min(30, sample size)` values.

use super::contact::{is_email, is_phone, ContactSignalAnalyzer, ContactSignals};
use super::extractor::{BackendFailure, EntityExtractor};
use super::models::{Category, ColumnClassification, DetectedEntity, EntityCounts};
use crate::config::DetectionConfig;
use crate::domain::{Column, Dataset};
use futures::stream::{self, StreamExt};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::Arc;

/// Values considered when turning counts into ratios
const RATIO_WINDOW: usize = 30;

/// Original values kept in a classification
const SAMPLE_VALUES: usize = 5;

pub const PATTERN_SOURCE: &str = "pattern";
const EMAIL_PATTERN_CONFIDENCE: f64 = 0.95;
const PHONE_PATTERN_CONFIDENCE: f64 = 0.9;

/// Classification of every column of a dataset
#[derive(Debug, Clone, Default)]
pub struct DatasetClassification {
    /// Verdicts in column order
    pub columns: Vec<ColumnClassification>,
    /// Backend failures, prefixed with the column they occurred in
    pub warnings: Vec<String>,
}

/// Per-column sensitivity classifier
pub struct ColumnClassifier {
    extractor: Arc<EntityExtractor>,
    contact: ContactSignalAnalyzer,
    threshold: f64,
    sample_size: usize,
    sample_seed: u64,
}

impl ColumnClassifier {
    pub fn new(extractor: Arc<EntityExtractor>, config: &DetectionConfig) -> Self {
        Self {
            extractor,
            contact: ContactSignalAnalyzer::new(&config.outlier),
            threshold: config.threshold,
            sample_size: config.sample_size,
            sample_seed: config.sample_seed,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn extractor(&self) -> &EntityExtractor {
        &self.extractor
    }

    /// Classifies a single column
    pub async fn analyze_column(&self, column: &Column) -> ColumnClassification {
        self.analyze_column_traced(column).await.0
    }

    /// Classifies every column, `concurrency` columns at a time.
    ///
    /// Output order follows the dataset column order regardless of
    /// completion order.
    pub async fn classify_dataset(
        &self,
        dataset: &Dataset,
        concurrency: usize,
    ) -> DatasetClassification {
        let results: Vec<_> = stream::iter(dataset.columns())
            .map(|column| self.analyze_column_traced(column))
            .buffered(concurrency.max(1))
            .collect()
            .await;

        let mut classification = DatasetClassification::default();
        for (verdict, failures) in results {
            classification.warnings.extend(
                failures
                    .iter()
                    .map(|f| format!("column '{}': {f}", verdict.column_name)),
            );
            classification.columns.push(verdict);
        }
        classification
    }

    async fn analyze_column_traced(
        &self,
        column: &Column,
    ) -> (ColumnClassification, Vec<BackendFailure>) {
        let values = column.non_null_texts();
        if values.is_empty() {
            tracing::debug!(column = %column.name(), "Column has no non-null value");
            return (ColumnClassification::empty(column.name()), Vec::new());
        }

        let sample = self.sample(&values);
        let extraction = self.extractor.extract(&sample).await;

        let texts: Vec<&str> = sample.iter().map(|(_, t)| t.as_str()).collect();
        let contact = self.contact.analyze(&texts);
        let uniqueness = uniqueness_ratio(&values);

        let verdict = self.decide(
            column.name(),
            &extraction.counts,
            &contact,
            uniqueness,
            &sample,
            extraction.entities,
        );

        crate::log_column_verdict!(
            verdict.column_name,
            verdict.is_sensitive,
            verdict.confidence,
            verdict.reasoning
        );

        (verdict, extraction.failures)
    }

    /// Uniform sample of at most `sample_size` values, in row order
    fn sample(&self, values: &[(usize, String)]) -> Vec<(usize, String)> {
        if values.len() <= self.sample_size {
            return values.to_vec();
        }

        let mut rng = StdRng::seed_from_u64(self.sample_seed);
        let mut picked = index::sample(&mut rng, values.len(), self.sample_size).into_vec();
        picked.sort_unstable();
        picked.into_iter().map(|i| values[i].clone()).collect()
    }

    /// Combines the signals of one column into a verdict.
    ///
    /// Pure function of its inputs. When the email or phone signal triggers,
    /// pattern entities are appended for every matching value among the
    /// first thirty sampled values.
    pub fn decide(
        &self,
        column_name: &str,
        counts: &EntityCounts,
        contact: &ContactSignals,
        uniqueness: f64,
        sample: &[(usize, String)],
        mut entities: Vec<DetectedEntity>,
    ) -> ColumnClassification {
        let n = sample.len().min(RATIO_WINDOW).max(1) as f64;
        let mut score = 0.0;
        let mut categories: Vec<Category> = Vec::new();
        let mut reasons: Vec<String> = Vec::new();

        let person = counts.get(&Category::Person);
        if person > 0 {
            let ratio = person as f64 / n;
            score += ratio * 0.4;
            push_unique(&mut categories, Category::Person);
            reasons.push(format!("Names ({})", percent(ratio)));
        }

        if contact.has_email {
            let ratio = contact.email_count as f64 / n;
            score += ratio * 0.45;
            push_unique(&mut categories, Category::Email);
            reasons.push(format!("Emails ({})", percent(ratio)));
            entities.extend(pattern_entities(
                sample,
                Category::Email,
                is_email,
                EMAIL_PATTERN_CONFIDENCE,
            ));
        }

        if contact.has_phone {
            let ratio = contact.phone_count as f64 / n;
            score += ratio * 0.4;
            push_unique(&mut categories, Category::Phone);
            reasons.push(format!("Phones ({})", percent(ratio)));
            entities.extend(pattern_entities(
                sample,
                Category::Phone,
                is_phone,
                PHONE_PATTERN_CONFIDENCE,
            ));
        }

        if contact.has_id && uniqueness > 0.7 {
            score += 0.35;
            push_unique(&mut categories, Category::Identifier);
            reasons.push(format!("IDs ({})", percent(uniqueness)));
        }

        let location = counts.get(&Category::Location);
        if location > 0 && uniqueness > 0.5 {
            let ratio = location as f64 / n;
            score += ratio * 0.25;
            push_unique(&mut categories, Category::Location);
            reasons.push(format!("Locations ({})", percent(ratio)));
        }

        let organization = counts.get(&Category::Organization);
        if organization > 0 {
            let ratio = organization as f64 / n;
            score += ratio * 0.15;
            push_unique(&mut categories, Category::Organization);
            reasons.push(format!("Organizations ({})", percent(ratio)));
        }

        let date = counts.get(&Category::Date);
        if date > 0 && uniqueness > 0.8 {
            let ratio = date as f64 / n;
            score += ratio * 0.2;
            push_unique(&mut categories, Category::Date);
            reasons.push(format!("Dates ({})", percent(ratio)));
        }

        let others: Vec<(&Category, usize)> = counts
            .iter()
            .filter(|(c, _)| {
                !matches!(
                    c,
                    Category::Person | Category::Location | Category::Organization | Category::Date
                )
            })
            .collect();
        if !others.is_empty() {
            let total: usize = others.iter().map(|(_, count)| count).sum();
            let ratio = total as f64 / n;
            score += ratio.min(0.3);
            for (category, _) in others {
                push_unique(&mut categories, category.clone());
            }
            reasons.push(format!("Medical ({})", percent(ratio)));
        }

        let confidence = score.min(1.0);
        let reasoning = if reasons.is_empty() {
            "Categorical".to_string()
        } else {
            reasons.join(" | ")
        };

        ColumnClassification {
            column_name: column_name.to_string(),
            is_sensitive: confidence >= self.threshold,
            confidence,
            categories,
            reasoning,
            sample_values: sample.iter().take(SAMPLE_VALUES).map(|(_, t)| t.clone()).collect(),
            detected_entities: entities,
        }
    }
}

/// Distinct non-null values over non-null values
pub fn uniqueness_ratio(values: &[(usize, String)]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let distinct: HashSet<&str> = values.iter().map(|(_, v)| v.as_str()).collect();
    distinct.len() as f64 / values.len() as f64
}

fn pattern_entities(
    sample: &[(usize, String)],
    category: Category,
    matches: fn(&str) -> bool,
    confidence: f64,
) -> Vec<DetectedEntity> {
    sample
        .iter()
        .take(RATIO_WINDOW)
        .filter(|(_, text)| matches(text))
        .map(|(row, text)| {
            DetectedEntity::new(
                text.clone(),
                category.clone(),
                confidence,
                PATTERN_SOURCE,
                Some(*row),
            )
        })
        .collect()
}

fn push_unique(categories: &mut Vec<Category>, category: Category) {
    if !categories.contains(&category) {
        categories.push(category);
    }
}

fn percent(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::extractor::ExtractionLimits;

    fn classifier(threshold: f64) -> ColumnClassifier {
        let extractor = EntityExtractor::lexical(ExtractionLimits::default()).unwrap();
        let config = DetectionConfig {
            threshold,
            ..DetectionConfig::default()
        };
        ColumnClassifier::new(Arc::new(extractor), &config)
    }

    fn sample_of(n: usize) -> Vec<(usize, String)> {
        (0..n).map(|i| (i, format!("value {i}"))).collect()
    }

    fn verdict(
        counts: &EntityCounts,
        contact: &ContactSignals,
        uniqueness: f64,
    ) -> ColumnClassification {
        classifier(0.3).decide("c", counts, contact, uniqueness, &sample_of(30), Vec::new())
    }

    #[test]
    fn test_person_ratio_contribution() {
        let counts: EntityCounts = [(Category::Person, 12)].into_iter().collect();
        let verdict = classifier(0.3).decide(
            "name",
            &counts,
            &ContactSignals::default(),
            1.0,
            &sample_of(30),
            Vec::new(),
        );

        assert!((verdict.confidence - 0.16).abs() < 1e-9);
        assert!(!verdict.is_sensitive);
        assert_eq!(verdict.categories, vec![Category::Person]);
        assert_eq!(verdict.reasoning, "Names (40%)");
        assert_eq!(verdict.sample_values.len(), 5);
    }

    #[test]
    fn test_gates_on_uniqueness() {
        let counts: EntityCounts = [(Category::Location, 10), (Category::Date, 10)]
            .into_iter()
            .collect();
        let low = verdict(&counts, &ContactSignals::default(), 0.4);
        assert!(low.categories.is_empty());
        assert_eq!(low.reasoning, "Categorical");
        assert_eq!(low.confidence, 0.0);

        let mid = verdict(&counts, &ContactSignals::default(), 0.6);
        assert_eq!(mid.categories, vec![Category::Location]);

        let high = verdict(&counts, &ContactSignals::default(), 0.9);
        assert_eq!(high.categories, vec![Category::Location, Category::Date]);
    }

    #[test]
    fn test_identifier_flat_contribution() {
        let contact = ContactSignals {
            has_id: true,
            id_ratio: 0.3,
            ..ContactSignals::default()
        };
        let verdict = verdict(&EntityCounts::new(), &contact, 0.95);

        assert!((verdict.confidence - 0.35).abs() < 1e-9);
        assert!(verdict.is_sensitive);
        assert_eq!(verdict.reasoning, "IDs (95%)");
    }

    #[test]
    fn test_domain_labels_capped() {
        let counts: EntityCounts = [
            (Category::normalize("DISEASE"), 20),
            (Category::normalize("DRUG"), 10),
        ]
        .into_iter()
        .collect();
        let verdict = verdict(&counts, &ContactSignals::default(), 1.0);

        assert!((verdict.confidence - 0.3).abs() < 1e-9);
        assert_eq!(verdict.categories.len(), 2);
        assert_eq!(verdict.reasoning, "Medical (100%)");
    }

    #[test]
    fn test_pattern_entities_appended() {
        let sample = vec![
            (3, "ann@clinic.org".to_string()),
            (7, "not an email".to_string()),
        ];
        let contact = ContactSignals {
            has_email: true,
            email_count: 1,
            ..ContactSignals::default()
        };
        let verdict = classifier(0.3).decide(
            "contact",
            &EntityCounts::new(),
            &contact,
            1.0,
            &sample,
            Vec::new(),
        );

        assert_eq!(verdict.detected_entities.len(), 1);
        let entity = &verdict.detected_entities[0];
        assert_eq!(entity.category, Category::Email);
        assert_eq!(entity.source, PATTERN_SOURCE);
        assert_eq!(entity.row_index, Some(3));
        assert_eq!(entity.confidence, 0.95);
    }

    #[test]
    fn test_uniqueness_ratio() {
        let values: Vec<(usize, String)> = ["a", "a", "b", "c"]
            .iter()
            .enumerate()
            .map(|(i, v)| (i, v.to_string()))
            .collect();
        assert_eq!(uniqueness_ratio(&values), 0.75);
        assert_eq!(uniqueness_ratio(&[]), 0.0);
    }

    #[test]
    fn test_sample_is_reproducible_and_bounded() {
        let classifier = classifier(0.3);
        let values: Vec<(usize, String)> = (0..1000).map(|i| (i, i.to_string())).collect();

        let first = classifier.sample(&values);
        let second = classifier.sample(&values);
        assert_eq!(first.len(), 200);
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[tokio::test]
    async fn test_empty_column_short_circuits() {
        let column = Column::new("blank", vec![crate::domain::CellValue::Null; 4]);
        let verdict = classifier(0.3).analyze_column(&column).await;

        assert_eq!(verdict, ColumnClassification::empty("blank"));
    }
}
