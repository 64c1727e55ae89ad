//! Integration tests for substitution properties
//!
//! Consistency of substitutes across engines sharing a store, idempotence
//! on already-masked data, date interval preservation and the masking
//! filters.

use aidchain_anonymizer::anonymization::{
    DateValue, SubstitutionEngine, SubstitutionStore, SyntheticGenerator,
};
use aidchain_anonymizer::config::AnonymizationConfig;
use aidchain_anonymizer::detection::{
    Category, ColumnClassification, DetectedEntity, DetectionReport,
};
use aidchain_anonymizer::domain::{CellValue, Column, Dataset};
use chrono::NaiveDate;
use std::sync::Arc;
use std::thread;
use test_case::test_case;

fn shared_engines(config: &AnonymizationConfig) -> (SubstitutionEngine, SubstitutionEngine) {
    let store = Arc::new(SubstitutionStore::new(config.cache_capacity));
    let generator = Arc::new(SyntheticGenerator::new(config.seed));
    (
        SubstitutionEngine::new(config, Arc::clone(&store), Arc::clone(&generator)),
        SubstitutionEngine::new(config, store, generator),
    )
}

fn text_column(name: &str, values: &[&str]) -> Column {
    Column::new(name, values.iter().map(|v| CellValue::from(*v)).collect())
}

fn texts(column: &Column) -> Vec<String> {
    column.values().iter().map(|v| v.to_string()).collect()
}

fn sensitive(name: &str, categories: Vec<Category>) -> ColumnClassification {
    let mut verdict = ColumnClassification::empty(name);
    verdict.is_sensitive = true;
    verdict.confidence = 0.9;
    verdict.categories = categories;
    verdict.reasoning = "test".to_string();
    verdict
}

fn domain_entity(text: &str, confidence: f64) -> DetectedEntity {
    DetectedEntity::new(text, Category::Domain("DISEASE".into()), confidence, "medical", None)
}

#[test_case(Category::Person ; "names")]
#[test_case(Category::Location ; "places")]
#[test_case(Category::Organization ; "organizations")]
#[test_case(Category::Email ; "emails")]
fn test_substitutes_consistent_across_engines(category: Category) {
    let config = AnonymizationConfig::default();
    let (first, second) = shared_engines(&config);
    let original = text_column("value", &["jean.dupont@example.fr", "Lyon Sud"]);

    let a = first.substitute_column(&original, &[category.clone()], &[]);
    let b = second.substitute_column(&original, &[category], &[]);

    assert_eq!(a, b);
    assert_ne!(texts(&a), texts(&original));
}

#[test]
fn test_substitutes_consistent_across_threads() {
    let config = AnonymizationConfig::default();
    let store = Arc::new(SubstitutionStore::new(config.cache_capacity));
    let generator = Arc::new(SyntheticGenerator::new(config.seed));
    let names = ["Alice Martin", "Bob Durand", "Claire Petit", "David Roux"];

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine =
                SubstitutionEngine::new(&config, Arc::clone(&store), Arc::clone(&generator));
            thread::spawn(move || {
                let column = text_column("name", &names);
                texts(&engine.substitute_column(&column, &[Category::Person], &[]))
            })
        })
        .collect();

    let results: Vec<Vec<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(store.len(), names.len());
}

#[test]
fn test_flush_forgets_substitutes_but_keeps_date_offset() {
    let config = AnonymizationConfig::default();
    let engine = SubstitutionEngine::from_config(&config);
    let column = text_column("name", &["Alice Martin"]);

    engine.substitute_column(&column, &[Category::Person], &[]);
    let offset = engine.date_offset();
    assert_eq!(engine.store().len(), 1);

    engine.store().flush();

    assert!(engine.store().is_empty());
    assert_eq!(engine.date_offset(), offset);
}

#[test]
fn test_identifier_hash_stable_across_fresh_engines() {
    let config = AnonymizationConfig::default();
    let first = SubstitutionEngine::from_config(&config);
    let second = SubstitutionEngine::from_config(&config);

    assert_eq!(first.hash_identifier("FR-76-1234"), second.hash_identifier("FR-76-1234"));
    assert_ne!(first.hash_identifier("FR-76-1234"), first.hash_identifier("FR-76-1235"));

    let token = first.hash_identifier("FR-76-1234");
    assert!(token.starts_with("ID_"));
    assert_eq!(token.len(), "ID_".len() + 8);
    assert!(token[3..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
}

#[test]
fn test_date_gap_preserved_across_columns() {
    let engine = SubstitutionEngine::from_config(&AnonymizationConfig::default());
    let admissions = text_column("admitted", &["2020-01-01", "2020-03-15"]);
    let discharges = text_column("discharged", &["2020-01-11"]);

    let admitted = engine.substitute_column(&admissions, &[Category::Date], &[]);
    let discharged = engine.substitute_column(&discharges, &[Category::Date], &[]);

    let parse = |s: String| NaiveDate::parse_from_str(&s, "%Y-%m-%d").unwrap();
    let start = parse(texts(&admitted)[0].clone());
    let end = parse(texts(&discharged)[0].clone());
    assert_eq!((end - start).num_days(), 10);

    let offset = engine.date_offset();
    assert!((-365..=365).contains(&offset));
}

#[test_case("March 1, 2021", "April 11, 2021", 41 ; "english month first")]
#[test_case("1 March 2021", "11 April 2021", 41 ; "english day first")]
#[test_case("5 janvier 2021", "15 janvier 2021", 10 ; "french month")]
#[test_case("1er mars 2021", "3 MARS 2021", 2 ; "french ordinal")]
#[test_case("5 fevrier 2021", "20 février 2021", 15 ; "french unaccented")]
#[test_case("05/03/21", "20/06/21", 107 ; "two digit year")]
#[test_case("5.3.21", "6.3.21", 1 ; "dotted two digit year")]
#[test_case("05.03.2021", "05.04.2021", 31 ; "dotted four digit year")]
#[test_case("5/3/2021", "2021-03-12", 7 ; "slashes and iso")]
fn test_every_tagged_date_shape_is_shifted(earlier: &str, later: &str, gap: i64) {
    let engine = SubstitutionEngine::from_config(&AnonymizationConfig::default());
    let column = text_column("visit", &[earlier, later]);

    let shifted = texts(&engine.substitute_column(&column, &[Category::Date], &[]));

    let offset = engine.date_offset();
    for (original, result) in [earlier, later].iter().zip(&shifted) {
        let before = DateValue::parse(original).unwrap().date();
        let after = DateValue::parse(result)
            .unwrap_or_else(|| panic!("{result} is not a date"))
            .date();
        assert_eq!((after - before).num_days(), offset, "{original} -> {result}");
        if offset != 0 {
            assert_ne!(result, original);
        }
    }

    let start = DateValue::parse(&shifted[0]).unwrap().date();
    let end = DateValue::parse(&shifted[1]).unwrap().date();
    assert_eq!((end - start).num_days(), gap);
}

#[test]
fn test_short_years_stay_in_their_century() {
    let engine = SubstitutionEngine::from_config(&AnonymizationConfig::default());
    let column = text_column("admitted", &["2021-03-05", "05/03/21", "March 5, 2021"]);

    let shifted = texts(&engine.substitute_column(&column, &[Category::Date], &[]));

    let dates: Vec<NaiveDate> =
        shifted.iter().map(|s| DateValue::parse(s).unwrap().date()).collect();
    assert!(dates.windows(2).all(|pair| pair[0] == pair[1]), "{shifted:?}");
    assert!(shifted.iter().all(|s| !s.starts_with("000")));
    assert_eq!(shifted[1].len(), "05/03/21".len());
}

#[test]
fn test_unparseable_dates_pass_through() {
    let engine = SubstitutionEngine::from_config(&AnonymizationConfig::default());
    let column = text_column("admitted", &["unknown", "2020-02-30"]);

    let shifted = engine.substitute_column(&column, &[Category::Date], &[]);
    assert_eq!(shifted, column);
}

#[test]
fn test_masked_column_is_idempotent() {
    let engine = SubstitutionEngine::from_config(&AnonymizationConfig::default());
    let notes = text_column("notes", &["Patient with diabetes", "diabetes follow-up"]);
    let entities = vec![domain_entity("diabetes", 0.9)];
    let categories = vec![Category::Domain("DISEASE".into())];

    let once = engine.substitute_column(&notes, &categories, &entities);
    let twice = engine.substitute_column(&once, &categories, &entities);

    assert_ne!(once, notes);
    assert!(texts(&once).iter().all(|t| t.contains("MED_")));
    assert_eq!(once, twice);
}

#[test_case("pain", 0.3 ; "confidence below floor")]
#[test_case("ab", 0.9 ; "too short")]
#[test_case("the", 0.9 ; "stopword")]
#[test_case("---", 0.9 ; "no alphanumeric character")]
fn test_filtered_terms_are_not_masked(term: &str, confidence: f64) {
    let engine = SubstitutionEngine::from_config(&AnonymizationConfig::default());
    let original = format!("note: {term} reported");
    let notes = text_column("notes", &[original.as_str()]);

    let result = engine.substitute_column(
        &notes,
        &[Category::Domain("DISEASE".into())],
        &[domain_entity(term, confidence)],
    );

    assert_eq!(texts(&result), vec![original]);
}

#[test]
fn test_masking_keeps_longer_words_intact() {
    let engine = SubstitutionEngine::from_config(&AnonymizationConfig::default());
    let notes = text_column("notes", &["cell count low", "cellular response normal"]);

    let result = engine.substitute_column(
        &notes,
        &[Category::Domain("CELL".into())],
        &[DetectedEntity::new("cell", Category::Domain("CELL".into()), 0.8, "medical", None)],
    );

    let values = texts(&result);
    assert!(values[0].starts_with("MED_"));
    assert_eq!(values[1], "cellular response normal");
}

#[test]
fn test_substitute_keeps_shape_and_public_columns() {
    let engine = SubstitutionEngine::from_config(&AnonymizationConfig::default());
    let dataset = Dataset::new(vec![
        text_column("name", &["Alice Martin", "Bob Durand", "Alice Martin"]),
        Column::new(
            "age",
            vec![CellValue::Integer(31), CellValue::Null, CellValue::Float(44.5)],
        ),
        text_column("email", &["a@example.org", "b@example.org", "a@example.org"]),
    ])
    .unwrap();

    let report = DetectionReport::new(
        "patients.csv",
        "csv",
        dataset.shape(),
        vec![
            sensitive("name", vec![Category::Person]),
            ColumnClassification::empty("age"),
            sensitive("email", vec![Category::Email]),
        ],
    );

    let anonymized = engine.substitute(&dataset, &report);

    assert_eq!(anonymized.shape(), dataset.shape());
    assert_eq!(anonymized.column_names(), dataset.column_names());
    assert_eq!(anonymized.column("age"), dataset.column("age"));

    let names = texts(anonymized.column("name").unwrap());
    assert_eq!(names[0], names[2]);
    assert_ne!(names[0], "Alice Martin");

    let emails = texts(anonymized.column("email").unwrap());
    assert_eq!(emails[0], emails[2]);
    assert_ne!(emails[0], emails[1]);
}
