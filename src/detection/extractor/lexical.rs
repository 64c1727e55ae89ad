//! Rule and gazetteer tagger used when no transformer backend is available
//!
//! Recognizes person names (courtesy titles, a given-name lexicon, the
//! `Firstname LASTNAME` convention), places (city and country gazetteer,
//! street addresses), organizations (legal and healthcare institution
//! markers) and dates, in English and French. Rules run in a fixed priority
//! order and a span already claimed by a higher-priority rule is not tagged
//! twice.

use super::{BackendKind, NerBackend, RawEntity};
use crate::domain::NerError;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;

const GIVEN_NAMES: &[&str] = &[
    "Adam", "Alexandre", "Alice", "Amelia", "Anna", "Anne", "Antoine", "Arthur", "Camille",
    "Catherine", "Charles", "Charlotte", "Chloé", "Claire", "Daniel", "David", "Elizabeth",
    "Emily", "Emma", "François", "Françoise", "Gabriel", "George", "Hugo", "Isabelle", "Jacques",
    "James", "Jean", "Jeanne", "Jennifer", "John", "Julie", "Julien", "Laura", "Léa", "Linda",
    "Louis", "Louise", "Lucas", "Manon", "Marc", "Margaret", "Marie", "Mary", "Mathieu",
    "Michael", "Michel", "Nathalie", "Nicolas", "Olivia", "Patricia", "Paul", "Philippe",
    "Pierre", "Robert", "Sarah", "Sophie", "Thomas", "William", "Yasmine",
];

const PLACES: &[&str] = &[
    "Paris", "Marseille", "Lyon", "Toulouse", "Nice", "Nantes", "Strasbourg", "Montpellier",
    "Bordeaux", "Lille", "Rennes", "Reims", "Grenoble", "Dijon", "Angers", "Brest", "Tours",
    "Limoges", "Rouen", "Metz", "Nancy", "Bruxelles", "Brussels", "Genève", "Geneva",
    "Lausanne", "Montréal", "Montreal", "Québec", "Dakar", "Abidjan", "Casablanca", "Tunis",
    "Alger", "London", "Manchester", "Dublin", "Madrid", "Barcelona", "Berlin", "Rome",
    "Amsterdam", "New York", "Boston", "Chicago", "San Francisco", "Los Angeles", "Toronto",
    "France", "Belgique", "Belgium", "Suisse", "Switzerland", "Canada", "Maroc", "Morocco",
    "Sénégal", "Senegal", "Espagne", "Spain", "Allemagne", "Germany", "Italie", "Italy",
];

const MONTHS: &str = "janvier|février|fevrier|mars|avril|mai|juin|juillet|août|aout|septembre|octobre|novembre|décembre|decembre|january|february|march|april|may|june|july|august|september|october|november|december";

/// Lexical NER backend
pub struct LexicalTagger {
    /// Rules in priority order, with the label they produce
    rules: Vec<(&'static str, Regex)>,
    given_names: HashSet<&'static str>,
    capitalized_pair: Regex,
}

impl LexicalTagger {
    pub fn new() -> Result<Self, NerError> {
        let places = PLACES
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");

        let patterns: Vec<(&'static str, String)> = vec![
            ("DATE", r"\b\d{4}-\d{2}-\d{2}\b".to_string()),
            ("DATE", r"\b\d{1,2}[/.]\d{1,2}[/.]\d{2,4}\b".to_string()),
            (
                "DATE",
                format!(r"(?i)\b\d{{1,2}}(?:er)?\s+(?:{MONTHS})\s+\d{{4}}\b"),
            ),
            (
                "DATE",
                format!(r"(?i)\b(?:{MONTHS})\s+\d{{1,2}},?\s+\d{{4}}\b"),
            ),
            (
                "ORG",
                r"\b(?:Hôpital|Hopital|Clinique|Université|Centre Hospitalier|CHU|Laboratoires?|Institut|Hospital of|University of)(?:\s+(?:de|du|des|la|le|d')?\s*\p{Lu}[\p{L}'-]*){1,4}".to_string(),
            ),
            (
                "ORG",
                r"\b(?:\p{Lu}[\p{L}&'-]*\s+){1,4}(?:Inc|Ltd|LLC|Corp|Corporation|SA|SAS|SARL|GmbH|AG|Group|Groupe|Hospital|Clinic|University|Pharma|Pharmaceuticals)\b\.?".to_string(),
            ),
            (
                "PER",
                r"\b(?:Mr|Mrs|Ms|Miss|Dr|Prof|Mme|Mlle|Pr)\.?\s+\p{Lu}[\p{L}'-]+(?:\s+\p{Lu}[\p{L}'-]+)?".to_string(),
            ),
            (
                "PER",
                r"\bM\.\s+\p{Lu}[\p{L}'-]+(?:\s+\p{Lu}[\p{L}'-]+)?".to_string(),
            ),
            (
                "PER",
                r"\b\p{Lu}\p{Ll}+(?:-\p{Lu}\p{Ll}+)?\s+\p{Lu}{2,}(?:-\p{Lu}{2,})?\b".to_string(),
            ),
            (
                "LOC",
                r"(?i)\b\d{1,4},?\s+(?:rue|avenue|av\.|boulevard|bd|chemin|place|allée|impasse|quai|street|st\.|road|rd\.|lane|drive|ave\.)\s+[^,\n]{2,40}".to_string(),
            ),
            ("LOC", format!(r"\b(?:{places})\b")),
        ];

        let rules = patterns
            .into_iter()
            .map(|(label, pattern)| {
                Regex::new(&pattern)
                    .map(|re| (label, re))
                    .map_err(|e| NerError::Unavailable(format!("invalid lexical rule: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let capitalized_pair = Regex::new(r"\b\p{Lu}[\p{Ll}'-]+(?:\s+\p{Lu}[\p{Ll}'-]+)?")
            .map_err(|e| NerError::Unavailable(format!("invalid lexical rule: {e}")))?;

        Ok(Self {
            rules,
            given_names: GIVEN_NAMES.iter().copied().collect(),
            capitalized_pair,
        })
    }

    /// Tags a text synchronously
    pub fn tag(&self, text: &str) -> Vec<RawEntity> {
        let mut claimed: Vec<(usize, usize)> = Vec::new();
        let mut found = Vec::new();

        let mut accept = |label: &str, start: usize, end: usize, found: &mut Vec<RawEntity>| {
            if claimed.iter().any(|&(s, e)| start < e && s < end) {
                return;
            }
            claimed.push((start, end));
            found.push(RawEntity {
                word: text[start..end].trim().to_string(),
                label: label.to_string(),
                score: 1.0,
                start: Some(start),
                end: Some(end),
            });
        };

        for (label, regex) in &self.rules {
            for m in regex.find_iter(text) {
                accept(label, m.start(), m.end(), &mut found);
            }
        }

        // Capitalized words starting with a known given name
        for m in self.capitalized_pair.find_iter(text) {
            let first = m.as_str().split_whitespace().next().unwrap_or_default();
            if self.given_names.contains(first) {
                accept("PER", m.start(), m.end(), &mut found);
            }
        }

        found.sort_by_key(|e| e.start);
        found
    }
}

#[async_trait]
impl NerBackend for LexicalTagger {
    fn name(&self) -> &str {
        "lexical"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Lexical
    }

    async fn recognize(&self, text: &str) -> Result<Vec<RawEntity>, NerError> {
        Ok(self.tag(text))
    }

    async fn probe(&self) -> Result<(), NerError> {
        Ok(())
    }
}
