//! Contact and identifier signals
//!
//! Pattern heuristics for emails and phone numbers, plus identifier
//! detection by outlier scoring over character-class features.

use super::outlier::{IsolationForest, OutlierError, StandardScaler};
use crate::config::OutlierConfig;
use serde::{Deserialize, Serialize};

/// Number of character-class features per value
pub const FEATURE_COUNT: usize = 12;

/// Contact signals observed in a column sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactSignals {
    pub has_email: bool,
    pub has_phone: bool,
    pub has_id: bool,
    pub email_count: usize,
    pub phone_count: usize,
    /// Share of scored values flagged as outliers
    pub id_ratio: f64,
}

/// True when the value looks like an email address
pub fn is_email(text: &str) -> bool {
    let parts: Vec<&str> = text.split('@').collect();
    parts.len() == 2 && parts[1].contains('.')
}

/// Share of ASCII digits among the characters of `text`
pub fn digit_ratio(text: &str) -> f64 {
    let len = text.chars().count().max(1);
    let digits = text.chars().filter(char::is_ascii_digit).count();
    digits as f64 / len as f64
}

/// True when the value looks like a phone number
pub fn is_phone(text: &str) -> bool {
    let ratio = digit_ratio(text);
    (ratio > 0.6 && text.chars().count() >= 8) || (text.starts_with('+') && ratio > 0.5)
}

/// Character-class feature vector of a value
///
/// Length; digit, alphabetic, uppercase, lowercase and punctuation counts;
/// counts of `-`, `_`, `.` and `@`; whether the value is fully alphanumeric;
/// whether it is fully numeric.
pub fn features(text: &str) -> [f64; FEATURE_COUNT] {
    let count = |pred: fn(&char) -> bool| text.chars().filter(pred).count() as f64;
    let occurrences = |needle: char| text.chars().filter(|c| *c == needle).count() as f64;
    let non_empty = !text.is_empty();

    [
        text.chars().count() as f64,
        count(char::is_ascii_digit),
        count(|c| c.is_alphabetic()),
        count(|c| c.is_uppercase()),
        count(|c| c.is_lowercase()),
        count(|c| !c.is_alphanumeric() && !c.is_whitespace()),
        occurrences('-'),
        occurrences('_'),
        occurrences('.'),
        occurrences('@'),
        f64::from(u8::from(non_empty && text.chars().all(char::is_alphanumeric))),
        f64::from(u8::from(non_empty && text.chars().all(|c| c.is_ascii_digit()))),
    ]
}

/// Pattern- and statistics-based contact detector
#[derive(Debug, Clone)]
pub struct ContactSignalAnalyzer {
    forest: IsolationForest,
    min_samples: usize,
    max_samples: usize,
    id_ratio_threshold: f64,
}

impl Default for ContactSignalAnalyzer {
    fn default() -> Self {
        Self::new(&OutlierConfig::default())
    }
}

impl ContactSignalAnalyzer {
    pub fn new(config: &OutlierConfig) -> Self {
        Self {
            forest: IsolationForest::new(config.n_estimators, config.contamination, config.seed),
            min_samples: config.min_samples,
            max_samples: config.max_samples,
            id_ratio_threshold: config.id_ratio_threshold,
        }
    }

    /// Computes email, phone and identifier signals over a sample.
    ///
    /// Email and phone counts cover every sample value. Identifier scoring
    /// uses the first `max_samples` values and needs at least `min_samples`
    /// of them; a scoring failure leaves `id_ratio` at zero.
    pub fn analyze<S: AsRef<str>>(&self, samples: &[S]) -> ContactSignals {
        let email_count = samples.iter().filter(|s| is_email(s.as_ref())).count();
        let phone_count = samples.iter().filter(|s| is_phone(s.as_ref())).count();

        let mut signals = ContactSignals {
            has_email: email_count > 0,
            has_phone: phone_count > 0,
            email_count,
            phone_count,
            ..ContactSignals::default()
        };

        match self.identifier_ratio(samples) {
            Ok(Some(ratio)) => {
                signals.id_ratio = ratio;
                signals.has_id = ratio > self.id_ratio_threshold;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(error = %e, "Identifier scoring failed, id_ratio left at 0");
            }
        }

        signals
    }

    fn identifier_ratio<S: AsRef<str>>(&self, samples: &[S]) -> Result<Option<f64>, OutlierError> {
        let rows: Vec<Vec<f64>> = samples
            .iter()
            .take(self.max_samples)
            .map(|s| features(s.as_ref()).to_vec())
            .collect();

        if rows.len() < self.min_samples {
            return Ok(None);
        }

        let scaled = StandardScaler::default().fit_transform(&rows)?;
        let flags = self.forest.fit_predict(&scaled)?;
        let outliers = flags.iter().filter(|f| **f).count();

        Ok(Some(outliers as f64 / flags.len() as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_heuristic() {
        assert!(is_email("jean.dupont@example.fr"));
        assert!(!is_email("a@b@c.com"));
        assert!(!is_email("user@localhost"));
        assert!(!is_email("no-at-sign.com"));
    }

    #[test]
    fn test_phone_heuristic() {
        assert!(is_phone("0612345678"));
        assert!(is_phone("06 12 34 56 78"));
        assert!(is_phone("+33612"));
        assert!(!is_phone("1234567"));
        assert!(!is_phone("Room 12"));
    }

    #[test]
    fn test_features_layout() {
        let f = features("AB-12_c.d@");
        assert_eq!(f[0], 10.0);
        assert_eq!(f[1], 2.0);
        assert_eq!(f[2], 4.0);
        assert_eq!(f[3], 2.0);
        assert_eq!(f[4], 2.0);
        assert_eq!(f[5], 4.0);
        assert_eq!(&f[6..10], &[1.0, 1.0, 1.0, 1.0]);
        assert_eq!(f[10], 0.0);
        assert_eq!(features("12345")[11], 1.0);
        assert_eq!(features("")[10], 0.0);
    }

    #[test]
    fn test_analyze_counts() {
        let samples = vec!["a@x.org", "b@y.org", "0612345678", "plain"];
        let signals = ContactSignalAnalyzer::default().analyze(&samples);

        assert!(signals.has_email);
        assert_eq!(signals.email_count, 2);
        assert!(signals.has_phone);
        assert_eq!(signals.phone_count, 1);
        // Too few values for identifier scoring
        assert_eq!(signals.id_ratio, 0.0);
        assert!(!signals.has_id);
    }

    #[test]
    fn test_identifier_scoring_bounded_by_contamination() {
        let samples: Vec<String> = (0..60).map(|i| format!("PAT-{i:05}")).collect();
        let signals = ContactSignalAnalyzer::default().analyze(&samples);

        assert!(signals.id_ratio <= 0.1 + 1e-9);
        assert!(!signals.has_id);
    }

    #[test]
    fn test_identifier_ratio_on_mixed_values() {
        let mut samples: Vec<String> = vec!["yes".to_string(); 45];
        samples.extend(["X9-QQ_7.z@", "##!!", "LONGVALUE-WITH-SEPARATORS-123"].map(String::from));

        let config = OutlierConfig {
            id_ratio_threshold: 0.05,
            ..OutlierConfig::default()
        };
        let signals = ContactSignalAnalyzer::new(&config).analyze(&samples);

        assert!(signals.id_ratio > 0.05);
        assert!(signals.has_id);
    }
}
