//! Unsupervised outlier scoring
//!
//! [`StandardScaler`] centers and scales feature columns; [`IsolationForest`]
//! isolates points with random axis-aligned splits and flags the
//! `contamination` share of points with the shortest average path length.
//! Both are deterministic for a given seed.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Euler–Mascheroni constant, used by the average path length of a BST
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Subsample size cap per tree
const MAX_SUBSAMPLE: usize = 256;

/// Outlier scoring errors
#[derive(Debug, Error, PartialEq)]
pub enum OutlierError {
    #[error("no samples to score")]
    Empty,

    #[error("need at least {required} samples, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },

    #[error("feature rows have inconsistent dimensions")]
    RaggedFeatures,

    #[error("feature matrix contains a non-finite value")]
    NonFinite,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Zero-mean, unit-variance feature scaling
///
/// Uses the population standard deviation; constant features are only
/// centered.
#[derive(Debug, Default, Clone)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(&mut self, data: &[Vec<f64>]) -> Result<(), OutlierError> {
        let dims = check_matrix(data)?;
        let n = data.len() as f64;

        self.means = (0..dims)
            .map(|j| data.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect();
        self.scales = (0..dims)
            .map(|j| {
                let mean = self.means[j];
                let var = data.iter().map(|row| (row[j] - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                if std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Ok(())
    }

    pub fn transform(&self, data: &[Vec<f64>]) -> Vec<Vec<f64>> {
        data.iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(j, v)| (v - self.means[j]) / self.scales[j])
                    .collect()
            })
            .collect()
    }

    pub fn fit_transform(&mut self, data: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, OutlierError> {
        self.fit(data)?;
        Ok(self.transform(data))
    }
}

#[derive(Debug)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Isolation forest outlier detector
#[derive(Debug, Clone)]
pub struct IsolationForest {
    pub n_estimators: usize,
    /// Expected share of outliers, in (0, 0.5]
    pub contamination: f64,
    pub seed: u64,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            contamination: 0.1,
            seed: 42,
        }
    }
}

impl IsolationForest {
    pub fn new(n_estimators: usize, contamination: f64, seed: u64) -> Self {
        Self {
            n_estimators,
            contamination,
            seed,
        }
    }

    /// Anomaly score of every row, in (0, 1]; higher is more anomalous
    pub fn score_samples(&self, data: &[Vec<f64>]) -> Result<Vec<f64>, OutlierError> {
        check_matrix(data)?;
        if data.len() < 2 {
            return Err(OutlierError::InsufficientSamples {
                required: 2,
                actual: data.len(),
            });
        }
        if self.n_estimators == 0 {
            return Err(OutlierError::InvalidParameter(
                "n_estimators must be positive".to_string(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let psi = data.len().min(MAX_SUBSAMPLE);
        let height_limit = (psi as f64).log2().ceil() as usize;

        let trees: Vec<Node> = (0..self.n_estimators)
            .map(|_| {
                let subsample = index::sample(&mut rng, data.len(), psi).into_vec();
                build_tree(data, subsample, 0, height_limit, &mut rng)
            })
            .collect();

        let normalizer = average_path_length(psi);
        Ok(data
            .iter()
            .map(|row| {
                let mean_path = trees.iter().map(|t| path_length(row, t, 0)).sum::<f64>()
                    / trees.len() as f64;
                2f64.powf(-mean_path / normalizer)
            })
            .collect())
    }

    /// Flags each row as outlier (`true`) or inlier.
    ///
    /// Rows scoring strictly above the `(1 - contamination)` quantile of the
    /// scores are outliers.
    pub fn fit_predict(&self, data: &[Vec<f64>]) -> Result<Vec<bool>, OutlierError> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(OutlierError::InvalidParameter(format!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }

        let scores = self.score_samples(data)?;
        let threshold = quantile(&scores, 1.0 - self.contamination);
        Ok(scores.iter().map(|s| *s > threshold).collect())
    }
}

fn check_matrix(data: &[Vec<f64>]) -> Result<usize, OutlierError> {
    let dims = data.first().map(Vec::len).ok_or(OutlierError::Empty)?;
    if data.iter().any(|row| row.len() != dims) {
        return Err(OutlierError::RaggedFeatures);
    }
    if data.iter().flatten().any(|v| !v.is_finite()) {
        return Err(OutlierError::NonFinite);
    }
    Ok(dims)
}

fn build_tree(
    data: &[Vec<f64>],
    points: Vec<usize>,
    depth: usize,
    height_limit: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= height_limit || points.len() <= 1 {
        return Node::Leaf { size: points.len() };
    }

    // Only features that still vary can split this node
    let dims = data[points[0]].len();
    let candidates: Vec<(usize, f64, f64)> = (0..dims)
        .filter_map(|j| {
            let (min, max) = points.iter().fold((f64::MAX, f64::MIN), |(lo, hi), &p| {
                (lo.min(data[p][j]), hi.max(data[p][j]))
            });
            (max > min).then_some((j, min, max))
        })
        .collect();

    if candidates.is_empty() {
        return Node::Leaf { size: points.len() };
    }

    let (feature, min, max) = candidates[rng.gen_range(0..candidates.len())];
    let threshold = rng.gen_range(min..max);
    let (left, right): (Vec<usize>, Vec<usize>) =
        points.into_iter().partition(|&p| data[p][feature] < threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(build_tree(data, left, depth + 1, height_limit, rng)),
        right: Box::new(build_tree(data, right, depth + 1, height_limit, rng)),
    }
}

fn path_length(row: &[f64], node: &Node, depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if row[*feature] < *threshold {
                path_length(row, left, depth + 1)
            } else {
                path_length(row, right, depth + 1)
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated quantile, `q` in [0, 1]
fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    if sorted.is_empty() {
        return 0.0;
    }

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaler_zero_variance_column() {
        let data = vec![vec![1.0, 5.0], vec![3.0, 5.0]];
        let mut scaler = StandardScaler::default();
        let scaled = scaler.fit_transform(&data).unwrap();

        assert_eq!(scaled[0], vec![-1.0, 0.0]);
        assert_eq!(scaled[1], vec![1.0, 0.0]);
    }

    #[test]
    fn test_scaler_rejects_non_finite() {
        let mut scaler = StandardScaler::default();
        let err = scaler.fit(&[vec![f64::NAN]]).unwrap_err();
        assert_eq!(err, OutlierError::NonFinite);
    }

    #[test]
    fn test_quantile_interpolates() {
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0], 0.5), 2.5);
        assert_eq!(quantile(&[4.0, 1.0], 1.0), 4.0);
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!(average_path_length(256) > 9.0);
    }

    #[test]
    fn test_isolates_obvious_outlier() {
        let mut data: Vec<Vec<f64>> = (0..40).map(|i| vec![(i % 4) as f64, 1.0]).collect();
        data.push(vec![50.0, -30.0]);

        let flags = IsolationForest::default().fit_predict(&data).unwrap();
        assert!(flags[40]);
        let flagged = flags.iter().filter(|f| **f).count();
        assert!(flagged <= 5, "flagged {flagged}");
    }

    #[test]
    fn test_deterministic_for_seed() {
        let data: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![(i * 7 % 11) as f64, (i % 3) as f64])
            .collect();
        let forest = IsolationForest::new(50, 0.1, 7);
        assert_eq!(forest.score_samples(&data).unwrap(), forest.score_samples(&data).unwrap());
    }

    #[test]
    fn test_identical_rows_have_no_outliers() {
        let data = vec![vec![1.0, 2.0]; 20];
        let flags = IsolationForest::default().fit_predict(&data).unwrap();
        assert!(flags.iter().all(|f| !f));
    }

    #[test]
    fn test_invalid_contamination() {
        let forest = IsolationForest::new(10, 0.9, 42);
        let err = forest.fit_predict(&[vec![1.0], vec![2.0]]).unwrap_err();
        assert!(matches!(err, OutlierError::InvalidParameter(_)));
    }
}
