//! Regression models: linear and tree ensembles.
//!
//! The model is trained on log resale price, so every output here is a
//! log-price. Inputs are expected to be scaled already.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Marker in `children_left`/`children_right` for a leaf node.
pub const LEAF: i64 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressionModel {
    /// `y = intercept + Σ coefficients[j] * x[j]`
    Linear { coefficients: Vec<f64>, intercept: f64 },
    /// Mean of the tree outputs (a single tree is a plain decision tree).
    TreeEnsemble { trees: Vec<RegressionTree> },
}

/// A binary regression tree in flat-array form.
///
/// Node `i` is a leaf when `children_left[i] == -1`; otherwise samples with
/// `x[feature[i]] <= threshold[i]` go left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

impl RegressionTree {
    fn validate(&self, n_features: usize, tree_idx: usize) -> Result<(), AppError> {
        let n = self.value.len();
        let lens = [
            self.children_left.len(),
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
        ];
        if n == 0 || lens.iter().any(|&l| l != n) {
            return Err(AppError::model_artifact(format!(
                "Tree {tree_idx}: node arrays are empty or have different lengths."
            )));
        }

        for i in 0..n {
            let (left, right) = (self.children_left[i], self.children_right[i]);
            if left == LEAF {
                if !self.value[i].is_finite() {
                    return Err(AppError::model_artifact(format!(
                        "Tree {tree_idx}: leaf {i} has a non-finite value."
                    )));
                }
                continue;
            }
            // Children must come after their parent so traversal terminates.
            let in_range = |c: i64| c > i as i64 && (c as usize) < n;
            if !in_range(left) || !in_range(right) {
                return Err(AppError::model_artifact(format!(
                    "Tree {tree_idx}: node {i} has invalid children ({left}, {right})."
                )));
            }
            let f = self.feature[i];
            if f < 0 || f as usize >= n_features {
                return Err(AppError::model_artifact(format!(
                    "Tree {tree_idx}: node {i} splits on feature {f}, model has {n_features}."
                )));
            }
        }
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let f = self.feature[node] as usize;
            node = if row[f] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        self.value[node]
    }
}

impl RegressionModel {
    pub fn validate(&self, n_features: usize) -> Result<(), AppError> {
        match self {
            RegressionModel::Linear {
                coefficients,
                intercept,
            } => {
                if coefficients.len() != n_features {
                    return Err(AppError::model_artifact(format!(
                        "Linear model has {} coefficients, pipeline produces {n_features} features.",
                        coefficients.len()
                    )));
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(AppError::model_artifact("Linear model has non-finite parameters."));
                }
            }
            RegressionModel::TreeEnsemble { trees } => {
                if trees.is_empty() {
                    return Err(AppError::model_artifact("Tree ensemble has no trees."));
                }
                for (idx, tree) in trees.iter().enumerate() {
                    tree.validate(n_features, idx)?;
                }
            }
        }
        Ok(())
    }

    pub fn display_name(&self) -> String {
        match self {
            RegressionModel::Linear { .. } => "linear".to_string(),
            RegressionModel::TreeEnsemble { trees } if trees.len() == 1 => "decision tree".to_string(),
            RegressionModel::TreeEnsemble { trees } => format!("tree ensemble ({} trees)", trees.len()),
        }
    }

    /// Predict a batch of already-scaled samples (one per row).
    ///
    /// Call [`RegressionModel::validate`] first; tree traversal indexes
    /// without bounds checks on the feature width.
    pub fn predict(&self, batch: &DMatrix<f64>) -> DVector<f64> {
        match self {
            RegressionModel::Linear {
                coefficients,
                intercept,
            } => {
                let w = DVector::from_row_slice(coefficients);
                let mut y = batch * w;
                y.add_scalar_mut(*intercept);
                y
            }
            RegressionModel::TreeEnsemble { trees } => {
                let n_trees = trees.len() as f64;
                DVector::from_iterator(
                    batch.nrows(),
                    batch.row_iter().map(|row| {
                        let row: Vec<f64> = row.iter().copied().collect();
                        trees.iter().map(|t| t.predict_row(&row)).sum::<f64>() / n_trees
                    }),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    /// Stump on feature 0 at 0.5: left → 1.0, right → 3.0.
    fn stump(left: f64, right: f64) -> RegressionTree {
        RegressionTree {
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
            feature: vec![0, -2, -2],
            threshold: vec![0.5, -2.0, -2.0],
            value: vec![0.0, left, right],
        }
    }

    #[test]
    fn linear_prediction_matches_dot_product() {
        let model = RegressionModel::Linear {
            coefficients: vec![1.0, 2.0, 3.0],
            intercept: 0.5,
        };
        model.validate(3).unwrap();
        let batch = DMatrix::from_row_slice(2, 3, &[1.0, 1.0, 1.0, 0.0, -1.0, 2.0]);
        let y = model.predict(&batch);
        assert_eq!(y.as_slice(), &[6.5, 4.5]);
    }

    #[test]
    fn tree_ensemble_averages_trees() {
        let model = RegressionModel::TreeEnsemble {
            trees: vec![stump(1.0, 3.0), stump(2.0, 5.0)],
        };
        model.validate(1).unwrap();
        let batch = DMatrix::from_row_slice(3, 1, &[0.0, 0.5, 0.9]);
        let y = model.predict(&batch);
        assert_eq!(y.as_slice(), &[1.5, 1.5, 4.0]);
    }

    #[test]
    fn validate_rejects_bad_shapes() {
        let linear = RegressionModel::Linear {
            coefficients: vec![1.0; 4],
            intercept: 0.0,
        };
        assert_eq!(linear.validate(5).unwrap_err().kind(), ErrorKind::ModelArtifact);

        let mut cyclic = stump(1.0, 2.0);
        cyclic.children_left[0] = 0;
        let model = RegressionModel::TreeEnsemble { trees: vec![cyclic] };
        assert_eq!(model.validate(1).unwrap_err().kind(), ErrorKind::ModelArtifact);

        let model = RegressionModel::TreeEnsemble {
            trees: vec![stump(1.0, 2.0)],
        };
        assert!(model.validate(1).is_ok());
        let mut wide = stump(1.0, 2.0);
        wide.feature[0] = 3;
        let model = RegressionModel::TreeEnsemble { trees: vec![wide] };
        assert_eq!(model.validate(1).unwrap_err().kind(), ErrorKind::ModelArtifact);
    }

    #[test]
    fn decodes_tagged_json() {
        let model: RegressionModel =
            serde_json::from_str(r#"{"kind": "linear", "coefficients": [1.0, 2.0], "intercept": 0.0}"#).unwrap();
        assert_eq!(model.display_name(), "linear");
    }
}
