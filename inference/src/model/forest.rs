use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::artifact::{ClassifierArtifact, argmax, check_width};
use super::tree::{DecisionTree, SplitRule};
use crate::error::InferenceError;

/// Bagged decision trees; probabilities are the mean of per-tree leaf
/// class distributions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub classes: Vec<i64>,
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("random forest has no classes".to_string());
        }
        if self.trees.is_empty() {
            return Err("random forest has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }
}

impl ClassifierArtifact for RandomForest {
    fn predict(&self, batch: ArrayView2<'_, f64>) -> Result<Vec<i64>, InferenceError> {
        let proba = self.predict_proba(batch)?;
        proba
            .rows()
            .into_iter()
            .map(|row| {
                let row = row.to_vec();
                argmax(&row)
                    .map(|k| self.classes[k])
                    .ok_or_else(|| InferenceError::Prediction("empty probability row".to_string()))
            })
            .collect()
    }

    fn predict_proba(&self, batch: ArrayView2<'_, f64>) -> Result<Array2<f64>, InferenceError> {
        check_width(&batch, self.n_features)?;
        let n_classes = self.classes.len();
        let mut out = Array2::<f64>::zeros((batch.nrows(), n_classes));

        for (row, mut dst) in batch.rows().into_iter().zip(out.rows_mut()) {
            for tree in &self.trees {
                let leaf = tree.leaf(row, SplitRule::LessOrEqual);
                let total: f64 = leaf.iter().sum();
                if total <= 0.0 {
                    continue;
                }
                for (d, v) in dst.iter_mut().zip(leaf) {
                    *d += v / total;
                }
            }
            dst.mapv_inplace(|p| p / self.trees.len() as f64);
        }
        Ok(out)
    }
}
