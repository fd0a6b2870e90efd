use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::artifact::{ClassifierArtifact, argmax, check_width};
use super::tree::{DecisionTree, SplitRule};
use crate::error::InferenceError;

fn default_base_score() -> f64 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostedTree {
    /// Column of the margin this tree contributes to.
    pub class: usize,
    #[serde(flatten)]
    pub tree: DecisionTree,
}

/// Multiclass gradient boosted trees with a softmax over per-class margins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    pub classes: Vec<i64>,
    pub n_features: usize,
    #[serde(default = "default_base_score")]
    pub base_score: f64,
    pub trees: Vec<BoostedTree>,
}

impl GradientBoosting {
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("gradient boosting model has no classes".to_string());
        }
        for (i, boosted) in self.trees.iter().enumerate() {
            if boosted.class >= self.classes.len() {
                return Err(format!("tree {} targets class column {}", i, boosted.class));
            }
            boosted
                .tree
                .validate(self.n_features, 1)
                .map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }

    fn margins(&self, row: ndarray::ArrayView1<'_, f64>) -> Vec<f64> {
        let mut margins = vec![self.base_score; self.classes.len()];
        for boosted in &self.trees {
            margins[boosted.class] += boosted.tree.leaf(row, SplitRule::Less)[0];
        }
        margins
    }
}

fn softmax(margins: &[f64]) -> Vec<f64> {
    let max = margins.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = margins.iter().map(|m| (m - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

impl ClassifierArtifact for GradientBoosting {
    fn predict(&self, batch: ArrayView2<'_, f64>) -> Result<Vec<i64>, InferenceError> {
        check_width(&batch, self.n_features)?;
        batch
            .rows()
            .into_iter()
            .map(|row| {
                argmax(&self.margins(row))
                    .map(|k| self.classes[k])
                    .ok_or_else(|| InferenceError::Prediction("no class margins".to_string()))
            })
            .collect()
    }

    fn predict_proba(&self, batch: ArrayView2<'_, f64>) -> Result<Array2<f64>, InferenceError> {
        check_width(&batch, self.n_features)?;
        let mut out = Array2::<f64>::zeros((batch.nrows(), self.classes.len()));
        for (row, mut dst) in batch.rows().into_iter().zip(out.rows_mut()) {
            for (d, p) in dst.iter_mut().zip(softmax(&self.margins(row))) {
                *d = p;
            }
        }
        Ok(out)
    }
}
