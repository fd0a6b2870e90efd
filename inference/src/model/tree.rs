use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

/// How a split node compares a feature against its threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplitRule {
    /// `x <= threshold` goes left, threshold kept in double precision.
    LessOrEqual,
    /// `x < threshold` goes left, both sides in single precision.
    Less,
}

impl SplitRule {
    // Tree ensembles see features as f32 even when they are stored as f64.
    fn goes_left(self, x: f64, threshold: f64) -> bool {
        match self {
            SplitRule::LessOrEqual => (x as f32 as f64) <= threshold,
            SplitRule::Less => (x as f32) < (threshold as f32),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<Node>,
}

impl DecisionTree {
    /// Checks node references so that evaluation always terminates in a leaf.
    ///
    /// Children must come after their parent, which is how exported trees are laid out.
    pub fn validate(&self, n_features: usize, leaf_width: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split { feature, left, right, .. } => {
                    if *feature >= n_features {
                        return Err(format!("node {} splits on feature {} of {}", idx, feature, n_features));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {} has invalid child {}", idx, child));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if value.len() != leaf_width {
                        return Err(format!(
                            "leaf {} has {} values, expected {}",
                            idx,
                            value.len(),
                            leaf_width
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn leaf(&self, row: ArrayView1<'_, f64>, rule: SplitRule) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split { feature, threshold, left, right } => {
                    idx = if rule.goes_left(row[*feature], *threshold) { *left } else { *right };
                }
                Node::Leaf { value } => return value,
            }
        }
    }
}
