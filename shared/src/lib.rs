use serde::{Deserialize, Serialize};
use strum::{EnumCount, IntoEnumIterator};

/// Label returned when the classifier yields an index outside the species table.
pub const UNCLASSIFIED_LABEL: &str = "Unable to Classify Species";

/// The five species the classifier was trained on, in class-index order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumIter,
    strum_macros::EnumCount,
)]
pub enum FungiSpecies {
    #[strum(serialize = "Candida Albicans")]
    #[serde(rename = "Candida Albicans")]
    CandidaAlbicans,
    #[strum(serialize = "Aspergillus Niger")]
    #[serde(rename = "Aspergillus Niger")]
    AspergillusNiger,
    #[strum(serialize = "Trichophyton Rubrum")]
    #[serde(rename = "Trichophyton Rubrum")]
    TrichophytonRubrum,
    #[strum(serialize = "Trichophyton Mentagrophytes")]
    #[serde(rename = "Trichophyton Mentagrophytes")]
    TrichophytonMentagrophytes,
    #[strum(serialize = "Epidermophyton Floccosum")]
    #[serde(rename = "Epidermophyton Floccosum")]
    EpidermophytonFloccosum,
}

impl FungiSpecies {
    /// Maps a classifier index onto the static table. `None` for anything outside 0..5.
    pub fn from_index(index: i64) -> Option<Self> {
        if index < 0 || index as usize >= Self::COUNT {
            return None;
        }
        Self::iter().nth(index as usize)
    }

    pub fn labels() -> Vec<String> {
        Self::iter().map(|s| s.to_string()).collect()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ClassifyRequest {
    /// Base64 image, optionally prefixed with a data-URI header such as
    /// `data:image/png;base64,`.
    pub image: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClassProbability {
    pub label: String,
    pub probability: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FeatureBreakdown {
    pub glcm: Vec<f64>,
    pub lbp: Vec<f64>,
    pub hsv: Vec<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ClassifyResponse {
    pub class: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<ClassProbability>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureBreakdown>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}
