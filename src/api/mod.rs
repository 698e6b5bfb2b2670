use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::emotion::EmotionScorecard;
use crate::geo::Coordinates;

mod http;

pub use http::HttpBackend;

/// One recommended kind of green space, as computed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationCategory {
    pub category: String,
    #[serde(default)]
    pub content: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendResponse {
    #[serde(default)]
    recommended_categories: Option<Vec<RecommendationCategory>>,
}

/// The remote API the results view talks to. All scoring happens server side.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn submit_emotions(&self, nickname: &str, card: &EmotionScorecard) -> Result<()>;
    async fn submit_location(&self, nickname: &str, coords: Coordinates) -> Result<()>;
    async fn recommend_for_user(&self, nickname: &str) -> Result<Vec<RecommendationCategory>>;
    async fn generate_summary(&self, nickname: &str) -> Result<()>;
}
