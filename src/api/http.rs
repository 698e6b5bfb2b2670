use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Request};
use serde_json::json;
use std::time::Duration;
use url::Url;

use super::{Backend, RecommendResponse, RecommendationCategory};
use crate::config::Config;
use crate::emotion::EmotionScorecard;
use crate::geo::Coordinates;
use crate::logging::{v_str, ProfileScope};

pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(cfg: &Config) -> Result<Self> {
        let base = Url::parse(&cfg.api_url).with_context(|| format!("invalid API_URL {}", cfg.api_url))?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("API_URL cannot be a base: {}", cfg.api_url));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("API base cannot hold a path: {}", self.base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl HttpBackend {
    fn emotions_request(&self, nickname: &str, card: &EmotionScorecard) -> Result<Request> {
        let url = self.endpoint(&["emotions"])?;
        Ok(self
            .client
            .post(url)
            .json(&json!({ "nickname": nickname, "emotions": card }))
            .build()?)
    }

    fn location_request(&self, nickname: &str, coords: Coordinates) -> Result<Request> {
        let url = self.endpoint(&["emotions", nickname, "location"])?;
        Ok(self.client.put(url).json(&coords).build()?)
    }

    fn recommend_request(&self, nickname: &str) -> Result<Request> {
        let mut url = self.endpoint(&["recommend_for_user"])?;
        url.query_pairs_mut().append_pair("user_nickname", nickname);
        Ok(self.client.post(url).build()?)
    }

    fn summary_request(&self, nickname: &str) -> Result<Request> {
        let url = self.endpoint(&["generate_summary"])?;
        Ok(self
            .client
            .post(url)
            .json(&json!({ "nickname": nickname }))
            .build()?)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn submit_emotions(&self, nickname: &str, card: &EmotionScorecard) -> Result<()> {
        let _p = ProfileScope::with_context("submit_emotions", &[("nickname", v_str(nickname))]);
        let req = self.emotions_request(nickname, card)?;
        self.client.execute(req).await?.error_for_status()?;
        Ok(())
    }

    async fn submit_location(&self, nickname: &str, coords: Coordinates) -> Result<()> {
        let _p = ProfileScope::with_context("submit_location", &[("nickname", v_str(nickname))]);
        let req = self.location_request(nickname, coords)?;
        self.client.execute(req).await?.error_for_status()?;
        Ok(())
    }

    async fn recommend_for_user(&self, nickname: &str) -> Result<Vec<RecommendationCategory>> {
        let _p = ProfileScope::with_context("recommend_for_user", &[("nickname", v_str(nickname))]);
        let req = self.recommend_request(nickname)?;
        let resp: RecommendResponse = self
            .client
            .execute(req)
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.recommended_categories.unwrap_or_default())
    }

    async fn generate_summary(&self, nickname: &str) -> Result<()> {
        let _p = ProfileScope::with_context("generate_summary", &[("nickname", v_str(nickname))]);
        let req = self.summary_request(nickname)?;
        self.client.execute(req).await?.error_for_status()?;
        Ok(())
    }
}
