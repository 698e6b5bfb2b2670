//! In-memory collaborators for view tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use growthdoctor::api::{Backend, RecommendationCategory};
use growthdoctor::disclosure::{RecordingNavigator, Timing, TransitionTiming};
use growthdoctor::emotion::{EmotionKey, EmotionScorecard};
use growthdoctor::geo::{Coordinates, DeviceLocator, GeoError, IpLocator, LocateOptions};
use growthdoctor::view::ViewDeps;

pub const DEVICE_FIX: Coordinates = Coordinates {
    latitude: 37.5443,
    longitude: 127.0374,
};
pub const IP_FIX: Coordinates = Coordinates {
    latitude: 37.5665,
    longitude: 126.978,
};

#[derive(Default)]
pub struct MockBackend {
    pub categories: Vec<RecommendationCategory>,
    pub fail_location: bool,
    pub fail_recommend: bool,
    pub fail_summary: bool,
    pub latency: Duration,
    pub emotions: Mutex<Vec<String>>,
    pub locations: Mutex<Vec<(String, Coordinates)>>,
    pub recommend_calls: AtomicUsize,
    pub summary_calls: AtomicUsize,
}

impl MockBackend {
    pub fn with_categories(n: usize) -> Self {
        Self {
            categories: categories(n),
            ..Self::default()
        }
    }

    pub fn locations(&self) -> Vec<(String, Coordinates)> {
        self.locations.lock().unwrap().clone()
    }

    pub fn recommend_calls(&self) -> usize {
        self.recommend_calls.load(Ordering::SeqCst)
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn submit_emotions(&self, nickname: &str, _card: &EmotionScorecard) -> Result<()> {
        tokio::time::sleep(self.latency).await;
        self.emotions.lock().unwrap().push(nickname.to_string());
        Ok(())
    }

    async fn submit_location(&self, nickname: &str, coords: Coordinates) -> Result<()> {
        tokio::time::sleep(self.latency).await;
        self.locations.lock().unwrap().push((nickname.to_string(), coords));
        if self.fail_location {
            return Err(anyhow!("location store down"));
        }
        Ok(())
    }

    async fn recommend_for_user(&self, _nickname: &str) -> Result<Vec<RecommendationCategory>> {
        tokio::time::sleep(self.latency).await;
        self.recommend_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_recommend {
            return Err(anyhow!("500 Internal Server Error"));
        }
        Ok(self.categories.clone())
    }

    async fn generate_summary(&self, _nickname: &str) -> Result<()> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_summary {
            return Err(anyhow!("summary chain failed"));
        }
        Ok(())
    }
}

pub enum DeviceMode {
    Fix(Coordinates),
    Denied,
    Hang,
}

pub struct MockDevice(pub DeviceMode);

#[async_trait]
impl DeviceLocator for MockDevice {
    async fn locate(&self, _options: &LocateOptions) -> Result<Coordinates, GeoError> {
        match self.0 {
            DeviceMode::Fix(c) => Ok(c),
            DeviceMode::Denied => Err(GeoError::Denied),
            DeviceMode::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(GeoError::Timeout)
            }
        }
    }
}

pub struct MockIp(pub Option<Coordinates>);

#[async_trait]
impl IpLocator for MockIp {
    async fn lookup(&self) -> Result<Coordinates> {
        self.0.ok_or_else(|| anyhow!("ipapi unreachable"))
    }
}

pub fn categories(n: usize) -> Vec<RecommendationCategory> {
    (0..n)
        .map(|i| RecommendationCategory {
            category: format!("녹지 유형 {}", i + 1),
            content: vec!["가벼운 운동으로 활력 충전".to_string(), "기분 전환".to_string()],
        })
        .collect()
}

pub fn scorecard() -> EmotionScorecard {
    EmotionScorecard::new([
        (EmotionKey::Depression, 3),
        (EmotionKey::Anxiety, 2),
        (EmotionKey::Stress, 4),
        (EmotionKey::Happiness, 3),
        (EmotionKey::Energy, 2),
        (EmotionKey::Achievement, 3),
    ])
    .unwrap()
}

pub fn deps(
    backend: Arc<MockBackend>,
    device: DeviceMode,
    ip: Option<Coordinates>,
    navigator: Arc<RecordingNavigator>,
) -> ViewDeps {
    ViewDeps {
        backend,
        device: Arc::new(MockDevice(device)),
        ip: Arc::new(MockIp(ip)),
        navigator,
        timing: Timing::default(),
        transition: TransitionTiming::default(),
        locate: LocateOptions::default(),
    }
}
