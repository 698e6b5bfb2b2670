use std::time::Duration;

use crate::disclosure::{Timing, TransitionTiming};
use crate::emotion::EmotionScorecard;
use crate::error::ViewError;
use crate::geo::{Coordinates, LocateOptions};

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub ip_geo_url: String,
    pub nickname: String,
    pub geo_timeout_secs: u64,
    pub geo_high_accuracy: bool,
    pub geo_maximum_age_ms: u64,
    pub http_timeout_secs: u64,
    pub typing_speed_ms: u64,
    pub device_fix: Option<Coordinates>,
    pub emotions: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            ip_geo_url: "https://ipapi.co/json/".to_string(),
            nickname: "guest".to_string(),
            geo_timeout_secs: 15,
            geo_high_accuracy: true,
            geo_maximum_age_ms: 0,
            http_timeout_secs: 10,
            typing_speed_ms: 40,
            device_fix: None,
            emotions: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        let device_lat = std::env::var("DEVICE_LAT").ok().and_then(|v| v.parse().ok());
        let device_lng = std::env::var("DEVICE_LNG").ok().and_then(|v| v.parse().ok());
        Self {
            api_url: std::env::var("API_URL").unwrap_or(d.api_url),
            ip_geo_url: std::env::var("IP_GEO_URL").unwrap_or(d.ip_geo_url),
            nickname: std::env::var("NICKNAME").unwrap_or(d.nickname),
            geo_timeout_secs: std::env::var("GEO_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.geo_timeout_secs),
            geo_high_accuracy: std::env::var("GEO_HIGH_ACCURACY").ok().and_then(|v| v.parse().ok()).unwrap_or(d.geo_high_accuracy),
            geo_maximum_age_ms: std::env::var("GEO_MAXIMUM_AGE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.geo_maximum_age_ms),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.http_timeout_secs),
            typing_speed_ms: std::env::var("TYPING_SPEED_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.typing_speed_ms),
            device_fix: match (device_lat, device_lng) {
                (Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
                _ => None,
            },
            emotions: std::env::var("EMOTIONS").ok(),
        }
    }

    pub fn timing(&self) -> Timing {
        Timing {
            per_char: Duration::from_millis(self.typing_speed_ms),
            ..Timing::default()
        }
    }

    pub fn transition_timing(&self) -> TransitionTiming {
        TransitionTiming::default()
    }

    pub fn locate_options(&self) -> LocateOptions {
        LocateOptions {
            timeout: Duration::from_secs(self.geo_timeout_secs),
            high_accuracy: self.geo_high_accuracy,
            maximum_age: Duration::from_millis(self.geo_maximum_age_ms),
        }
    }

    /// Scores from `EMOTIONS`, or the neutral card when unset.
    pub fn scorecard(&self) -> Result<EmotionScorecard, ViewError> {
        match &self.emotions {
            Some(raw) => EmotionScorecard::parse_list(raw),
            None => Ok(EmotionScorecard::neutral()),
        }
    }
}
