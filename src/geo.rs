//! Best-effort position lookup: device fix first, IP geolocation second,
//! nothing at all last. Never fails toward the caller.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::logging::{log, obj, v_num, v_str, Domain, Level};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocateOptions {
    pub timeout: Duration,
    pub high_accuracy: bool,
    pub maximum_age: Duration,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            high_accuracy: true,
            maximum_age: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoError {
    #[error("geolocation unavailable")]
    Unavailable,
    #[error("geolocation permission denied")]
    Denied,
    #[error("geolocation timed out")]
    Timeout,
    #[error("position lookup failed: {0}")]
    Lookup(String),
}

/// The device's own positioning capability.
#[async_trait]
pub trait DeviceLocator: Send + Sync {
    async fn locate(&self, options: &LocateOptions) -> Result<Coordinates, GeoError>;
}

/// A host without positioning hardware.
pub struct NoDevice;

#[async_trait]
impl DeviceLocator for NoDevice {
    async fn locate(&self, _options: &LocateOptions) -> Result<Coordinates, GeoError> {
        Err(GeoError::Unavailable)
    }
}

/// A device that always reports the same fix.
pub struct FixedDevice(pub Coordinates);

#[async_trait]
impl DeviceLocator for FixedDevice {
    async fn locate(&self, _options: &LocateOptions) -> Result<Coordinates, GeoError> {
        Ok(self.0)
    }
}

#[async_trait]
pub trait IpLocator: Send + Sync {
    async fn lookup(&self) -> Result<Coordinates>;
}

#[derive(Deserialize, Debug)]
struct IpApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// IP geolocation over HTTP (`{"latitude":..,"longitude":..}` responses).
pub struct HttpIpLocator {
    client: Client,
    url: String,
}

impl HttpIpLocator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            url: url.into(),
        }
    }
}

#[async_trait]
impl IpLocator for HttpIpLocator {
    async fn lookup(&self) -> Result<Coordinates> {
        let resp = self.client.get(&self.url).send().await?;
        if !resp.status().is_success() {
            return Err(anyhow!("ip lookup returned {}", resp.status()));
        }
        let data: IpApiResponse = resp.json().await?;
        match (data.latitude, data.longitude) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates { latitude, longitude }),
            _ => Err(anyhow!("ip lookup response missing coordinates")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Device,
    Ip,
    Unresolved,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Device => "device",
            Source::Ip => "ip",
            Source::Unresolved => "unresolved",
        }
    }
}

pub struct GeoResolver {
    device: Arc<dyn DeviceLocator>,
    ip: Arc<dyn IpLocator>,
    options: LocateOptions,
}

impl GeoResolver {
    pub fn new(device: Arc<dyn DeviceLocator>, ip: Arc<dyn IpLocator>, options: LocateOptions) -> Self {
        Self { device, ip, options }
    }

    pub async fn resolve(&self) -> Option<Coordinates> {
        self.resolve_with_source().await.0
    }

    pub async fn resolve_with_source(&self) -> (Option<Coordinates>, Source) {
        log(
            Level::Debug,
            Domain::Geo,
            "device_request",
            obj(&[
                ("timeout_ms", json!(self.options.timeout.as_millis() as u64)),
                ("high_accuracy", json!(self.options.high_accuracy)),
                ("maximum_age_ms", json!(self.options.maximum_age.as_millis() as u64)),
            ]),
        );
        let device = match tokio::time::timeout(self.options.timeout, self.device.locate(&self.options)).await {
            Ok(result) => result,
            Err(_) => Err(GeoError::Timeout),
        };

        let (coords, source) = match device {
            Ok(coords) => (Some(coords), Source::Device),
            Err(err) => {
                log(
                    Level::Info,
                    Domain::Geo,
                    "device_fallback",
                    obj(&[("reason", v_str(&err.to_string()))]),
                );
                match self.ip.lookup().await {
                    Ok(coords) => (Some(coords), Source::Ip),
                    Err(err) => {
                        log(
                            Level::Warn,
                            Domain::Geo,
                            "ip_lookup_failed",
                            obj(&[("error", v_str(&err.to_string()))]),
                        );
                        (None, Source::Unresolved)
                    }
                }
            }
        };

        let mut fields = obj(&[("source", v_str(source.as_str()))]);
        if let Some(c) = coords {
            fields.insert("latitude".to_string(), v_num(c.latitude));
            fields.insert("longitude".to_string(), v_num(c.longitude));
        }
        log(Level::Debug, Domain::Geo, "resolved", fields);
        (coords, source)
    }
}
