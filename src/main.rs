use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde_json::json;

use growthdoctor::api::{Backend, HttpBackend};
use growthdoctor::config::Config;
use growthdoctor::disclosure::{RecordingNavigator, Stage};
use growthdoctor::emotion::EmotionCheck;
use growthdoctor::geo::{DeviceLocator, FixedDevice, HttpIpLocator, NoDevice};
use growthdoctor::logging::{log, obj, v_str, Domain, Level};
use growthdoctor::view::{ResultsView, ViewDeps};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("nickname", v_str(&cfg.nickname)),
            ("api_url", v_str(&cfg.api_url)),
            ("device_fix", json!(cfg.device_fix)),
        ]),
    );

    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(&cfg)?);
    let scorecard = cfg.scorecard()?;

    // The check screen has to succeed before the results view opens.
    EmotionCheck::new(Arc::clone(&backend))
        .submit(&cfg.nickname, &scorecard)
        .await?;

    let device: Arc<dyn DeviceLocator> = match cfg.device_fix {
        Some(fix) => Arc::new(FixedDevice(fix)),
        None => Arc::new(NoDevice),
    };
    let deps = ViewDeps {
        backend,
        device,
        ip: Arc::new(HttpIpLocator::new(
            cfg.ip_geo_url.clone(),
            Duration::from_secs(cfg.http_timeout_secs),
        )),
        navigator: Arc::new(RecordingNavigator::new()),
        timing: cfg.timing(),
        transition: cfg.transition_timing(),
        locate: cfg.locate_options(),
    };

    let view = ResultsView::new(deps, cfg.nickname.clone(), scorecard);
    let mut rx = view.subscribe();
    view.mount()?;

    loop {
        rx.changed()
            .await
            .map_err(|_| anyhow!("results view closed before navigation"))?;
        let state = rx.borrow_and_update().clone();
        log(
            Level::Info,
            Domain::View,
            "state",
            obj(&[
                ("nickname", v_str(&cfg.nickname)),
                ("stage", v_str(&state.stage.to_string())),
                ("visible_cards", json!(state.visible_cards)),
                ("button_shown", json!(state.button_shown)),
            ]),
        );
        match state.stage {
            Stage::ButtonVisible => view.confirm()?,
            Stage::Navigated => break,
            _ => {}
        }
    }

    view.teardown();
    Ok(())
}
