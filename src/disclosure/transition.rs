use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::sequencer::Outcome;
use super::state::{Stage, StatePublisher};
use crate::error::ViewError;
use crate::logging::{log, obj, v_str, Domain, Level};

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Keeps every route it is asked to open.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        log(Level::Info, Domain::Transition, "navigate", obj(&[("route", v_str(route))]));
        if let Ok(mut routes) = self.routes.lock() {
            routes.push(route.to_string());
        }
    }
}

/// Route of the map view for `nickname`.
pub fn map_route(nickname: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("nickname", nickname)
        .finish();
    format!("/map?{}", query)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTiming {
    pub stamp_hold: Duration,
    pub exit_animation: Duration,
}

impl Default for TransitionTiming {
    fn default() -> Self {
        Self {
            stamp_hold: Duration::from_millis(1200),
            exit_animation: Duration::from_millis(1500),
        }
    }
}

/// Stamp, shrink-and-fade, then leave for the map. Once begun there is no
/// way back; only view teardown stops the remaining timers.
pub struct TransitionController {
    timing: TransitionTiming,
    navigator: Arc<dyn Navigator>,
}

impl TransitionController {
    pub fn new(timing: TransitionTiming, navigator: Arc<dyn Navigator>) -> Self {
        Self { timing, navigator }
    }

    /// Hides the button and shows the stamp. Rejected unless the button is up,
    /// which also makes a second confirmation a no-op error.
    pub fn begin(&self, publisher: &StatePublisher) -> Result<(), ViewError> {
        publisher.apply(|s| {
            if s.stage != Stage::ButtonVisible {
                return Err(ViewError::NotReady { stage: s.stage });
            }
            s.advance(Stage::Stamped)
        })
    }

    pub async fn finish(
        &self,
        nickname: &str,
        publisher: &StatePublisher,
        cancel: &CancellationToken,
    ) -> Result<Outcome, ViewError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(Outcome::Cancelled),
            _ = sleep(self.timing.stamp_hold) => {}
        }
        publisher.advance(Stage::Exiting)?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(Outcome::Cancelled),
            _ = sleep(self.timing.exit_animation) => {}
        }
        let route = map_route(nickname);
        publisher.apply(|s| {
            s.advance(Stage::Navigated)?;
            s.navigated_to = Some(route.clone());
            Ok(())
        })?;
        self.navigator.navigate(&route);
        Ok(Outcome::Completed)
    }
}
