//! Location submission and the recommendation request, guarded so one view
//! instance submits its position at most once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use serde_json::json;

use crate::api::{Backend, RecommendationCategory};
use crate::geo::Coordinates;
use crate::logging::{log, log_swallowed, obj, v_str, Domain, Level};

/// In-flight marker plus the once-only resolved position of a single view.
#[derive(Debug, Default)]
pub struct LocationGate {
    in_flight: AtomicBool,
    done: AtomicBool,
    coords: OnceLock<Coordinates>,
}

/// Held while a submission runs; dropping it clears the in-flight marker.
#[derive(Debug)]
pub struct GateTicket<'a> {
    gate: &'a LocationGate,
}

impl LocationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when a submission is running or has already completed.
    pub fn try_enter(&self) -> Option<GateTicket<'_>> {
        if self.done.load(Ordering::SeqCst) {
            return None;
        }
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        if self.done.load(Ordering::SeqCst) {
            self.in_flight.store(false, Ordering::SeqCst);
            return None;
        }
        Some(GateTicket { gate: self })
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coords.get().copied()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }
}

impl GateTicket<'_> {
    fn complete(self, coords: Option<Coordinates>) {
        if let Some(c) = coords {
            let _ = self.gate.coords.set(c);
        }
        self.gate.done.store(true, Ordering::SeqCst);
    }
}

impl Drop for GateTicket<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.store(false, Ordering::SeqCst);
    }
}

pub struct RecommendationFetcher {
    backend: Arc<dyn Backend>,
}

impl RecommendationFetcher {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Stores the position (best effort) and asks for recommendations.
    /// Any failure degrades to an empty list.
    pub async fn fetch(&self, nickname: &str, coords: Option<Coordinates>) -> Vec<RecommendationCategory> {
        if let Some(c) = coords {
            if let Err(e) = self.backend.submit_location(nickname, c).await {
                log_swallowed(Domain::Fetch, "submit_location", nickname, &e);
            }
        }

        match self.backend.recommend_for_user(nickname).await {
            Ok(categories) => {
                log(
                    Level::Info,
                    Domain::Fetch,
                    "recommendation",
                    obj(&[
                        ("nickname", v_str(nickname)),
                        ("categories", json!(categories.len())),
                    ]),
                );
                categories
            }
            Err(e) => {
                log_swallowed(Domain::Fetch, "recommend_for_user", nickname, &e);
                Vec::new()
            }
        }
    }

    /// `fetch` behind the gate. A call that finds the gate closed returns `None`
    /// without touching the network.
    pub async fn fetch_guarded(
        &self,
        gate: &LocationGate,
        nickname: &str,
        coords: Option<Coordinates>,
    ) -> Option<Vec<RecommendationCategory>> {
        let Some(ticket) = gate.try_enter() else {
            log(
                Level::Debug,
                Domain::Fetch,
                "duplicate_position_dropped",
                obj(&[("nickname", v_str(nickname))]),
            );
            return None;
        };
        let categories = self.fetch(nickname, coords).await;
        ticket.complete(coords);
        Some(categories)
    }
}
