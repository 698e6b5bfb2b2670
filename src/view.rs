//! Lifecycle of one results view: mount, reveal, confirm, teardown.
//!
//! All per-view state (position gate, has-run guard, published snapshots,
//! pending timers) lives on the `ResultsView` instance, so two views never
//! share flags. Tearing the view down cancels every timer it owns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Local;
use serde_json::json;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::Backend;
use crate::card::Card;
use crate::disclosure::{
    DisclosureState, Navigator, Outcome, ResultsContent, Sequencer, Stage, StatePublisher, Timing,
    TransitionController, TransitionTiming,
};
use crate::emotion::{chart_points, EmotionScorecard};
use crate::error::ViewError;
use crate::geo::{Coordinates, DeviceLocator, GeoResolver, IpLocator, LocateOptions};
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::recommend::{LocationGate, RecommendationFetcher};

/// Collaborators and tunables a view is built from.
#[derive(Clone)]
pub struct ViewDeps {
    pub backend: Arc<dyn Backend>,
    pub device: Arc<dyn DeviceLocator>,
    pub ip: Arc<dyn IpLocator>,
    pub navigator: Arc<dyn Navigator>,
    pub timing: Timing,
    pub transition: TransitionTiming,
    pub locate: LocateOptions,
}

struct Shared {
    nickname: String,
    scorecard: EmotionScorecard,
    publisher: StatePublisher,
    gate: LocationGate,
    resolver: GeoResolver,
    fetcher: RecommendationFetcher,
    sequencer: Sequencer,
    transition: TransitionController,
}

pub struct ResultsView {
    shared: Arc<Shared>,
    cancel: CancellationToken,
    mounted: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Local calendar date as shown on the prescription.
pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

impl Shared {
    async fn run_pipeline(&self, cancel: &CancellationToken) -> Result<Outcome, ViewError> {
        let coords = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(Outcome::Cancelled),
            coords = self.resolver.resolve() => coords,
        };

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(Outcome::Cancelled),
            fetched = self.fetcher.fetch_guarded(&self.gate, &self.nickname, coords) => fetched,
        };
        // The gate is owned by this view and entered once, so `None` means a
        // second position callback raced us and the first one owns the flow.
        let Some(categories) = fetched else {
            return Ok(Outcome::Cancelled);
        };

        let content = ResultsContent {
            date: today(),
            nickname: self.nickname.clone(),
            chart: chart_points(&self.scorecard),
            cards: categories.iter().map(Card::from_category).collect(),
        };
        self.sequencer.run(content, &self.publisher, cancel).await
    }
}

impl ResultsView {
    pub fn new(deps: ViewDeps, nickname: impl Into<String>, scorecard: EmotionScorecard) -> Self {
        let cancel = CancellationToken::new();
        let shared = Shared {
            nickname: nickname.into(),
            scorecard,
            publisher: StatePublisher::new(cancel.clone()),
            gate: LocationGate::new(),
            resolver: GeoResolver::new(deps.device, deps.ip, deps.locate),
            fetcher: RecommendationFetcher::new(Arc::clone(&deps.backend)),
            sequencer: Sequencer::new(deps.timing, deps.backend),
            transition: TransitionController::new(deps.transition, deps.navigator),
        };
        Self {
            shared: Arc::new(shared),
            cancel,
            mounted: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn nickname(&self) -> &str {
        &self.shared.nickname
    }

    pub fn subscribe(&self) -> watch::Receiver<DisclosureState> {
        self.shared.publisher.subscribe()
    }

    pub fn state(&self) -> DisclosureState {
        self.shared.publisher.current()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.shared.gate.coordinates()
    }

    pub fn is_torn_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Starts locate → recommend → reveal. Runs at most once per instance.
    pub fn mount(&self) -> Result<(), ViewError> {
        if self.cancel.is_cancelled() {
            return Err(ViewError::TornDown);
        }
        if self.mounted.swap(true, Ordering::SeqCst) {
            return Err(ViewError::AlreadyMounted);
        }
        log(
            Level::Info,
            Domain::View,
            "mounted",
            obj(&[
                ("nickname", v_str(&self.shared.nickname)),
                ("scores", json!(self.shared.scorecard)),
            ]),
        );

        let shared = Arc::clone(&self.shared);
        let cancel = self.cancel.clone();
        self.spawn(async move {
            match shared.run_pipeline(&cancel).await {
                Ok(outcome) => log(
                    Level::Debug,
                    Domain::View,
                    "reveal_finished",
                    obj(&[
                        ("nickname", v_str(&shared.nickname)),
                        ("outcome", v_str(&format!("{:?}", outcome))),
                    ]),
                ),
                Err(ViewError::TornDown) => {}
                Err(e) => log(
                    Level::Error,
                    Domain::Sequence,
                    "reveal_failed",
                    obj(&[
                        ("nickname", v_str(&shared.nickname)),
                        ("error", v_str(&e.to_string())),
                    ]),
                ),
            }
        });
        Ok(())
    }

    /// The user pressed the map button.
    pub fn confirm(&self) -> Result<(), ViewError> {
        if self.cancel.is_cancelled() {
            return Err(ViewError::TornDown);
        }
        self.shared.transition.begin(&self.shared.publisher)?;
        log(
            Level::Info,
            Domain::Transition,
            "confirmed",
            obj(&[
                ("nickname", v_str(&self.shared.nickname)),
                ("stage", v_str(Stage::Stamped.name())),
            ]),
        );

        let shared = Arc::clone(&self.shared);
        let cancel = self.cancel.clone();
        self.spawn(async move {
            let result = shared
                .transition
                .finish(&shared.nickname, &shared.publisher, &cancel)
                .await;
            if let Err(e) = result {
                if e != ViewError::TornDown {
                    log(
                        Level::Error,
                        Domain::Transition,
                        "transition_failed",
                        obj(&[("error", v_str(&e.to_string()))]),
                    );
                }
            }
        });
        Ok(())
    }

    /// Invalidates every pending timer. Idempotent.
    pub fn teardown(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
        log(
            Level::Info,
            Domain::View,
            "torn_down",
            obj(&[
                ("nickname", v_str(&self.shared.nickname)),
                ("stage", v_str(self.shared.publisher.stage().name())),
            ]),
        );
    }

    fn spawn<F>(&self, fut: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(fut);
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.retain(|t| !t.is_finished());
            tasks.push(handle);
        }
    }
}

impl Drop for ResultsView {
    fn drop(&mut self) {
        self.teardown();
    }
}
