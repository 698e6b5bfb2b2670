//! The results view's reveal choreography and its exit transition.

pub mod sequencer;
pub mod state;
pub mod timing;
pub mod transition;

pub use sequencer::{Outcome, Sequencer};
pub use state::{DisclosureState, ResultsContent, Stage, StatePublisher};
pub use timing::{plan, typing_delay, Step, Timing, USERNAME_LABEL};
pub use transition::{map_route, Navigator, RecordingNavigator, TransitionController, TransitionTiming};
