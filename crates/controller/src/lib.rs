//! Client-side lifecycle of an asynchronous ingestion job.
//!
//! [`LoadingController`] checks for a stored identity, creates exactly one
//! ingestion job, polls its status at a fixed rate, and hands off to the chat
//! view once the job is ready. Collaborators (HTTP API, identity store,
//! navigation) are traits so the controller runs the same under the CLI and
//! under tests.

pub mod api;
pub mod controller;
pub mod http;
pub mod identity;
pub mod initiator;
pub mod navigation;
pub mod scheduler;
pub mod session;
pub mod tracker;
pub mod transition;

pub use api::JobApi;
pub use controller::{ControllerHandle, LoadingController, SessionOutcome};
pub use http::{ApiClient, ServerMessage, Submission};
pub use identity::{IdentitySource, StaticIdentity};
pub use initiator::{JobInitiator, StartAttempt, INITIATION_FAILED_MESSAGE};
pub use navigation::{ErrorPayload, Navigator, View};
pub use scheduler::{PollExit, PollScheduler};
pub use session::SessionLink;
pub use tracker::{ApplyOutcome, ControllerView, QuerySeq, StatusTracker, DEFAULT_FAILURE_MESSAGE};
pub use transition::TransitionDriver;
