//! Remote call subsystem.
//!
//! # Data Flow
//! ```text
//! FlakyEndpoint::invoke
//!     → decision.rs (pick simulate_error for this attempt)
//!     → call.rs (GET <base>/sleep/{simulate_error})
//!     → CallError classified for the resilience core
//! ```
//!
//! # Design Decisions
//! - The transport and the success/failure decision are both traits so tests
//!   can run the core without a network or randomness

pub mod call;
pub mod decision;

use std::sync::Arc;

pub use call::{HttpRemoteCall, RemoteCall, RemoteSetupError};
pub use decision::{DecisionSource, FixedDecision, RandomDecision, ScriptedDecision};

use crate::resilience::CallError;

/// One attempt at the flaky dependency: a fresh decision, then the call.
#[derive(Clone)]
pub struct FlakyEndpoint {
    remote: Arc<dyn RemoteCall>,
    decisions: Arc<dyn DecisionSource>,
}

impl FlakyEndpoint {
    pub fn new(remote: Arc<dyn RemoteCall>, decisions: Arc<dyn DecisionSource>) -> Self {
        Self { remote, decisions }
    }

    pub async fn invoke(&self) -> Result<String, CallError> {
        let simulate_error = self.decisions.simulate_error();
        tracing::debug!(simulate_error, "Calling flaky endpoint");
        self.remote.sleep(simulate_error).await
    }
}

impl std::fmt::Debug for FlakyEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlakyEndpoint").finish_non_exhaustive()
    }
}
