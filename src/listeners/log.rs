//! # LogWriter: tracing-backed state printer
//!
//! A minimal listener that writes each transition of one server through `tracing`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO staticvisor::state: transition server=1 state=STARTING
//! INFO staticvisor::state: transition server=1 state=ACTIVE
//! WARN staticvisor::state: server crashed server=1
//! ```

use tracing::{info, warn};

use crate::listeners::StateListener;
use crate::state::{ServerId, State};

const STATE_TARGET: &str = "staticvisor::state";

/// State writer listener for one server.
#[derive(Debug, Clone, Copy)]
pub struct LogWriter {
    server: ServerId,
}

impl LogWriter {
    /// Construct a writer labelled with `server`.
    #[must_use]
    pub fn new(server: ServerId) -> Self {
        Self { server }
    }
}

impl StateListener for LogWriter {
    fn on_state(&self, state: State) {
        match state {
            State::Crashed => {
                warn!(target: STATE_TARGET, server = %self.server, "server crashed");
            }
            _ => {
                info!(target: STATE_TARGET, server = %self.server, state = %state, "transition");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
