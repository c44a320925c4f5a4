//! Per-call memory observation.
//!
//! A [`CallObserver`] brackets one intercepted call at a time:
//!
//! ```text
//! Idle --begin--> Recording --exit/abort--> Idle
//! ```
//!
//! While recording, `read` and `write` collect the touched ranges. At exit
//! every merged range is hashed; unseen content is written once as a
//! [`Resource`], and an observation referring to it is written every time.
//! When the call opened a command group with `enter`, those records are
//! children of the group and the group is closed afterwards.
//!
//! An observer over a disabled encoder, or one whose sink has failed,
//! records nothing at all.

use crate::config::ObserverConfig;
use crate::intervals::IntervalSet;
use crate::memory::MemorySource;
use crate::records::{MemoryObservation, Resource};
use crate::seen::SeenResources;
use std::sync::Arc;
use tracespy_core::{Encodable, Error, ResourceId};
use tracespy_wire::Encoder;
use tracing::{trace, warn};

/// Recording state of an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallState {
    Idle,
    Recording { api: u8 },
}

/// Tracks memory touched by the intercepted call in flight.
pub struct CallObserver {
    encoder: Arc<dyn Encoder>,
    seen: Arc<SeenResources>,
    memory: Arc<dyn MemorySource>,
    pending: IntervalSet,
    /// Group opened by `enter` for the current call
    command: Option<Box<dyn Encoder>>,
    state: CallState,
}

impl CallObserver {
    /// Create an idle observer writing through `encoder`.
    pub fn new(
        encoder: Arc<dyn Encoder>,
        seen: Arc<SeenResources>,
        memory: Arc<dyn MemorySource>,
        config: &ObserverConfig,
    ) -> Self {
        CallObserver {
            encoder,
            seen,
            memory,
            pending: IntervalSet::with_threshold(config.merge_threshold),
            command: None,
            state: CallState::Idle,
        }
    }

    /// Start recording a call to API `api`.
    ///
    /// A call still in flight is resolved first.
    pub fn begin(&mut self, api: u8) {
        if let CallState::Recording { api: previous } = self.state {
            warn!(previous, api, "Call began before the previous one exited");
            self.exit();
        }
        self.state = CallState::Recording { api };
    }

    /// Open a group for the intercepted command. Records resolved for this
    /// call become its children.
    pub fn enter(&mut self, command: &dyn Encodable) {
        if !self.is_recording() || !self.is_enabled() {
            return;
        }
        // Close a group left over from an earlier `enter` in the same call.
        self.command = None;
        self.command = Some(self.encoder.message_group(command));
    }

    /// Record a range the call read.
    pub fn read(&mut self, base: u64, size: u64) {
        self.observe(base, size);
    }

    /// Record a range the call wrote.
    pub fn write(&mut self, base: u64, size: u64) {
        self.observe(base, size);
    }

    fn observe(&mut self, base: u64, size: u64) {
        if self.is_recording() && self.is_enabled() {
            self.pending.insert_range(base, size);
        }
    }

    /// Encoder the current call's records go to.
    pub fn encoder(&self) -> &dyn Encoder {
        match &self.command {
            Some(group) => group.as_ref(),
            None => self.encoder.as_ref(),
        }
    }

    /// Emit resources and observations for every pending range, then clear
    /// the pending set. Returns the number of observations written.
    ///
    /// Memory is neither copied nor hashed once the encoder is disabled; a
    /// sink failing partway through drops the remaining ranges.
    pub fn resolve_pending(&mut self) -> usize {
        let ranges = self.pending.take();
        if ranges.is_empty() {
            return 0;
        }

        let pool = self.memory.pool();
        let target = self.encoder();

        let mut new_resources = 0;
        let mut written = 0;
        for range in &ranges {
            if !target.is_enabled() {
                break;
            }
            let data = self.memory.read(*range);
            let id = ResourceId::for_content(&data);
            let emitted = self.seen.insert_with(id, || {
                target.message(&Resource { id, data });
            });
            if emitted {
                new_resources += 1;
            }
            target.message(&MemoryObservation::new(*range, pool, id));
            if target.is_enabled() {
                written += 1;
            }
        }

        trace!(
            observations = written,
            dropped = ranges.len() - written,
            resources = new_resources,
            %pool,
            "Resolved pending observations"
        );
        written
    }

    /// Finish the call: resolve pending ranges and close the command group.
    pub fn exit(&mut self) -> usize {
        if !self.is_recording() {
            return 0;
        }
        let resolved = self.resolve_pending();
        self.command = None;
        self.state = CallState::Idle;
        resolved
    }

    /// Abandon the call. Pending ranges are discarded and the command group
    /// is closed; the returned signal is for the call boundary to unwind on.
    pub fn abort(&mut self, reason: impl Into<String>) -> Error {
        let api = match self.state {
            CallState::Recording { api } => api,
            CallState::Idle => 0,
        };
        self.pending.clear();
        self.command = None;
        self.state = CallState::Idle;
        Error::aborted(api, reason)
    }

    /// True between `begin` and `exit`.
    pub fn is_recording(&self) -> bool {
        matches!(self.state, CallState::Recording { .. })
    }

    /// False when records go nowhere.
    pub fn is_enabled(&self) -> bool {
        self.encoder.is_enabled()
    }

    /// API of the call in flight.
    pub fn api(&self) -> Option<u8> {
        match self.state {
            CallState::Recording { api } => Some(api),
            CallState::Idle => None,
        }
    }

    /// Ranges collected so far for the call in flight.
    pub fn pending(&self) -> &IntervalSet {
        &self.pending
    }
}

impl Drop for CallObserver {
    fn drop(&mut self) {
        self.exit();
    }
}
