#![forbid(unsafe_code)]

//! Panic isolation around listener invocations.
//!
//! # Invariants
//!
//! 1. A panicking listener never unwinds into the mutator that triggered
//!    the dispatch.
//! 2. Remaining listeners of the same dispatch still run.
//! 3. Each faulting invocation reaches the fault sink exactly once.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Listener panics | Bug in listener | Caught, reported, dispatch continues |
//! | Sink panics | Bug in sink | Caught and logged, never re-reported |
//! | `panic = "abort"` | Build profile | Process aborts; isolation needs unwinding |

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::error;

use crate::config::DispatchConfig;
use crate::listener::ListenerChannel;

/// Callback receiving listener faults.
pub type FaultSink = Rc<dyn Fn(&ListenerFault)>;

/// A panic captured while running a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFault {
    channel: ListenerChannel,
    message: String,
}

impl ListenerFault {
    /// Channel whose listener panicked.
    #[must_use]
    pub fn channel(&self) -> ListenerChannel {
        self.channel
    }

    /// The panic payload rendered as text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ListenerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} listener panicked: {}", self.channel, self.message)
    }
}

/// Guards individual listener calls.
#[derive(Clone, Default)]
pub struct ExceptionBoundary {
    sink: Option<FaultSink>,
    log_faults: bool,
}

impl fmt::Debug for ExceptionBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionBoundary")
            .field("sink", &self.sink.is_some())
            .field("log_faults", &self.log_faults)
            .finish()
    }
}

impl ExceptionBoundary {
    /// Build a boundary from dispatch configuration.
    #[must_use]
    pub fn new(config: &DispatchConfig) -> Self {
        Self {
            sink: config.fault_sink.clone(),
            log_faults: config.log_faults,
        }
    }

    /// Run `call`, isolating any panic it raises.
    ///
    /// Returns `true` when the listener completed normally.
    pub fn invoke(&self, channel: ListenerChannel, call: impl FnOnce()) -> bool {
        match panic::catch_unwind(AssertUnwindSafe(call)) {
            Ok(()) => true,
            Err(payload) => {
                let fault = ListenerFault {
                    channel,
                    message: panic_message(payload.as_ref()),
                };
                self.report(&fault);
                false
            }
        }
    }

    fn report(&self, fault: &ListenerFault) {
        match &self.sink {
            Some(sink) => {
                if self.log_faults {
                    error!(channel = %fault.channel, message = %fault.message, "listener fault");
                }
                let delivered = panic::catch_unwind(AssertUnwindSafe(|| sink(fault)));
                if delivered.is_err() {
                    error!(channel = %fault.channel, "fault sink panicked while reporting listener fault");
                }
            }
            None => {
                error!(channel = %fault.channel, message = %fault.message, "listener fault");
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
