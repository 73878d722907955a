#![forbid(unsafe_code)]

//! Dispatch configuration shared by collections and properties.
//!
//! A [`DispatchConfig`] is passed in at construction time; there is no
//! process-wide state. Handles created with `new()` use
//! [`DispatchConfig::default`].

use std::fmt;
use std::rc::Rc;

use crate::fault::{FaultSink, ListenerFault};

/// Configuration for listener dispatch.
#[derive(Clone, Default)]
pub struct DispatchConfig {
    /// Receives every listener fault. When `None`, faults are logged.
    pub fault_sink: Option<FaultSink>,
    /// Emit a `trace!` event for every dispatch.
    pub trace_dispatch: bool,
    /// Also log faults that were delivered to an installed sink.
    pub log_faults: bool,
}

impl fmt::Debug for DispatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchConfig")
            .field("fault_sink", &self.fault_sink.is_some())
            .field("trace_dispatch", &self.trace_dispatch)
            .field("log_faults", &self.log_faults)
            .finish()
    }
}

impl DispatchConfig {
    /// Default configuration: no sink (faults are logged), no dispatch tracing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route listener faults to `sink`.
    #[must_use]
    pub fn with_fault_sink(mut self, sink: impl Fn(&ListenerFault) + 'static) -> Self {
        self.fault_sink = Some(Rc::new(sink));
        self
    }

    /// Route listener faults to an already shared sink.
    #[must_use]
    pub fn with_shared_fault_sink(mut self, sink: FaultSink) -> Self {
        self.fault_sink = Some(sink);
        self
    }

    /// Enable or disable per-dispatch tracing.
    #[must_use]
    pub fn with_trace_dispatch(mut self, enabled: bool) -> Self {
        self.trace_dispatch = enabled;
        self
    }

    /// Log faults even when a sink is installed.
    #[must_use]
    pub fn with_log_faults(mut self, enabled: bool) -> Self {
        self.log_faults = enabled;
        self
    }
}
