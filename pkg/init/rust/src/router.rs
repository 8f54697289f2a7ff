// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use log::debug;
use nix::sys::signal::Signal;
use tokio::signal::unix::{SignalKind, signal};
use tokio_stream::StreamMap;
use tokio_stream::wrappers::SignalStream;

use crate::children::ChildEnumerator;
use crate::error::{Error, Result};
use crate::termination::{SignalSink, TerminationController};

/// Signal that restarts the termination sequence from its first step.
pub const RESTART_SIGNAL: Signal = Signal::SIGTERM;

/// Caught even when not forwarded, so that they are ignored instead of
/// killing the supervisor.
pub const ALWAYS_CAUGHT: [Signal; 6] = [
    Signal::SIGHUP,
    Signal::SIGINT,
    Signal::SIGQUIT,
    Signal::SIGUSR1,
    Signal::SIGUSR2,
    Signal::SIGALRM,
];

/// Something the supervisor must react to, outside of child state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The current termination step timed out.
    EscalationTick,
    Signal(Signal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    EscalationTick,
    RestartEscalation,
    Forward(Signal),
    Ignore,
}

/// Runtime signal listeners, keyed by the signal they receive.
pub type SignalStreams = StreamMap<Signal, SignalStream>;

pub struct SignalRouter {
    forward: Vec<Signal>,
}

impl SignalRouter {
    pub fn new(forward: Vec<Signal>) -> Self {
        Self { forward }
    }

    /// Every signal the router wants delivered.
    pub fn handled_signals(&self) -> Vec<Signal> {
        let mut signals = vec![RESTART_SIGNAL];
        for &sig in self.forward.iter().chain(&ALWAYS_CAUGHT) {
            if !signals.contains(&sig) {
                signals.push(sig);
            }
        }
        signals
    }

    /// Install a runtime listener for every handled signal. Must be called
    /// from within the runtime.
    pub fn listen(&self) -> Result<SignalStreams> {
        let mut streams = StreamMap::new();
        for sig in self.handled_signals() {
            streams.insert(sig, SignalStream::new(listen(sig)?));
        }
        Ok(streams)
    }

    pub fn route(&self, event: Event) -> Route {
        match event {
            Event::EscalationTick => Route::EscalationTick,
            Event::Signal(RESTART_SIGNAL) => Route::RestartEscalation,
            Event::Signal(sig) if self.forward.contains(&sig) => Route::Forward(sig),
            Event::Signal(_) => Route::Ignore,
        }
    }

    pub fn dispatch<E, S>(
        &self,
        event: Event,
        controller: &mut TerminationController<E, S>,
    ) -> Result<()>
    where
        E: ChildEnumerator,
        S: SignalSink,
    {
        let route = self.route(event);
        debug!("{event:?} routed to {route:?}");
        match route {
            Route::EscalationTick => controller.on_escalation_tick(),
            Route::RestartEscalation => controller.reset_and_restart(),
            Route::Forward(sig) => controller.broadcast(sig).map(drop),
            Route::Ignore => Ok(()),
        }
    }
}

/// Listen for `sig` on the current runtime.
pub fn listen(sig: Signal) -> Result<tokio::signal::unix::Signal> {
    signal(SignalKind::from_raw(sig as i32))
        .map_err(|source| Error::SignalRegistration { signal: sig, source })
}
