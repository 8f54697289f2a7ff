// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use log::{debug, info, warn};
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::time::Duration;

use crate::children::ChildEnumerator;
use crate::error::{Error, Result};
use crate::timer::EscalationTimer;

/// Delivery of a signal to one process or process group.
pub trait SignalSink {
    fn send(&self, target: Target, sig: Signal) -> nix::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Process(Pid),
    Group(Pid),
}

/// `kill(2)` / `killpg(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Kill;

impl SignalSink for Kill {
    fn send(&self, target: Target, sig: Signal) -> nix::Result<()> {
        match target {
            Target::Process(pid) => signal::kill(pid, sig),
            Target::Group(pgid) => signal::killpg(pgid, sig),
        }
    }
}

/// Escalating termination of every current child.
///
/// `stage` indexes the next step to run. Each step broadcasts its signal and
/// arms the timer; the timer expiring runs the following step. Running a
/// step past the last one means children survived the whole sequence.
pub struct TerminationController<E, S> {
    steps: Vec<Signal>,
    step_timeout: Duration,
    group_broadcast: bool,
    stage: usize,
    timer: EscalationTimer,
    children: E,
    sink: S,
}

impl<E: ChildEnumerator, S: SignalSink> TerminationController<E, S> {
    pub fn new(
        steps: Vec<Signal>,
        step_timeout: Duration,
        group_broadcast: bool,
        children: E,
        sink: S,
    ) -> Self {
        Self {
            steps,
            step_timeout,
            group_broadcast,
            stage: 0,
            timer: EscalationTimer::new(),
            children,
            sink,
        }
    }

    pub fn stage(&self) -> usize {
        self.stage
    }

    pub fn is_escalating(&self) -> bool {
        self.stage > 0
    }

    /// Run the next termination step.
    pub fn advance(&mut self) -> Result<()> {
        let Some(&sig) = self.steps.get(self.stage) else {
            return Err(Error::ChildrenNotTerminated);
        };
        info!(
            "termination step {}/{}: {sig}",
            self.stage + 1,
            self.steps.len()
        );
        self.broadcast(sig)?;
        self.timer.arm(self.step_timeout);
        self.stage += 1;
        Ok(())
    }

    /// Start the sequence over from the first step.
    pub fn reset_and_restart(&mut self) -> Result<()> {
        self.timer.cancel();
        self.stage = 0;
        self.advance()
    }

    pub fn on_escalation_tick(&mut self) -> Result<()> {
        self.advance()
    }

    /// Begin termination unless it is already under way.
    pub fn on_descendant_exited(&mut self) -> Result<()> {
        if self.is_escalating() {
            return Ok(());
        }
        self.advance()
    }

    /// Resolves when the current step's timeout elapses.
    pub async fn tick(&mut self) {
        self.timer.expired().await
    }

    /// Send `sig` to every current child. Returns how many were signalled.
    pub fn broadcast(&self, sig: Signal) -> Result<usize> {
        let pids = self.children.children()?;
        info!("sending {sig} to {} process(es)", pids.len());
        let mut delivered = 0;
        for pid in pids {
            if self.deliver(Target::Process(pid), sig) {
                delivered += 1;
            }
            if self.group_broadcast {
                self.deliver(Target::Group(pid), sig);
            }
        }
        Ok(delivered)
    }

    fn deliver(&self, target: Target, sig: Signal) -> bool {
        match self.sink.send(target, sig) {
            Ok(()) => {
                debug!("sent {sig} to {target:?}");
                true
            }
            // Already gone, or a group that was never formed.
            Err(Errno::ESRCH) => {
                debug!("{target:?} not found for {sig}");
                false
            }
            Err(e) => {
                warn!("failed to send {sig} to {target:?}: {e}");
                false
            }
        }
    }
}
