// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use log::{debug, error};
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use tokio_stream::StreamExt;

use crate::children::ChildEnumerator;
use crate::error::Result;
use crate::router::{self, Event, SignalRouter, SignalStreams};
use crate::state::{AggregateStatus, ChildExit, FAILURE_CODE};
use crate::termination::{SignalSink, TerminationController};

enum Wake {
    ChildStateChanged,
    Event(Event),
}

#[derive(Debug, PartialEq, Eq)]
enum Reaped {
    ChildrenLeft,
    AllGone,
}

/// Source of child state changes.
pub trait ChildWaiter {
    /// Next pending state change of any child, `StillAlive` when none is
    /// ready. Must not block.
    fn wait_any(&mut self) -> nix::Result<WaitStatus>;
}

/// `waitpid(-1, WNOHANG)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WaitPid;

impl ChildWaiter for WaitPid {
    fn wait_any(&mut self) -> nix::Result<WaitStatus> {
        waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG))
    }
}

/// Collects exited children into the aggregate status.
struct Reaper<W> {
    waiter: W,
    status: AggregateStatus,
}

impl<W: ChildWaiter> Reaper<W> {
    fn new(waiter: W) -> Self {
        Self {
            waiter,
            status: AggregateStatus::default(),
        }
    }

    /// Collect every child that changed state since the last call.
    fn drain<E, S>(&mut self, controller: &mut TerminationController<E, S>) -> Result<Reaped>
    where
        E: ChildEnumerator,
        S: SignalSink,
    {
        loop {
            match self.waiter.wait_any() {
                Ok(WaitStatus::StillAlive) => return Ok(Reaped::ChildrenLeft),
                Ok(status) => {
                    let Some(exit) = ChildExit::from_wait_status(status) else {
                        continue;
                    };
                    debug!("{exit}");
                    self.status.record(exit);
                    controller.on_descendant_exited()?;
                }
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => return Ok(Reaped::AllGone),
                Err(e) => {
                    error!("wait failed: {e}");
                    self.status.fail_with(FAILURE_CODE);
                    controller.on_descendant_exited()?;
                    return Ok(Reaped::ChildrenLeft);
                }
            }
        }
    }
}

/// Reaps every child and drives termination until none is left.
pub struct Supervisor<E, S, W = WaitPid> {
    controller: TerminationController<E, S>,
    router: SignalRouter,
    signals: SignalStreams,
    sigchld: tokio::signal::unix::Signal,
    reaper: Reaper<W>,
}

impl<E: ChildEnumerator, S: SignalSink, W: ChildWaiter> Supervisor<E, S, W> {
    /// Installs the signal listeners, so it must run inside the runtime and
    /// before any child is spawned.
    pub fn new(
        controller: TerminationController<E, S>,
        router: SignalRouter,
        waiter: W,
    ) -> Result<Self> {
        let sigchld = router::listen(Signal::SIGCHLD)?;
        let signals = router.listen()?;
        Ok(Self {
            controller,
            router,
            signals,
            sigchld,
            reaper: Reaper::new(waiter),
        })
    }

    /// Run until no child is left and return the aggregate exit status.
    ///
    /// Fails when termination runs out of steps or the children can no
    /// longer be enumerated.
    pub async fn run(mut self) -> Result<u8> {
        loop {
            let wake = tokio::select! {
                // Reap first: an expiring step must not count children that
                // already exited.
                biased;
                _ = self.sigchld.recv() => Wake::ChildStateChanged,
                _ = self.controller.tick() => Wake::Event(Event::EscalationTick),
                Some((sig, ())) = self.signals.next() => Wake::Event(Event::Signal(sig)),
            };

            match wake {
                Wake::ChildStateChanged => {
                    if self.reaper.drain(&mut self.controller)? == Reaped::AllGone {
                        debug!("no child left, exiting");
                        return Ok(self.reaper.status.code());
                    }
                }
                Wake::Event(event) => self.router.dispatch(event, &mut self.controller)?,
            }
        }
    }
}
