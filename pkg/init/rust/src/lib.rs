// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Minimal init for containers: spawns commands, reaps every descendant, and
//! once any child exits, stops the others with an escalating signal
//! sequence.

pub mod children;
pub mod config;
pub mod error;
pub mod mask;
pub mod router;
pub mod spawn;
pub mod state;
pub mod supervisor;
pub mod termination;
pub mod timer;

use log::debug;
use nix::sys::prctl;
use nix::unistd::{Pid, getpid, setsid};

pub use children::{ChildEnumerator, ProcChildren};
pub use config::Config;
pub use error::{Error, Result};
pub use router::SignalRouter;
pub use supervisor::{ChildWaiter, Supervisor, WaitPid};
pub use termination::{Kill, SignalSink, TerminationController};

/// Set up the process, spawn every command and supervise them to the end.
/// Returns the exit status to report.
pub fn run(config: Config) -> Result<u8> {
    let blocked = mask::BlockedSignals::block_all().map_err(Error::SignalMask)?;

    if getpid() != Pid::from_raw(1) {
        debug!("registering as child subreaper");
        prctl::set_child_subreaper(true).map_err(Error::Subreaper)?;
    }
    // Fails for a process group leader, which keeps its session.
    if let Err(e) = setsid() {
        debug!("setsid: {e}");
    }

    let children = ProcChildren::for_current_process()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(Error::Runtime)?;

    runtime.block_on(async move {
        let controller = TerminationController::new(
            config.kill_steps,
            config.step_timeout,
            config.group_broadcast,
            children,
            Kill,
        );
        let supervisor = Supervisor::new(
            controller,
            SignalRouter::new(config.forward_signals),
            WaitPid,
        )?;
        spawn::spawn_all(&config.commands)?;
        drop(blocked);
        supervisor.run().await
    })
}
