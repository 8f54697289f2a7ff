// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::ffi::{CString, OsString};
use std::io;
use std::os::unix::ffi::OsStrExt;

use log::info;
use nix::sys::signal::{self, SigHandler, SigSet, SigmaskHow, Signal, sigprocmask};
use nix::unistd::{ForkResult, Pid, execvp, fork, setpgid, write};

use crate::error::{Error, Result};

/// Exit code of a child whose program could not be executed.
pub const EXEC_FAILED_CODE: i32 = 127;

/// Fork and exec `argv` in a new process group led by the child.
///
/// The child starts with default signal dispositions and an empty signal
/// mask whatever the supervisor has installed or blocked. If the exec fails
/// the child reports it on its own stderr and exits with
/// [`EXEC_FAILED_CODE`]; the supervisor only sees an ordinary exit.
pub fn spawn(argv: &[OsString]) -> Result<Pid> {
    let command = argv
        .iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ");
    let spawn_error = |reason: String| Error::Spawn {
        command: command.clone(),
        reason,
    };

    let args = argv
        .iter()
        .map(|a| CString::new(a.as_bytes()))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| spawn_error(e.to_string()))?;
    let Some(program) = args.first() else {
        return Err(spawn_error("empty command".to_string()));
    };
    // Formatted ahead of the fork so the child only writes.
    let exec_failed = format!("execvp {} failed: ", argv[0].to_string_lossy());

    // SAFETY: the supervisor is single-threaded when it spawns, so the child
    // may use any function until it execs or exits.
    match unsafe { fork() }.map_err(|e| spawn_error(format!("fork failed: {e}")))? {
        ForkResult::Parent { child } => {
            info!("spawned (pid={child}, cmd={command})");
            Ok(child)
        }
        ForkResult::Child => {
            let _ = setpgid(Pid::from_raw(0), Pid::from_raw(0));
            reset_signal_dispositions();
            let _ = sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(&SigSet::all()), None);
            let Err(errno) = execvp(program, &args);
            let stderr = io::stderr();
            let _ = write(&stderr, exec_failed.as_bytes());
            let _ = write(&stderr, errno.desc().as_bytes());
            let _ = write(&stderr, b"\n");
            std::process::exit(EXEC_FAILED_CODE);
        }
    }
}

/// Drop the handlers inherited from the supervisor's signal listeners. A
/// signal arriving before exec must take its default action.
fn reset_signal_dispositions() {
    for sig in Signal::iterator() {
        if matches!(sig, Signal::SIGKILL | Signal::SIGSTOP) {
            continue;
        }
        // SAFETY: SIG_DFL runs no code in this process.
        let _ = unsafe { signal::signal(sig, SigHandler::SigDfl) };
    }
}

/// Spawn every command in order. The first failure aborts.
pub fn spawn_all(commands: &[Vec<OsString>]) -> Result<Vec<Pid>> {
    if commands.is_empty() {
        return Err(Error::NoCommands);
    }
    commands.iter().map(|argv| spawn(argv)).collect()
}
