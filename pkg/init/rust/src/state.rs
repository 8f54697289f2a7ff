// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::fmt;

use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;

/// Status reported for internal failures.
pub const FAILURE_CODE: u8 = 1;

/// How a reaped child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    Exited { pid: Pid, code: i32 },
    Killed { pid: Pid, signal: Signal },
}

impl ChildExit {
    /// `None` for states that are not terminal (stopped, continued, ...).
    pub fn from_wait_status(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Exited(pid, code) => Some(ChildExit::Exited { pid, code }),
            WaitStatus::Signaled(pid, signal, _) => Some(ChildExit::Killed { pid, signal }),
            _ => None,
        }
    }

    /// Exit code, or 128 + signal number for a killed child.
    pub fn code(&self) -> u8 {
        match *self {
            ChildExit::Exited { code, .. } => code as u8,
            ChildExit::Killed { signal, .. } => 128u8.wrapping_add(signal as u8),
        }
    }
}

impl fmt::Display for ChildExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildExit::Exited { pid, code } => write!(f, "process {pid} exited with {code}"),
            ChildExit::Killed { pid, signal } => write!(f, "process {pid} killed by {signal}"),
        }
    }
}

/// Exit status of the whole supervisor: the first non-zero child code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStatus {
    first_failure: Option<u8>,
}

impl AggregateStatus {
    pub fn record(&mut self, exit: ChildExit) {
        let code = exit.code();
        if code != 0 {
            self.fail_with(code);
        }
    }

    /// Set the status unless an earlier failure already did.
    pub fn fail_with(&mut self, code: u8) {
        self.first_failure.get_or_insert(code);
    }

    pub fn code(&self) -> u8 {
        self.first_failure.unwrap_or(0)
    }
}
