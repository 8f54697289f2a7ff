// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use log::warn;
use nix::sys::signal::{SigSet, SigmaskHow, sigprocmask};

/// Holds every signal blocked until dropped, then restores the previous
/// mask. Signals arriving meanwhile stay pending (one per signal number)
/// and are delivered on restore.
#[must_use = "signals are unblocked as soon as the guard is dropped"]
pub struct BlockedSignals {
    previous: SigSet,
}

impl BlockedSignals {
    pub fn block_all() -> nix::Result<Self> {
        let mut previous = SigSet::empty();
        sigprocmask(SigmaskHow::SIG_BLOCK, Some(&SigSet::all()), Some(&mut previous))?;
        Ok(Self { previous })
    }
}

impl Drop for BlockedSignals {
    fn drop(&mut self) {
        if let Err(e) = sigprocmask(SigmaskHow::SIG_SETMASK, Some(&self.previous), None) {
            warn!("failed to restore signal mask: {e}");
        }
    }
}
