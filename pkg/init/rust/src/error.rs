// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::path::PathBuf;

use nix::errno::Errno;
use nix::sys::signal::Signal;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid signal {value:?}")]
    InvalidSignal { value: String },

    #[error("signal list must not be empty")]
    EmptySignalList,

    #[error("no children spawned, exiting")]
    NoCommands,

    #[error("cannot read child list {}: {source}", path.display())]
    ChildListUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed child list {}: unexpected entry {entry:?}", path.display())]
    MalformedChildList { path: PathBuf, entry: String },

    #[error("failed to spawn {command}: {reason}")]
    Spawn { command: String, reason: String },

    #[error("cannot listen for {signal}: {source}")]
    SignalRegistration {
        signal: Signal,
        source: std::io::Error,
    },

    #[error("failed to block signals: {0}")]
    SignalMask(Errno),

    #[error("failed to start runtime: {0}")]
    Runtime(std::io::Error),

    #[error("failed to register as child subreaper: {0}")]
    Subreaper(Errno),

    #[error("not all children terminated in time, exiting")]
    ChildrenNotTerminated,
}
