// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Scriptable child process for the dd-init integration tests.
//!
//! ```text
//! dd-init-test-child [--rc N] [--timeout SECS] [--ignore-sigterm]
//!                    [--exec CMD ARGS... | --call CMD ARGS...]
//! ```
//!
//! Blocks every signal and waits. Exits with `--rc` when `--timeout` elapses
//! (immediately for 0) or on SIGTERM unless `--ignore-sigterm`. `--exec`
//! spawns a command and exits 0 right away, orphaning it; `--call` spawns a
//! command and keeps waiting. Logs "waiting" once its signals are blocked
//! and every signal it receives after that.
#![allow(clippy::print_stderr)]

use std::process::{Command, ExitCode};

use anyhow::{Context, Result, bail};
use nix::sys::signal::{SigSet, SigmaskHow, Signal, sigprocmask};
use nix::unistd::{alarm, getpid};

#[derive(Debug, Default)]
struct Script {
    rc: u8,
    timeout: u32,
    ignore_sigterm: bool,
    spawn: Option<(Vec<String>, SpawnMode)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpawnMode {
    Exec,
    Call,
}

fn parse(mut args: impl Iterator<Item = String>) -> Result<Script> {
    let mut script = Script::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--rc" => {
                let value = args.next().context("--rc needs a value")?;
                script.rc = value.parse().with_context(|| format!("bad --rc {value}"))?;
            }
            "--timeout" => {
                let value = args.next().context("--timeout needs a value")?;
                script.timeout = value
                    .parse()
                    .with_context(|| format!("bad --timeout {value}"))?;
            }
            "--ignore-sigterm" => script.ignore_sigterm = true,
            "--exec" | "--call" => {
                let mode = if arg == "--exec" {
                    SpawnMode::Exec
                } else {
                    SpawnMode::Call
                };
                let command: Vec<String> = args.by_ref().collect();
                if command.is_empty() {
                    bail!("{arg} needs a command");
                }
                script.spawn = Some((command, mode));
            }
            other => bail!("unexpected argument {other}"),
        }
    }
    Ok(script)
}

fn run(script: Script) -> Result<u8> {
    let me = getpid();

    if let Some((command, mode)) = &script.spawn {
        let child = Command::new(&command[0])
            .args(&command[1..])
            .spawn()
            .with_context(|| format!("child {me}: failed to spawn {}", command[0]))?;
        eprintln!("child {me}: spawned pid: {}", child.id());
        if *mode == SpawnMode::Exec {
            return Ok(0);
        }
    }

    if script.timeout == 0 {
        return Ok(script.rc);
    }

    let all = SigSet::all();
    sigprocmask(SigmaskHow::SIG_BLOCK, Some(&all), None).context("sigprocmask")?;
    alarm::set(script.timeout);
    eprintln!("child {me}: waiting");

    loop {
        let sig = all.wait().with_context(|| format!("child {me}: sigwait failed"))?;
        eprintln!("child {me}: received signal {}: {sig}", sig as i32);
        match sig {
            Signal::SIGALRM => return Ok(script.rc),
            Signal::SIGTERM if !script.ignore_sigterm => return Ok(script.rc),
            _ => {}
        }
    }
}

fn main() -> ExitCode {
    let result = parse(std::env::args().skip(1)).and_then(run);
    match result {
        Ok(rc) => ExitCode::from(rc),
        Err(e) => {
            eprintln!("child {}: {e:#}", getpid());
            ExitCode::FAILURE
        }
    }
}
