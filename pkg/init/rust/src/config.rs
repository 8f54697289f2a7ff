// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::ffi::OsString;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser};
use log::LevelFilter;
use nix::sys::signal::Signal;

use crate::error::{Error, Result};

/// Token separating the options from the first command, and each command
/// from the next.
pub const COMMAND_DELIMITER: &str = "---";

const DEFAULT_STEP_TIMEOUT_SECS: u64 = 2;

const TERMINATION_HELP: &str = "\
COMMANDS
    Everything after the first '---' is a command line to spawn. Several
    commands are separated by further '---' tokens. Empty commands are
    skipped; at least one command is required.

SUBPROCESS TERMINATION
    As soon as any child exits, the remaining children are asked to stop.
    Each signal of the -k list is sent in turn to every current child,
    waiting TIMEOUT seconds between steps. When the list is exhausted and
    children remain, dd-init exits with status 1.

    SIGTERM received by dd-init restarts the sequence from the first step.
    Signals given with -s are forwarded unchanged to every current child.
    SIGHUP, SIGINT, SIGQUIT, SIGUSR1, SIGUSR2 and SIGALRM are ignored unless
    forwarded.

SIGNALS
    Signals are numbers or names (15, TERM, SIGTERM). Only the standard
    signals 1-31 are accepted; real-time signals are not supported.

EXIT STATUS
    The first non-zero status reported by a child (128 + N for a child
    killed by signal N), 0 if every child succeeded, or 1 on error.";

#[derive(Parser, Debug)]
#[command(
    name = "dd-init",
    version,
    about = "Minimal init: spawn commands, reap zombies, stop everything once one exits",
    override_usage = "dd-init [OPTIONS] --- COMMAND [ARGS]... [--- COMMAND [ARGS]...]...",
    after_help = TERMINATION_HELP
)]
struct Cli {
    /// Comma-separated signals (1-31 or names) sent, in order, to stop the children
    #[arg(short = 'k', value_name = "SIGNALS", default_value = "15,9", value_parser = parse_signal_sequence)]
    kill_steps: SignalSequence,

    /// Comma-separated signals (1-31 or names) forwarded to the children
    #[arg(short = 's', value_name = "SIGNALS", default_value = "2", value_parser = parse_signal_set)]
    forward_signals: SignalSet,

    /// Seconds to wait between two termination steps
    #[arg(short = 't', value_name = "TIMEOUT", default_value_t = DEFAULT_STEP_TIMEOUT_SECS)]
    timeout: u64,

    /// Also signal the process group of every child
    #[arg(short = 'g')]
    group: bool,

    /// Increase log verbosity (-v: info, -vv: debug)
    #[arg(short = 'v', action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SignalSequence(Vec<Signal>);

#[derive(Debug, Clone, PartialEq, Eq)]
struct SignalSet(Vec<Signal>);

/// Immutable runtime configuration, built once from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Signals broadcast by successive termination steps.
    pub kill_steps: Vec<Signal>,
    /// Signals relayed verbatim to the children.
    pub forward_signals: Vec<Signal>,
    pub step_timeout: Duration,
    pub group_broadcast: bool,
    pub verbosity: u8,
    /// One argv per child, in spawn order, bytes as given.
    pub commands: Vec<Vec<OsString>>,
}

impl Config {
    /// Parse the full process argument list (including the program name).
    ///
    /// Arguments before the first `---` are options; the rest describe the
    /// commands. Help and version requests come back as `clap` errors whose
    /// `use_stderr()` is false.
    pub fn try_parse_from<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let (options, commands) = match args.iter().position(|a| a == COMMAND_DELIMITER) {
            Some(idx) => (&args[..idx], &args[idx + 1..]),
            None => (&args[..], &[][..]),
        };

        let cli = Cli::try_parse_from(options)?;

        let commands = split_commands(commands);
        if commands.is_empty() {
            return Err(Cli::command().error(ErrorKind::MissingRequiredArgument, Error::NoCommands));
        }

        Ok(Self {
            kill_steps: cli.kill_steps.0,
            forward_signals: cli.forward_signals.0,
            step_timeout: Duration::from_secs(cli.timeout),
            group_broadcast: cli.group,
            verbosity: cli.verbose,
            commands,
        })
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }
}

/// Split `args` on every `---` token, dropping empty runs.
pub fn split_commands(args: &[OsString]) -> Vec<Vec<OsString>> {
    args.split(|a| a == COMMAND_DELIMITER)
        .filter(|run| !run.is_empty())
        .map(<[OsString]>::to_vec)
        .collect()
}

/// Parse one signal, given as a number (`15`) or a name (`TERM`, `SIGTERM`).
pub fn parse_signal(value: &str) -> Result<Signal> {
    let value = value.trim();
    let signal = match value.parse::<i32>() {
        Ok(num) => Signal::try_from(num).ok(),
        Err(_) => {
            let name = value.to_ascii_uppercase();
            if name.starts_with("SIG") {
                name.parse().ok()
            } else {
                format!("SIG{name}").parse().ok()
            }
        }
    };
    signal.ok_or_else(|| Error::InvalidSignal {
        value: value.to_string(),
    })
}

/// Parse a comma-separated list of signals, keeping order and duplicates.
pub fn parse_signal_list(list: &str) -> Result<Vec<Signal>> {
    if list.trim().is_empty() {
        return Err(Error::EmptySignalList);
    }
    list.split(',').map(parse_signal).collect()
}

fn parse_signal_sequence(list: &str) -> Result<SignalSequence> {
    parse_signal_list(list).map(SignalSequence)
}

fn parse_signal_set(list: &str) -> Result<SignalSet> {
    let mut set = Vec::new();
    for signal in parse_signal_list(list)? {
        if !set.contains(&signal) {
            set.push(signal);
        }
    }
    Ok(SignalSet(set))
}
