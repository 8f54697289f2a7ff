// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::process::ExitCode;

use anyhow::Result;
use dd_init::Config;
use log::{error, info};
use simple_logger::SimpleLogger;

fn main() -> ExitCode {
    let config = match Config::try_parse_from(std::env::args_os()) {
        Ok(config) => config,
        Err(e) => {
            // Usage errors exit 1 rather than clap's default 2.
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(e) = SimpleLogger::new().with_level(config.log_level()).init() {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("failed to initialize logging: {e}");
        }
        return ExitCode::FAILURE;
    }

    match run(config) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> Result<u8> {
    info!(
        "dd-init starting (version {}, {} command(s))",
        env!("CARGO_PKG_VERSION"),
        config.commands.len()
    );
    let code = dd_init::run(config)?;
    info!("all children exited, status {code}");
    Ok(code)
}
