/*
 * Copyright (c) 2026 Mohamad Al-Zawahreh (dba Sovereign Systems).
 *
 * This file is part of the Ark Sovereign Compiler.
 *
 * LICENSE: DUAL-LICENSED (AGPLv3 or COMMERCIAL).
 *
 * 1. OPEN SOURCE: You may use this file under the terms of the GNU Affero
 * General Public License v3.0. If you link to this code, your ENTIRE
 * application must be open-sourced under AGPLv3.
 *
 * 2. COMMERCIAL: For proprietary use, you must obtain a Commercial License
 * from Sovereign Systems.
 *
 * PATENT NOTICE: Protected by US Patent App #63/935,467.
 * NO IMPLIED LICENSE to rights of Mohamad Al-Zawahreh or Sovereign Systems.
 */

use std::env;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use vmlang::loader::{load_config_file, load_source_file};
use vmlang::runtime::DecimalWriter;
use vmlang::{assemble, AssemblerConfig, Error};

const USAGE: &str = "Usage: vmlang <program.asm> [--byte2dec] [--config <config.json>]";

struct Args {
    source: String,
    byte2dec: bool,
    config: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut source = None;
    let mut byte2dec = false;
    let mut config = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--byte2dec" | "-byte2dec" => byte2dec = true,
            "--config" => {
                config = Some(args.next().ok_or("--config needs a path")?);
            }
            flag if flag.starts_with('-') => return Err(format!("unknown flag: {}", flag)),
            path => {
                if source.is_some() {
                    return Err(format!("unexpected argument: {}", path));
                }
                source = Some(path.to_string());
            }
        }
    }
    let source = source.ok_or(USAGE)?;
    Ok(Args {
        source,
        byte2dec,
        config,
    })
}

fn run(args: &Args) -> Result<(), Error> {
    let config = match &args.config {
        Some(path) => load_config_file(path)?,
        None => AssemblerConfig::default(),
    };
    let program = load_source_file(&args.source)?;
    let mut vm = assemble(&program, &config)?;
    info!(file = %args.source, code_size = vm.layout().code_size, "running");

    let stdout = io::BufWriter::new(io::stdout().lock());
    let mut out: Box<dyn Write> = if args.byte2dec {
        Box::new(DecimalWriter::new(stdout))
    } else {
        Box::new(stdout)
    };
    vm.execute(out.as_mut())?;
    Ok(())
}

fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::from(2);
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", args.source, e);
            ExitCode::FAILURE
        }
    }
}
