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

use crate::ast::Program;
use crate::config::{AssemblerConfig, ConfigError};
use crate::parser::{parse_source, ParseError};
use serde_json::from_str;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("JSON Parse Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("Config Error: {0}")]
    Config(#[from] ConfigError),
}

/// Load a program from its JSON form (see `Program`'s serde layout).
pub fn load_program_json(json: &str) -> Result<Program, LoadError> {
    let program: Program = from_str(json)?;
    Ok(program)
}

/// Read and parse an assembly source file.
pub fn load_source_file(path: impl AsRef<Path>) -> Result<Program, LoadError> {
    let source = read(path.as_ref())?;
    let program = parse_source(&source)?;
    debug!(path = %path.as_ref().display(), statements = program.len(), "loaded source");
    Ok(program)
}

/// Read an `AssemblerConfig` JSON file.
pub fn load_config_file(path: impl AsRef<Path>) -> Result<AssemblerConfig, LoadError> {
    let json = read(path.as_ref())?;
    Ok(AssemblerConfig::from_json(&json)?)
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
