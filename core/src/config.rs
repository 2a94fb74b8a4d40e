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

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_STACK_SIZE: u64 = 2_000_000;
pub const DEFAULT_GAP_SIZE: u64 = 100;
/// 2^27 words (1 GiB of u64 cells).
pub const DEFAULT_MEMORY_LIMIT: u64 = 1 << 27;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON Parse Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stack size must be at least one word")]
    ZeroStackSize,
    #[error("memory limit must be at least one word")]
    ZeroMemoryLimit,
}

/// Memory layout knobs for the assembler and the machine it produces.
///
/// Missing JSON fields fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    /// Words reserved for the operand stack.
    pub stack_size: u64,
    /// Zeroed words between code, stack and heap.
    pub gap_size: u64,
    /// Upper bound on memory length, including heap growth at runtime.
    pub memory_limit: u64,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            gap_size: DEFAULT_GAP_SIZE,
            memory_limit: DEFAULT_MEMORY_LIMIT,
        }
    }
}

impl AssemblerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stack_size == 0 {
            return Err(ConfigError::ZeroStackSize);
        }
        if self.memory_limit == 0 {
            return Err(ConfigError::ZeroMemoryLimit);
        }
        Ok(())
    }

    pub fn with_stack_size(mut self, stack_size: u64) -> Self {
        self.stack_size = stack_size;
        self
    }

    pub fn with_gap_size(mut self, gap_size: u64) -> Self {
        self.gap_size = gap_size;
        self
    }

    pub fn with_memory_limit(mut self, memory_limit: u64) -> Self {
        self.memory_limit = memory_limit;
        self
    }
}
