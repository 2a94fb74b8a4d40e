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

use crate::bytecode::Bytecode;
use std::io::{self, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("stack overflow at ip {ip}")]
    StackOverflow { ip: u64 },
    #[error("stack underflow at ip {ip}")]
    StackUnderflow { ip: u64 },
    #[error("unknown bytecode {word} at ip {ip}")]
    UnknownBytecode { word: u64, ip: u64 },
    #[error("{op} is not implemented (ip {ip})")]
    NotImplemented { op: Bytecode, ip: u64 },
    #[error("instruction pointer {ip} is outside memory of {len} words")]
    InstructionOutOfBounds { ip: u64, len: u64 },
    #[error("address {address} exceeds the memory limit of {limit} words")]
    MemoryLimitExceeded { address: u64, limit: u64 },
    #[error("output error: {0}")]
    Output(#[from] io::Error),
}

/// Output sink adapter that prints each byte as a decimal number on its own
/// line, e.g. `24\n` instead of the raw byte `0x18`.
#[derive(Debug)]
pub struct DecimalWriter<W> {
    inner: W,
}

impl<W: Write> DecimalWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for DecimalWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for byte in buf {
            writeln!(self.inner, "{}", byte)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
