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

//! The vmlang virtual machine.
//!
//! Code, stack and heap share one flat array of u64 words:
//!
//! ```text
//! [ code | exit ][ gap ][ stack ............ ][ gap ][ heap -> grows on demand ]
//! 0              code_size  stack_start     stack_end  heap_start
//! ```
//!
//! `sp` points at the top of the stack. The word at `stack_start` is the
//! empty-stack marker and never holds a value.

use crate::bytecode::Bytecode;
use crate::runtime::RuntimeError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{debug, trace};

/// Region boundaries computed by the assembler, as word addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLayout {
    pub code_size: u64,
    pub stack_start: u64,
    pub stack_end: u64,
    pub heap_start: u64,
}

#[derive(Debug, Clone)]
pub struct VirtualMachine {
    memory: Vec<u64>,
    ip: u64,
    sp: u64,
    layout: MemoryLayout,
    memory_limit: u64,
}

impl VirtualMachine {
    /// A machine ready to run from address 0 with an empty stack.
    pub fn new(memory: Vec<u64>, layout: MemoryLayout, memory_limit: u64) -> Self {
        Self {
            memory,
            ip: 0,
            sp: layout.stack_start,
            layout,
            memory_limit,
        }
    }

    pub fn memory(&self) -> &[u64] {
        &self.memory
    }

    pub fn ip(&self) -> u64 {
        self.ip
    }

    pub fn sp(&self) -> u64 {
        self.sp
    }

    pub fn layout(&self) -> MemoryLayout {
        self.layout
    }

    /// Live stack values, bottom first.
    pub fn stack(&self) -> &[u64] {
        &self.memory[(self.layout.stack_start + 1) as usize..=self.sp as usize]
    }

    /// The heap region, including any growth so far.
    pub fn heap(&self) -> &[u64] {
        &self.memory[self.layout.heap_start as usize..]
    }

    /// Run until `exit`. Each `outb` writes one byte to `output`.
    pub fn execute<W: Write + ?Sized>(&mut self, output: &mut W) -> Result<(), RuntimeError> {
        loop {
            let ip = self.ip;
            let word = self.fetch(ip)?;
            let op = Bytecode::from_word(word).ok_or(RuntimeError::UnknownBytecode { word, ip })?;
            trace!(ip, sp = self.sp, %op, "step");

            match op {
                Bytecode::Push => {
                    let value = self.fetch(ip + 1)?;
                    self.push(value)?;
                }
                Bytecode::Pop => {
                    self.pop()?;
                }
                Bytecode::Increment => {
                    let top = self.top_mut()?;
                    *top = top.wrapping_add(1);
                }
                Bytecode::Decrement => {
                    let top = self.top_mut()?;
                    *top = top.wrapping_sub(1);
                }
                Bytecode::Duplicate => {
                    let value = self.top()?;
                    self.push(value)?;
                }
                Bytecode::ReadMemory => {
                    let address = self.top()?;
                    let value = self.load(address)?;
                    *self.top_mut()? = value;
                }
                Bytecode::WriteMemory => {
                    // Value below the address stays on the stack.
                    self.require_depth(2)?;
                    let address = self.top()?;
                    let value = self.memory[(self.sp - 1) as usize];
                    self.store(address, value)?;
                    self.pop()?;
                }
                Bytecode::OutputByte => {
                    let value = self.top()?;
                    output.write_all(&[value as u8])?;
                }
                Bytecode::Goto => {
                    self.ip = self.fetch(ip + 1)?;
                    continue;
                }
                Bytecode::JumpNotZero => {
                    if self.top()? != 0 {
                        self.ip = self.fetch(ip + 1)?;
                        continue;
                    }
                }
                Bytecode::Call | Bytecode::Return => {
                    return Err(RuntimeError::NotImplemented { op, ip });
                }
                Bytecode::Exit => {
                    output.flush()?;
                    debug!(ip, sp = self.sp, "exit");
                    return Ok(());
                }
                Bytecode::Multiply => {
                    self.require_depth(2)?;
                    let a = self.pop()?;
                    let b = self.pop()?;
                    self.push(a.wrapping_mul(b))?;
                }
            }

            self.ip = ip + 1 + op.operand_count();
        }
    }

    fn fetch(&self, address: u64) -> Result<u64, RuntimeError> {
        usize::try_from(address)
            .ok()
            .and_then(|index| self.memory.get(index).copied())
            .ok_or(RuntimeError::InstructionOutOfBounds {
                ip: address,
                len: self.memory.len() as u64,
            })
    }

    fn depth(&self) -> u64 {
        self.sp - self.layout.stack_start
    }

    fn require_depth(&self, depth: u64) -> Result<(), RuntimeError> {
        if self.depth() < depth {
            return Err(RuntimeError::StackUnderflow { ip: self.ip });
        }
        Ok(())
    }

    fn push(&mut self, value: u64) -> Result<(), RuntimeError> {
        if self.sp + 1 >= self.layout.stack_end {
            return Err(RuntimeError::StackOverflow { ip: self.ip });
        }
        self.sp += 1;
        self.memory[self.sp as usize] = value;
        Ok(())
    }

    fn pop(&mut self) -> Result<u64, RuntimeError> {
        self.require_depth(1)?;
        let value = std::mem::take(&mut self.memory[self.sp as usize]);
        self.sp -= 1;
        Ok(value)
    }

    fn top(&self) -> Result<u64, RuntimeError> {
        self.require_depth(1)?;
        Ok(self.memory[self.sp as usize])
    }

    fn top_mut(&mut self) -> Result<&mut u64, RuntimeError> {
        self.require_depth(1)?;
        Ok(&mut self.memory[self.sp as usize])
    }

    fn load(&mut self, address: u64) -> Result<u64, RuntimeError> {
        let index = self.ensure_address(address)?;
        Ok(self.memory[index])
    }

    fn store(&mut self, address: u64, value: u64) -> Result<(), RuntimeError> {
        let index = self.ensure_address(address)?;
        self.memory[index] = value;
        Ok(())
    }

    /// Grow memory so `address` is valid. Length at least doubles, capped at
    /// the memory limit.
    fn ensure_address(&mut self, address: u64) -> Result<usize, RuntimeError> {
        let len = self.memory.len() as u64;
        if address < len {
            return Ok(address as usize);
        }
        if address >= self.memory_limit {
            return Err(RuntimeError::MemoryLimitExceeded {
                address,
                limit: self.memory_limit,
            });
        }
        let needed = address + 1 - len;
        let new_len = len.saturating_add(needed.max(len)).min(self.memory_limit);
        debug!(from = len, to = new_len, address, "growing heap");
        self.memory.resize(new_len as usize, 0);
        Ok(address as usize)
    }
}
