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

//! Two-pass assembler: `Program` -> initialised `VirtualMachine`.
//!
//! Pass one declares every variable and label so names may be used before
//! the line that declares them. Pass two lays out memory and writes the code.

use crate::ast::{Parameter, Program, Statement};
use crate::bytecode::Bytecode;
use crate::config::{AssemblerConfig, ConfigError};
use crate::vm::{MemoryLayout, VirtualMachine};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("symbol already defined: {0}")]
    DuplicateSymbol(String),
    #[error("undefined symbol: {0}")]
    UndefinedSymbol(String),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("memory layout needs {required} words but the limit is {limit}")]
    LayoutTooLarge { required: u64, limit: u64 },
}

pub struct Assembler<'a> {
    config: &'a AssemblerConfig,
    /// Variable name -> offset from the heap start.
    variables: HashMap<String, u64>,
    /// Label name -> code address.
    labels: HashMap<String, u64>,
}

impl<'a> Assembler<'a> {
    pub fn new(config: &'a AssemblerConfig) -> Self {
        Assembler {
            config,
            variables: HashMap::new(),
            labels: HashMap::new(),
        }
    }

    pub fn assemble(mut self, program: &Program) -> Result<VirtualMachine, AssemblyError> {
        self.config.validate()?;
        let code_size = self.declare(program)?;
        let layout = self.layout(code_size)?;
        let memory = self.emit(program, &layout)?;

        debug!(
            statements = program.len(),
            variables = self.variables.len(),
            labels = self.labels.len(),
            code_size = layout.code_size,
            stack_start = layout.stack_start,
            stack_end = layout.stack_end,
            heap_start = layout.heap_start,
            "assembled program"
        );
        Ok(VirtualMachine::new(memory, layout, self.config.memory_limit))
    }

    /// Register every name and return the code size, trailing `exit` included.
    fn declare(&mut self, program: &Program) -> Result<u64, AssemblyError> {
        let mut pc: u64 = 0;
        for stmt in program.iter() {
            match stmt {
                Statement::Variables(names) => {
                    for name in names {
                        let offset = self.variables.len() as u64;
                        self.define(name, offset, true)?;
                    }
                }
                Statement::Label(name) => self.define(name, pc, false)?,
                Statement::Operation(operation) => {
                    pc = pc
                        .checked_add(1 + operation.params.len() as u64)
                        .ok_or_else(|| self.too_large(u64::MAX))?;
                }
            }
        }
        pc.checked_add(1).ok_or_else(|| self.too_large(u64::MAX))
    }

    fn define(&mut self, name: &str, value: u64, variable: bool) -> Result<(), AssemblyError> {
        if self.variables.contains_key(name) || self.labels.contains_key(name) {
            return Err(AssemblyError::DuplicateSymbol(name.to_string()));
        }
        let table = if variable {
            &mut self.variables
        } else {
            &mut self.labels
        };
        table.insert(name.to_string(), value);
        Ok(())
    }

    fn layout(&self, code_size: u64) -> Result<MemoryLayout, AssemblyError> {
        let gap = self.config.gap_size;
        let overflow = || self.too_large(u64::MAX);
        let stack_start = code_size.checked_add(gap).ok_or_else(overflow)?;
        let stack_end = stack_start
            .checked_add(self.config.stack_size)
            .ok_or_else(overflow)?;
        let heap_start = stack_end.checked_add(gap).ok_or_else(overflow)?;
        if heap_start > self.config.memory_limit || usize::try_from(heap_start).is_err() {
            return Err(self.too_large(heap_start));
        }
        Ok(MemoryLayout {
            code_size,
            stack_start,
            stack_end,
            heap_start,
        })
    }

    fn emit(&self, program: &Program, layout: &MemoryLayout) -> Result<Vec<u64>, AssemblyError> {
        let mut memory = vec![0u64; layout.heap_start as usize];
        let mut pc = 0usize;
        for stmt in program.iter() {
            if let Statement::Operation(operation) = stmt {
                memory[pc] = operation.op.word();
                pc += 1;
                for param in &operation.params {
                    memory[pc] = self.resolve(param, layout)?;
                    pc += 1;
                }
            }
        }
        memory[pc] = Bytecode::Exit.word();
        Ok(memory)
    }

    fn resolve(&self, param: &Parameter, layout: &MemoryLayout) -> Result<u64, AssemblyError> {
        match param {
            Parameter::Literal(value) => Ok(*value),
            Parameter::Variable(name) => {
                if let Some(offset) = self.variables.get(name) {
                    return layout
                        .heap_start
                        .checked_add(*offset)
                        .ok_or_else(|| self.too_large(u64::MAX));
                }
                self.labels
                    .get(name)
                    .copied()
                    .ok_or_else(|| AssemblyError::UndefinedSymbol(name.clone()))
            }
        }
    }

    fn too_large(&self, required: u64) -> AssemblyError {
        AssemblyError::LayoutTooLarge {
            required,
            limit: self.config.memory_limit,
        }
    }
}

/// Assemble `program` into a machine ready to execute.
pub fn assemble(
    program: &Program,
    config: &AssemblerConfig,
) -> Result<VirtualMachine, AssemblyError> {
    Assembler::new(config).assemble(program)
}
