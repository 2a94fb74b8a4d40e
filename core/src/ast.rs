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
use serde::{Deserialize, Serialize};
use std::fmt;

/// An operand: an inline literal, or a name the assembler resolves to an address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Literal(u64),
    Variable(String),
}

impl Parameter {
    pub fn var(name: impl Into<String>) -> Self {
        Parameter::Variable(name.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Operation {
    pub op: Bytecode,
    pub params: Vec<Parameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Statement {
    /// `var a b c`
    Variables(Vec<String>),
    Operation(Operation),
    /// `name:` marks the address of the next instruction.
    Label(String),
}

impl Statement {
    pub fn op(op: Bytecode, params: Vec<Parameter>) -> Self {
        Statement::Operation(Operation { op, params })
    }

    pub fn bare(op: Bytecode) -> Self {
        Self::op(op, Vec::new())
    }

    pub fn label(name: impl Into<String>) -> Self {
        Statement::Label(name.into())
    }

    pub fn vars<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Statement::Variables(names.into_iter().map(Into::into).collect())
    }
}

/// A parsed program. Statement order is program-counter order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Statement> {
        self.statements.iter()
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Literal(value) => write!(f, "{}", value),
            Parameter::Variable(name) => f.write_str(name),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op)?;
        for param in &self.params {
            write!(f, " {}", param)?;
        }
        Ok(())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Variables(names) => write!(f, "var {}", names.join(" ")),
            Statement::Operation(operation) => write!(f, "{}", operation),
            Statement::Label(name) => write!(f, "{}:", name),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stmt) in self.statements.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}
