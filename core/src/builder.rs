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

//! Incremental AST construction.
//!
//! The parser opens a statement when it recognises its leading keyword,
//! appends names or parameters as it consumes them, and commits the
//! statement at the end. `AstBuilder` is a plain value: cloning it is cheap
//! (committed statements live in a `PList`), so the combinator engine can
//! snapshot it before a branch and restore it by assignment.

use crate::ast::{Operation, Parameter, Program, Statement};
use crate::bytecode::Bytecode;
use crate::persistent::PList;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("expected var statement")]
    ExpectedVariableStatement,
    #[error("expected op statement")]
    ExpectedOperationStatement,
    #[error("expected initialised statement")]
    NoOpenStatement,
    #[error("invalid literal {text:?}: {reason}")]
    InvalidLiteral { text: String, reason: String },
}

/// The statement currently being assembled by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OpenStatement {
    Variables(Vec<String>),
    Operation(Bytecode, Vec<Parameter>),
    Label(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AstBuilder {
    statements: PList<Statement>,
    open: Option<OpenStatement>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // Opening a statement discards whatever was open and not committed.
    pub fn begin_variables(&mut self) {
        self.open = Some(OpenStatement::Variables(Vec::new()));
    }

    pub fn begin_operation(&mut self, op: Bytecode) {
        self.open = Some(OpenStatement::Operation(op, Vec::new()));
    }

    pub fn begin_label(&mut self, name: impl Into<String>) {
        self.open = Some(OpenStatement::Label(name.into()));
    }

    pub fn append_variable(&mut self, name: impl Into<String>) -> Result<(), BuildError> {
        match &mut self.open {
            Some(OpenStatement::Variables(names)) => {
                names.push(name.into());
                Ok(())
            }
            _ => Err(BuildError::ExpectedVariableStatement),
        }
    }

    pub fn append_parameter(&mut self, param: Parameter) -> Result<(), BuildError> {
        match &mut self.open {
            Some(OpenStatement::Operation(_, params)) => {
                params.push(param);
                Ok(())
            }
            _ => Err(BuildError::ExpectedOperationStatement),
        }
    }

    /// Commit the open statement and clear the scratch state.
    pub fn complete_statement(&mut self) -> Result<(), BuildError> {
        let stmt = match self.open.take() {
            Some(OpenStatement::Variables(names)) => Statement::Variables(names),
            Some(OpenStatement::Operation(op, params)) => {
                Statement::Operation(Operation { op, params })
            }
            Some(OpenStatement::Label(name)) => Statement::Label(name),
            None => return Err(BuildError::NoOpenStatement),
        };
        self.statements = self.statements.conj(stmt);
        Ok(())
    }

    pub fn has_open_statement(&self) -> bool {
        self.open.is_some()
    }

    /// Number of committed statements.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Committed statements in order. An open statement is not included.
    pub fn build(&self) -> Program {
        Program::new(self.statements.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_each_statement_kind() {
        let mut b = AstBuilder::new();
        b.begin_variables();
        b.append_variable("a").unwrap();
        b.append_variable("b").unwrap();
        b.complete_statement().unwrap();

        b.begin_label("top");
        b.complete_statement().unwrap();

        b.begin_operation(Bytecode::Push);
        b.append_parameter(Parameter::var("a")).unwrap();
        b.append_parameter(Parameter::Literal(7)).unwrap();
        b.complete_statement().unwrap();

        assert!(!b.has_open_statement());
        assert_eq!(
            b.build(),
            Program::new(vec![
                Statement::vars(["a", "b"]),
                Statement::label("top"),
                Statement::op(
                    Bytecode::Push,
                    vec![Parameter::var("a"), Parameter::Literal(7)]
                ),
            ])
        );
    }

    #[test]
    fn test_append_requires_compatible_statement() {
        let mut b = AstBuilder::new();
        assert_eq!(
            b.append_variable("x"),
            Err(BuildError::ExpectedVariableStatement)
        );

        b.begin_variables();
        assert_eq!(
            b.append_parameter(Parameter::Literal(1)),
            Err(BuildError::ExpectedOperationStatement)
        );

        b.begin_operation(Bytecode::Pop);
        assert_eq!(
            b.append_variable("x"),
            Err(BuildError::ExpectedVariableStatement)
        );
    }

    #[test]
    fn test_complete_without_open_statement() {
        let mut b = AstBuilder::new();
        assert_eq!(b.complete_statement(), Err(BuildError::NoOpenStatement));
        assert!(b.is_empty());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut b = AstBuilder::new();
        b.begin_operation(Bytecode::Exit);
        b.complete_statement().unwrap();
        let snapshot = b.clone();

        b.begin_operation(Bytecode::Pop);
        b.complete_statement().unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(b.len(), 2);
        assert_eq!(snapshot.build().statements, vec![Statement::bare(Bytecode::Exit)]);
    }
}
