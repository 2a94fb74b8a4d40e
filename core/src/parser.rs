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

//! vmlang source parser, built from the combinators in `combinator.rs`.
//!
//! Parses assembly source into the `Program` AST defined in `ast.rs`, one
//! statement per line:
//!
//! ```text
//! var acc          # declare heap variables
//! loop:            # label the next instruction
//! push acc 4       # opcode mnemonic followed by parameters
//! ```
//!
//! (Comments are not part of the language; they are shown here for
//! explanation only.)

use crate::ast::{Parameter, Program};
use crate::builder::BuildError;
use crate::bytecode::Bytecode;
use crate::combinator::{
    alternative, eof, newline, number, optional_whitespace, preview, repeat, sequence,
    start_capture, stmt_end, stop_capture, text_eq, var_name, whitespace, with_builder,
    with_capture, Combinator, Failure, ParseContext,
};
use thiserror::Error;
use tracing::debug;

// ─── Error Types ─────────────────────────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("syntax error at {line}:{col} in rule {rule}: {message} (unmatched input: {near:?})")]
    Syntax {
        rule: String,
        message: String,
        line: usize,
        col: usize,
        /// Unparsed text from the failure point to the end of that line.
        near: String,
    },
}

impl ParseError {
    fn from_failure(source: &str, failure: Failure) -> Self {
        let before = &source[..failure.offset];
        let line = before.matches('\n').count() + 1;
        let col = before
            .rsplit('\n')
            .next()
            .map_or(0, |text| text.chars().count())
            + 1;
        let rest = source[failure.offset..]
            .split(['\n', '\r'])
            .next()
            .unwrap_or_default();
        ParseError::Syntax {
            rule: failure.rule.unwrap_or("unknown").to_string(),
            message: failure.message,
            line,
            col,
            near: preview(rest, 32),
        }
    }
}

// ─── Entry Point ─────────────────────────────────────────────────────────────

/// Parse a whole source text into a program.
pub fn parse_source(source: &str) -> Result<Program, ParseError> {
    let mut ctx = program()(ParseContext::new(source));
    if ctx.failed {
        // A failed context always carries the failure that set the flag.
        let failure = ctx.furthest.take().unwrap_or_else(|| Failure {
            rule: Some("AST"),
            message: "unparsed input".to_string(),
            offset: ctx.offset(),
        });
        let err = ParseError::from_failure(ctx.source(), failure);
        debug!(%err, "parse failed");
        return Err(err);
    }
    let program = ctx.builder.build();
    debug!(statements = program.len(), "parsed program");
    Ok(program)
}

// ─── Grammar ─────────────────────────────────────────────────────────────────

/// `AST := Repeat(BlankLine | Stmt) , OptionalWhitespace , EOF`
pub fn program() -> Combinator {
    sequence(
        "AST",
        vec![
            repeat(alternative("Line", vec![blank_line(), statement()])),
            optional_whitespace(),
            eof(),
        ],
    )
}

fn blank_line() -> Combinator {
    sequence("BlankLine", vec![optional_whitespace(), newline()])
}

/// `Stmt := OptionalWhitespace , (Label | VarStmt | OpStmt) , StmtEnd`
pub fn statement() -> Combinator {
    sequence(
        "Stmt",
        vec![
            optional_whitespace(),
            alternative("StmtAlt", vec![label_stmt(), var_stmt(), op_stmt()]),
            stmt_end(),
        ],
    )
}

pub fn label_stmt() -> Combinator {
    sequence(
        "LabelStmt",
        vec![
            start_capture(),
            var_name(),
            stop_capture(),
            text_eq(":"),
            with_capture("LabelStmt", |bldr, name| {
                bldr.begin_label(name);
                Ok(())
            }),
            complete_stmt(),
        ],
    )
}

pub fn var_stmt() -> Combinator {
    sequence(
        "VarStmt",
        vec![
            text_eq("var"),
            with_builder("VarStmt", |bldr| {
                bldr.begin_variables();
                Ok(())
            }),
            whitespace(),
            var_decl(),
            repeat(sequence("VarDecls", vec![whitespace(), var_decl()])),
            complete_stmt(),
        ],
    )
}

fn var_decl() -> Combinator {
    sequence(
        "VarDecl",
        vec![
            start_capture(),
            var_name(),
            stop_capture(),
            with_capture("VarDecl", |bldr, name| bldr.append_variable(name)),
        ],
    )
}

/// Ordered alternation of every mnemonic in `Bytecode::ALL`.
pub fn op_name() -> Combinator {
    let ops = Bytecode::ALL
        .iter()
        .map(|&op| {
            sequence(
                "OpName",
                vec![
                    text_eq(op.mnemonic()),
                    with_builder("OpName", move |bldr| {
                        bldr.begin_operation(op);
                        Ok(())
                    }),
                ],
            )
        })
        .collect();
    alternative("OpName", ops)
}

pub fn op_stmt() -> Combinator {
    sequence(
        "OpStmt",
        vec![
            op_name(),
            repeat(sequence(
                "OpParams",
                vec![
                    whitespace(),
                    alternative("OpParamAlt", vec![var_param(), literal_param()]),
                ],
            )),
            complete_stmt(),
        ],
    )
}

fn var_param() -> Combinator {
    sequence(
        "OpVarParam",
        vec![
            start_capture(),
            var_name(),
            stop_capture(),
            with_capture("OpVarParam", |bldr, name| {
                bldr.append_parameter(Parameter::var(name))
            }),
        ],
    )
}

fn literal_param() -> Combinator {
    sequence(
        "OpLitParam",
        vec![
            start_capture(),
            number(),
            stop_capture(),
            with_capture("OpLitParam", |bldr, text| {
                let value = text
                    .parse::<u64>()
                    .map_err(|e| BuildError::InvalidLiteral {
                        text: text.to_string(),
                        reason: e.to_string(),
                    })?;
                bldr.append_parameter(Parameter::Literal(value))
            }),
        ],
    )
}

fn complete_stmt() -> Combinator {
    with_builder("CompleteStmt", |bldr| bldr.complete_statement())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;

    fn parse_with(comb: Combinator, input: &str) -> ParseContext {
        comb(ParseContext::new(input))
    }

    #[test]
    fn test_op_stmt() {
        let ctx = parse_with(op_stmt(), "push foo 123");
        assert!(!ctx.failed);
        assert_eq!(ctx.remaining(), "");
        assert_eq!(
            ctx.builder.build().statements,
            vec![Statement::op(
                Bytecode::Push,
                vec![Parameter::var("foo"), Parameter::Literal(123)]
            )]
        );
    }

    #[test]
    fn test_op_stmt_rejects_var_keyword() {
        let ctx = parse_with(op_stmt(), "var foo 123");
        assert!(ctx.failed);
        assert_eq!(ctx.remaining(), "var foo 123");
        assert!(ctx.builder.is_empty());
    }

    #[test]
    fn test_var_stmt() {
        let ctx = parse_with(var_stmt(), "var a b2  c");
        assert!(!ctx.failed);
        assert_eq!(
            ctx.builder.build().statements,
            vec![Statement::vars(["a", "b2", "c"])]
        );
    }

    #[test]
    fn test_var_stmt_needs_a_name() {
        let ctx = parse_with(var_stmt(), "var ");
        assert!(ctx.failed);
        assert!(ctx.builder.is_empty());
        assert!(!ctx.builder.has_open_statement());
    }

    #[test]
    fn test_label_stmt() {
        let ctx = parse_with(label_stmt(), "loop1:");
        assert!(!ctx.failed);
        assert_eq!(
            ctx.builder.build().statements,
            vec![Statement::label("loop1")]
        );
    }

    #[test]
    fn test_every_mnemonic_parses() {
        for op in Bytecode::ALL {
            let program = parse_source(op.mnemonic()).unwrap();
            assert_eq!(program.statements, vec![Statement::bare(op)]);
        }
    }

    #[test]
    fn test_parse_program() {
        let source = "var acc\npush 4\n  push acc\n\twmem\nfac:\n  jnz fac\nexit\n";
        let program = parse_source(source).unwrap();
        assert_eq!(
            program.statements,
            vec![
                Statement::vars(["acc"]),
                Statement::op(Bytecode::Push, vec![Parameter::Literal(4)]),
                Statement::op(Bytecode::Push, vec![Parameter::var("acc")]),
                Statement::bare(Bytecode::WriteMemory),
                Statement::label("fac"),
                Statement::op(Bytecode::JumpNotZero, vec![Parameter::var("fac")]),
                Statement::bare(Bytecode::Exit),
            ]
        );
    }

    #[test]
    fn test_parse_tolerates_blank_lines_and_crlf() {
        let program = parse_source("\npush 1  \r\n\n   \noutb\r\n").unwrap();
        assert_eq!(program.len(), 2);
    }

    #[test]
    fn test_parse_empty_source() {
        assert!(parse_source("").unwrap().is_empty());
    }

    #[test]
    fn test_trailing_whitespace_without_newline() {
        let program = parse_source("push 1\n   ").unwrap();
        assert_eq!(
            program.statements,
            vec![Statement::op(Bytecode::Push, vec![Parameter::Literal(1)])]
        );
        assert!(parse_source("   ").unwrap().is_empty());
        assert!(parse_source("\t \n \t").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_mnemonic_names_op_rule() {
        let ctx = parse_with(op_name(), "jump");
        assert!(ctx.failed);
        let err = ctx.error.unwrap();
        assert_eq!(err.rule, Some("OpName"));
        assert_eq!(err.message, r#"expected "mult" but was "jump""#);
    }

    #[test]
    fn test_labels_shadow_keywords() {
        // Label is tried first, so `var:` and `exit:` are labels.
        let program = parse_source("var:\nexit:\nvar x").unwrap();
        assert_eq!(
            program.statements,
            vec![
                Statement::label("var"),
                Statement::label("exit"),
                Statement::vars(["x"]),
            ]
        );
    }

    #[test]
    fn test_rendering_parses_back() {
        let source = "var a b\nstart:\npush a 7\ngoto start\nexit";
        let program = parse_source(source).unwrap();
        assert_eq!(program.to_string(), source);
        assert_eq!(parse_source(&program.to_string()).unwrap(), program);
    }

    #[test]
    fn test_syntax_error_location() {
        let err = parse_source("push 4 !\n").unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @r#"syntax error at 1:8 in rule LineEnd: expected end of input but was "!\n" (unmatched input: "!")"#
        );
    }

    #[test]
    fn test_syntax_error_on_later_line() {
        let err = parse_source("push 1\npush 2\n  pusj 3\n").unwrap_err();
        match err {
            ParseError::Syntax { line, .. } => assert_eq!(line, 3),
            other => panic!("Expected Syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_literal_overflow_is_a_parse_error() {
        let err = parse_source("push 18446744073709551616").unwrap_err();
        match err {
            ParseError::Syntax { message, .. } => {
                assert!(message.starts_with("invalid literal"), "{}", message)
            }
            other => panic!("Expected Syntax error, got {:?}", other),
        }
        assert!(parse_source("push 18446744073709551615").is_ok());
    }

    #[test]
    fn test_failed_statement_leaves_no_partial_ast() {
        // `push 5` is committed before StmtEnd fails on the trailing junk.
        let ctx = parse_with(statement(), "push 5 ?");
        assert!(ctx.failed);
        assert!(ctx.builder.is_empty());
        assert_eq!(ctx.offset(), 0);
    }
}
