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

//! Backtracking parser combinators.
//!
//! A combinator maps a `ParseContext` to a new `ParseContext`. Failure is a
//! flag on the context rather than a `Result`, so a failed branch still hands
//! back a context carrying the diagnostic. `sequence` and `alternative`
//! restore the whole starting context (input position, capture state and
//! AST builder) when a branch fails.
//!
//! `error` is the most recent failure: when every branch of an `alternative`
//! fails, it is the last branch's error. Separately, `furthest` remembers
//! the failure that got deepest into the input (later failures win ties) and
//! survives backtracking, so a top-level parse can point at the real problem.

use crate::builder::{AstBuilder, BuildError};
use std::rc::Rc;
use tracing::trace;

/// Why a combinator failed, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Innermost named rule that reported the failure.
    pub rule: Option<&'static str>,
    pub message: String,
    /// Byte offset into the source.
    pub offset: usize,
}

#[derive(Debug, Clone)]
pub struct ParseContext {
    source: Rc<str>,
    offset: usize,
    pub failed: bool,
    pub error: Option<Failure>,
    pub furthest: Option<Failure>,
    pub capturing: bool,
    pub captured: String,
    pub builder: AstBuilder,
}

impl ParseContext {
    pub fn new(source: &str) -> Self {
        Self {
            source: Rc::from(source),
            offset: 0,
            failed: false,
            error: None,
            furthest: None,
            capturing: false,
            captured: String::new(),
            builder: AstBuilder::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Unconsumed input.
    pub fn remaining(&self) -> &str {
        &self.source[self.offset..]
    }

    fn consume(&mut self, len: usize) {
        let end = self.offset + len;
        if self.capturing {
            self.captured.push_str(&self.source[self.offset..end]);
        }
        self.offset = end;
    }

    fn fail(&mut self, rule: Option<&'static str>, message: String) {
        self.failed = true;
        let failure = Failure {
            rule,
            message,
            offset: self.offset,
        };
        self.furthest = furthest(self.furthest.take(), Some(failure.clone()));
        self.error = Some(failure);
    }

    /// Label unnamed failures with the innermost named rule around them.
    fn name_failure(&mut self, rule: &'static str) {
        for failure in [&mut self.error, &mut self.furthest].into_iter().flatten() {
            if failure.rule.is_none() {
                failure.rule = Some(rule);
            }
        }
    }
}

fn furthest(current: Option<Failure>, candidate: Option<Failure>) -> Option<Failure> {
    match (current, candidate) {
        (Some(current), Some(candidate)) if current.offset > candidate.offset => Some(current),
        (current, None) => current,
        (_, candidate) => candidate,
    }
}

/// First `max` characters of `text`, for diagnostics.
pub(crate) fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

pub type Combinator = Rc<dyn Fn(ParseContext) -> ParseContext>;

/// Apply each combinator in order. If any fails, the whole sequence fails and
/// the context reverts to where the sequence started.
pub fn sequence(name: &'static str, combinators: Vec<Combinator>) -> Combinator {
    Rc::new(move |ctx: ParseContext| {
        let start = ctx.clone();
        let mut current = ctx;
        for combinator in &combinators {
            current = combinator(current);
            if current.failed {
                trace!(rule = name, offset = start.offset, "sequence backtrack");
                let mut reverted = start;
                reverted.failed = true;
                reverted.error = current.error;
                reverted.furthest = current.furthest;
                reverted.name_failure(name);
                return reverted;
            }
        }
        current
    })
}

/// Try each combinator against the same starting context; first success wins.
/// If all fail, the last attempt's error is reported.
pub fn alternative(name: &'static str, combinators: Vec<Combinator>) -> Combinator {
    Rc::new(move |ctx: ParseContext| {
        let mut error = ctx.error.clone();
        let mut deepest = ctx.furthest.clone();
        for combinator in &combinators {
            let mut attempt = combinator(ctx.clone());
            if !attempt.failed {
                attempt.furthest = furthest(deepest, attempt.furthest);
                return attempt;
            }
            attempt.name_failure(name);
            error = attempt.error;
            deepest = furthest(deepest, attempt.furthest);
        }
        trace!(rule = name, offset = ctx.offset, "alternative exhausted");
        let mut failed = ctx;
        failed.failed = true;
        failed.error = error;
        failed.furthest = deepest;
        failed
    })
}

/// Zero or more applications. Stops at the first failure (keeping only its
/// diagnostic) or at a success that consumed nothing.
pub fn repeat(combinator: Combinator) -> Combinator {
    Rc::new(move |ctx: ParseContext| {
        let mut current = ctx;
        loop {
            let next = combinator(current.clone());
            if next.failed {
                current.error = next.error;
                current.furthest = next.furthest;
                return current;
            }
            if next.offset == current.offset {
                return next;
            }
            current = next;
        }
    })
}

pub fn text_eq(text: impl Into<String>) -> Combinator {
    let text = text.into();
    Rc::new(move |mut ctx: ParseContext| {
        if ctx.remaining().starts_with(text.as_str()) {
            ctx.consume(text.len());
            return ctx;
        }
        let found = preview(ctx.remaining(), text.chars().count());
        ctx.fail(None, format!("expected {:?} but was {:?}", text, found));
        ctx
    })
}

/// Consume one character accepted by `predicate`.
pub fn match_rune<F>(name: &'static str, predicate: F) -> Combinator
where
    F: Fn(char) -> bool + 'static,
{
    Rc::new(move |mut ctx: ParseContext| {
        let next = ctx.remaining().chars().next();
        match next {
            Some(c) if predicate(c) => ctx.consume(c.len_utf8()),
            Some(c) => ctx.fail(
                Some(name),
                format!("unexpected rune for rule {}: {:?}", name, c.to_string()),
            ),
            None => ctx.fail(
                Some(name),
                format!("unexpected end of input for rule {}", name),
            ),
        }
        ctx
    })
}

pub fn eof() -> Combinator {
    Rc::new(|mut ctx: ParseContext| {
        if !ctx.remaining().is_empty() {
            let found = preview(ctx.remaining(), 8);
            ctx.fail(None, format!("expected end of input but was {:?}", found));
        }
        ctx
    })
}

pub fn start_capture() -> Combinator {
    Rc::new(|mut ctx: ParseContext| {
        ctx.capturing = true;
        ctx
    })
}

pub fn stop_capture() -> Combinator {
    Rc::new(|mut ctx: ParseContext| {
        ctx.capturing = false;
        ctx
    })
}

/// Run a semantic action against the builder. An error fails the context.
pub fn with_builder<F>(name: &'static str, action: F) -> Combinator
where
    F: Fn(&mut AstBuilder) -> Result<(), BuildError> + 'static,
{
    Rc::new(move |mut ctx: ParseContext| {
        if let Err(err) = action(&mut ctx.builder) {
            ctx.fail(Some(name), err.to_string());
        }
        ctx
    })
}

/// Like `with_builder`, but hands the action the captured text and clears it.
pub fn with_capture<F>(name: &'static str, action: F) -> Combinator
where
    F: Fn(&mut AstBuilder, &str) -> Result<(), BuildError> + 'static,
{
    Rc::new(move |mut ctx: ParseContext| {
        let captured = std::mem::take(&mut ctx.captured);
        if let Err(err) = action(&mut ctx.builder, &captured) {
            ctx.captured = captured;
            ctx.fail(Some(name), err.to_string());
        }
        ctx
    })
}

// ─── Derived Rules ───────────────────────────────────────────────────────────

pub fn letter() -> Combinator {
    match_rune("IsLetter", char::is_alphabetic)
}

pub fn digit() -> Combinator {
    match_rune("IsDigit", |c| c.is_ascii_digit())
}

pub fn var_name() -> Combinator {
    sequence(
        "VarName",
        vec![
            letter(),
            repeat(alternative("VarNameContinue", vec![letter(), digit()])),
        ],
    )
}

pub fn number() -> Combinator {
    sequence("Number", vec![digit(), repeat(digit())])
}

pub fn white_char() -> Combinator {
    alternative("WhiteChar", vec![text_eq(" "), text_eq("\t")])
}

pub fn whitespace() -> Combinator {
    sequence("Whitespace", vec![white_char(), repeat(white_char())])
}

pub fn optional_whitespace() -> Combinator {
    repeat(white_char())
}

pub fn newline() -> Combinator {
    alternative("Newline", vec![text_eq("\n"), text_eq("\r\n")])
}

/// Optional trailing whitespace, then a newline or the end of input.
pub fn stmt_end() -> Combinator {
    sequence(
        "StmtEnd",
        vec![
            optional_whitespace(),
            alternative("LineEnd", vec![newline(), eof()]),
        ],
    )
}
