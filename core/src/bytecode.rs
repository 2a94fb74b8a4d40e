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

//! The vmlang instruction set.
//!
//! Every opcode occupies one memory word; `push`, `goto` and `jnz` are
//! followed by one inline operand word.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown mnemonic: {0}")]
pub struct UnknownMnemonic(pub String);

#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bytecode {
    // Stack Manipulation
    #[serde(rename = "push")]
    Push = 1,
    #[serde(rename = "pop")]
    Pop,
    #[serde(rename = "incr")]
    Increment,
    #[serde(rename = "decr")]
    Decrement,
    #[serde(rename = "dupl")]
    Duplicate,

    // Memory
    #[serde(rename = "rmem")]
    ReadMemory,
    #[serde(rename = "wmem")]
    WriteMemory,

    // System
    #[serde(rename = "outb")]
    OutputByte,

    // Control Flow
    #[serde(rename = "goto")]
    Goto,
    #[serde(rename = "jnz")]
    JumpNotZero,

    // Functions (reserved)
    #[serde(rename = "call")]
    Call,
    #[serde(rename = "rtn")]
    Return,

    #[serde(rename = "exit")]
    Exit,

    // Arithmetic
    #[serde(rename = "mult")]
    Multiply,
}

impl Bytecode {
    /// Every opcode in encoding order. The parser tries mnemonics in this order.
    pub const ALL: [Bytecode; 14] = [
        Bytecode::Push,
        Bytecode::Pop,
        Bytecode::Increment,
        Bytecode::Decrement,
        Bytecode::Duplicate,
        Bytecode::ReadMemory,
        Bytecode::WriteMemory,
        Bytecode::OutputByte,
        Bytecode::Goto,
        Bytecode::JumpNotZero,
        Bytecode::Call,
        Bytecode::Return,
        Bytecode::Exit,
        Bytecode::Multiply,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            Bytecode::Push => "push",
            Bytecode::Pop => "pop",
            Bytecode::Increment => "incr",
            Bytecode::Decrement => "decr",
            Bytecode::Duplicate => "dupl",
            Bytecode::ReadMemory => "rmem",
            Bytecode::WriteMemory => "wmem",
            Bytecode::OutputByte => "outb",
            Bytecode::Goto => "goto",
            Bytecode::JumpNotZero => "jnz",
            Bytecode::Call => "call",
            Bytecode::Return => "rtn",
            Bytecode::Exit => "exit",
            Bytecode::Multiply => "mult",
        }
    }

    /// Number of inline operand words the VM reads after the opcode.
    pub fn operand_count(self) -> u64 {
        match self {
            Bytecode::Push | Bytecode::Goto | Bytecode::JumpNotZero => 1,
            Bytecode::Pop
            | Bytecode::Increment
            | Bytecode::Decrement
            | Bytecode::Duplicate
            | Bytecode::ReadMemory
            | Bytecode::WriteMemory
            | Bytecode::OutputByte
            | Bytecode::Call
            | Bytecode::Return
            | Bytecode::Exit
            | Bytecode::Multiply => 0,
        }
    }

    pub fn word(self) -> u64 {
        self as u64
    }

    pub fn from_word(word: u64) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.word() == word)
    }
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for Bytecode {
    type Err = UnknownMnemonic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic() == s)
            .ok_or_else(|| UnknownMnemonic(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_are_dense_from_one() {
        for (i, op) in Bytecode::ALL.iter().enumerate() {
            assert_eq!(op.word(), i as u64 + 1);
            assert_eq!(Bytecode::from_word(op.word()), Some(*op));
        }
        assert_eq!(Bytecode::from_word(0), None);
        assert_eq!(Bytecode::from_word(15), None);
    }

    #[test]
    fn test_mnemonic_round_trip() {
        for op in Bytecode::ALL {
            assert_eq!(op.mnemonic().parse::<Bytecode>(), Ok(op));
        }
        assert_eq!(
            "jump".parse::<Bytecode>(),
            Err(UnknownMnemonic("jump".to_string()))
        );
    }

    #[test]
    fn test_no_mnemonic_is_prefix_of_another() {
        // The parser's ordered alternation would otherwise shadow the longer one.
        for a in Bytecode::ALL {
            for b in Bytecode::ALL {
                if a != b {
                    assert!(!b.mnemonic().starts_with(a.mnemonic()), "{} / {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_serde_uses_mnemonics() {
        let json = serde_json::to_string(&Bytecode::JumpNotZero).unwrap();
        assert_eq!(json, "\"jnz\"");
        let op: Bytecode = serde_json::from_str("\"mult\"").unwrap();
        assert_eq!(op, Bytecode::Multiply);
    }
}
