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

pub mod assembler;
pub mod ast;
pub mod builder;
pub mod bytecode;
pub mod combinator;
pub mod config;
pub mod loader;
pub mod parser;
pub mod persistent;
pub mod runtime;
pub mod vm;

pub use assembler::{assemble, AssemblyError};
pub use ast::Program;
pub use config::AssemblerConfig;
pub use parser::{parse_source, ParseError};
pub use runtime::RuntimeError;
pub use vm::VirtualMachine;

use std::io::Write;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Load(#[from] loader::LoadError),
}

/// Parse, assemble and execute `source`, writing program output to `sink`.
///
/// Returns the halted machine so callers can inspect memory and the stack.
pub fn run_source<W: Write + ?Sized>(
    source: &str,
    config: &AssemblerConfig,
    sink: &mut W,
) -> Result<VirtualMachine, Error> {
    let program = parse_source(source)?;
    let mut vm = assemble(&program, config)?;
    vm.execute(sink)?;
    Ok(vm)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACTORIAL: &str = "\
var acc
push 4
push acc
wmem
fac:
  decr
  jnz body
  goto output
body:
  dupl
  push acc
  rmem
  mult
  push acc
  wmem
  pop
  goto fac
output:
  push acc
  rmem
  outb
";

    fn small() -> AssemblerConfig {
        AssemblerConfig::default()
            .with_stack_size(64)
            .with_gap_size(8)
    }

    fn output_of(source: &str) -> Vec<u8> {
        let mut out: Vec<u8> = Vec::new();
        run_source(source, &small(), &mut out).unwrap();
        out
    }

    #[test]
    fn test_factorial() {
        let mut out: Vec<u8> = Vec::new();
        let vm = run_source(FACTORIAL, &AssemblerConfig::default(), &mut out).unwrap();
        assert_eq!(out, vec![24]);
        assert_eq!(vm.heap()[0], 24);
    }

    #[test]
    fn test_pushed_bytes_come_out_in_order() {
        let bytes = [72u8, 101, 108, 108, 111, 0, 255];
        let mut source = String::new();
        for b in bytes {
            source.push_str(&format!("push {}\noutb\n", b));
        }
        source.push_str("exit\n");
        assert_eq!(output_of(&source), bytes.to_vec());
    }

    #[test]
    fn test_output_is_low_byte() {
        assert_eq!(output_of("push 258\noutb"), vec![2]);
    }

    #[test]
    fn test_heap_growth() {
        let mut out: Vec<u8> = Vec::new();
        let vm = run_source(
            "push 64\npush 2048\nwmem\npop\npush 2048\nrmem\noutb\nexit\n",
            &small(),
            &mut out,
        )
        .unwrap();
        assert_eq!(out, vec![64]);
        assert!(vm.memory().len() >= 2049);
    }

    #[test]
    fn test_stack_overflow() {
        let config = small().with_stack_size(4);
        let result = run_source("top:\npush 1\ngoto top\n", &config, &mut std::io::sink());
        assert!(matches!(
            result,
            Err(Error::Runtime(RuntimeError::StackOverflow { .. }))
        ));
    }

    #[test]
    fn test_goto_requires_label() {
        let result = run_source("push 4\ngoto label\n", &small(), &mut std::io::sink());
        match result {
            Err(Error::Assembly(AssemblyError::UndefinedSymbol(name))) => {
                assert_eq!(name, "label")
            }
            other => panic!("Expected UndefinedSymbol, got {:?}", other.map(|_| ())),
        }
        assert!(run_source("push 4\nlabel:\ngoto done\ndone:\n", &small(), &mut std::io::sink()).is_ok());
    }

    #[test]
    fn test_forward_variable_declaration() {
        let config = small();
        let early = assemble(&parse_source("var TestVar\nwmem TestVar").unwrap(), &config).unwrap();
        let late = assemble(&parse_source("wmem TestVar\nvar TestVar").unwrap(), &config).unwrap();
        assert_eq!(early.memory(), late.memory());
        assert_eq!(early.memory()[1], early.layout().heap_start);
    }

    #[test]
    fn test_duplicate_symbols() {
        for source in ["var X\nvar X", "var X\nX:", "var X X"] {
            let result = run_source(source, &small(), &mut std::io::sink());
            assert!(
                matches!(result, Err(Error::Assembly(AssemblyError::DuplicateSymbol(_)))),
                "{}",
                source
            );
        }
    }

    #[test]
    fn test_parse_error_surfaces() {
        let err = run_source("push 4 !", &small(), &mut std::io::sink()).unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::Syntax { line: 1, col: 8, .. })));
    }

    #[test]
    fn test_call_is_not_implemented() {
        let err = run_source("call\n", &small(), &mut std::io::sink()).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"call is not implemented (ip 0)");
    }

    #[test]
    fn test_rendered_program_reassembles() {
        let program = parse_source(FACTORIAL).unwrap();
        let reparsed = parse_source(&program.to_string()).unwrap();
        assert_eq!(reparsed, program);
        let a = assemble(&program, &small()).unwrap();
        let b = assemble(&reparsed, &small()).unwrap();
        assert_eq!(a.memory(), b.memory());
    }

    #[test]
    fn test_json_program_runs() {
        let json = serde_json::to_string(&parse_source(FACTORIAL).unwrap()).unwrap();
        let program = loader::load_program_json(&json).unwrap();
        let mut vm = assemble(&program, &small()).unwrap();
        let mut out: Vec<u8> = Vec::new();
        vm.execute(&mut out).unwrap();
        assert_eq!(out, vec![24]);
    }
}
