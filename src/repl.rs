//! Interactive prompt: read, compile, run, print.

use std::rc::Rc;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::bytecode::value::null_value;
use crate::bytecode::vm::GLOBALS_SIZE;
use crate::bytecode::{Compiler, SymbolTable, Value, VM};
use crate::lexer::Scanner;
use crate::parser::Parser;

const PROMPT: &str = ">> ";

/// Run the prompt until end of input. Global bindings, the constants
/// pool, and the symbol table persist across lines.
pub fn start() {
    let mut rl = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("Could not initialise line editor: {}", err);
            return;
        }
    };

    let mut symbols = SymbolTable::new();
    let mut constants: Vec<Rc<Value>> = Vec::new();
    let mut globals: Vec<Rc<Value>> = vec![null_value(); GLOBALS_SIZE];

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());

                let tokens = Scanner::new(&line).scan_tokens();
                let program = match Parser::new(tokens).parse() {
                    Ok(program) => program,
                    Err(errors) => {
                        println!("Whoops! Parsing failed:");
                        for err in errors {
                            println!("\t{}", err);
                        }
                        continue;
                    }
                };

                let mut compiler = Compiler::with_state(symbols, constants);
                let compiled = compiler.compile(&program);
                let bytecode = compiler.bytecode();
                (symbols, constants) = compiler.into_state();

                if let Err(err) = compiled {
                    println!("Whoops! Compilation failed: {}", err);
                    continue;
                }

                let mut machine = VM::with_globals(bytecode, globals);
                let result = machine.run();
                let last_popped = machine.last_popped();
                globals = machine.into_globals();

                match result {
                    Ok(()) => println!("{}", last_popped),
                    Err(err) => println!("Whoops! Executing bytecode failed: {}", err),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {}", err);
                break;
            }
        }
    }
}
