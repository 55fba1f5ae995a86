//! Fern CLI: execute files, evaluate snippets, or run the REPL.

use std::env;
use std::fs;
use std::process;

use fernlang::bytecode::VM;
use fernlang::error::FernError;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI command to execute.
enum Command {
    /// Start the REPL
    Repl,
    /// Run a script file
    Run { file: String },
    /// Evaluate a string and print the result
    Eval { code: String },
}

struct Options {
    command: Command,
    disassemble: bool,
}

fn print_usage() {
    eprintln!("Fern {} - a small scripting language", VERSION);
    eprintln!();
    eprintln!("Usage: fern [options] [script.fern]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -e <code>        Evaluate code and print the result");
    eprintln!("  --disassemble    Print the compiled bytecode before running");
    eprintln!("  --help, -h       Show this help message");
    eprintln!();
    eprintln!("With no arguments, fern starts the interactive prompt.");
}

fn parse_args() -> Options {
    let mut args = env::args().skip(1);
    let mut file = None;
    let mut code = None;
    let mut disassemble = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            "--disassemble" => disassemble = true,
            "-e" => match args.next() {
                Some(snippet) => code = Some(snippet),
                None => {
                    eprintln!("-e requires an argument");
                    process::exit(2);
                }
            },
            _ if arg.starts_with('-') => {
                eprintln!("Unknown option: {}", arg);
                print_usage();
                process::exit(2);
            }
            _ => file = Some(arg),
        }
    }

    let command = match (code, file) {
        (Some(code), _) => Command::Eval { code },
        (None, Some(file)) => Command::Run { file },
        (None, None) => Command::Repl,
    };

    Options {
        command,
        disassemble,
    }
}

fn main() {
    let options = parse_args();

    match options.command {
        Command::Repl => {
            println!("Fern {}", VERSION);
            println!("Type Ctrl-D to exit.");
            fernlang::repl::start();
        }
        Command::Run { file } => {
            let source = match fs::read_to_string(&file) {
                Ok(source) => source,
                Err(err) => {
                    eprintln!("Could not read {}: {}", file, err);
                    process::exit(1);
                }
            };
            if let Err(err) = run_source(&source, options.disassemble, false) {
                report(err);
                process::exit(1);
            }
        }
        Command::Eval { code } => {
            if let Err(err) = run_source(&code, options.disassemble, true) {
                report(err);
                process::exit(1);
            }
        }
    }
}

fn run_source(source: &str, disassemble: bool, print_result: bool) -> Result<(), FernError> {
    let bytecode = fernlang::compile(source)?;

    if disassemble {
        print!("{}", fernlang::disassemble(&bytecode));
        println!("---");
    }

    let mut vm = VM::new(bytecode);
    vm.run()?;

    if print_result {
        println!("{}", vm.last_popped());
    }

    Ok(())
}

fn report(err: FernError) {
    match err {
        FernError::Parser(errors) => {
            for error in errors {
                eprintln!("{}", error);
            }
        }
        FernError::Compile(error) => eprintln!("Whoops! Compilation failed: {}", error),
        FernError::Runtime(error) => eprintln!("Whoops! Executing bytecode failed: {}", error),
        FernError::Io(error) => eprintln!("{}", error),
    }
}
