/// Daoyu - Dao Compiler and Interpreter CLI
use daoyu::compile::compile;
use daoyu::machine::{Machine, MachineConfig};
use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Extension of symbolic source files.
const SYMBOLIC_EXT: &str = "dao";
/// Extension of compiled packed-nybble streams.
const COMPILED_EXT: &str = "wuwei";

/// Default memory bound: 2^17 bits, the classic interpreter's limit.
const DEFAULT_MAX_DEPTH: u32 = 17;

fn print_usage() {
    eprintln!("Daoyu v{}", VERSION);
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    daoyu [OPTIONS] <INPUT>");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -h, --help           Print this help message");
    eprintln!("    -V, --version        Print version information");
    eprintln!("    -o, --output <FILE>  Write the compiled stream to FILE");
    eprintln!("    -c, --compile-only   Compile without running");
    eprintln!("    -f, --force          Run any file as a compiled stream");
    eprintln!("    -v, --verbose        Trace execution to stderr");
    eprintln!();
    eprintln!("ARGUMENTS:");
    eprintln!("    <INPUT>              A .dao source file or .wuwei compiled stream");
    eprintln!();
    eprintln!("EXAMPLES:");
    eprintln!("    daoyu hello.dao              Compile to hello.wuwei and run");
    eprintln!("    daoyu -c hello.dao           Compile only");
    eprintln!("    daoyu hello.wuwei            Run a compiled stream");
}

fn print_version() {
    println!("Daoyu {}", VERSION);
}

struct Options {
    input: Option<String>,
    output: Option<String>,
    compile_only: bool,
    force: bool,
    verbose: bool,
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = env::args().collect();

    let mut input = None;
    let mut output = None;
    let mut compile_only = false;
    let mut force = false;
    let mut verbose = false;
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            "-V" | "--version" => {
                print_version();
                process::exit(0);
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing output file after -o".to_string());
                }
                output = Some(args[i].clone());
            }
            "-c" | "--compile-only" => {
                compile_only = true;
            }
            "-f" | "--force" => {
                force = true;
            }
            "-v" | "--verbose" => {
                verbose = true;
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            arg => {
                if input.is_some() {
                    return Err("Multiple input files specified".to_string());
                }
                input = Some(arg.to_string());
            }
        }
        i += 1;
    }

    Ok(Options {
        input,
        output,
        compile_only,
        force,
        verbose,
    })
}

fn extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_string())
}

/// `hello.dao` compiles to `hello.wuwei` next to it.
fn compiled_path(input: &str) -> String {
    Path::new(input)
        .with_extension(COMPILED_EXT)
        .to_string_lossy()
        .to_string()
}

/// Compile a symbolic source file; returns the path of the written
/// stream.
fn compile_file(input: &str, options: &Options) -> Result<String, String> {
    let source = fs::read_to_string(input)
        .map_err(|e| format!("Failed to read file '{}': {}", input, e))?;
    let stream = compile(&source);

    let out_path = options
        .output
        .clone()
        .unwrap_or_else(|| compiled_path(input));
    fs::write(&out_path, &stream)
        .map_err(|e| format!("Failed to write output file '{}': {}", out_path, e))?;

    if options.verbose {
        eprintln!("Compiled {} bytes to {}", stream.len(), out_path);
    }
    Ok(out_path)
}

/// Load a packed stream and run it to completion.
fn run_file(input: &str, options: &Options) -> Result<(), String> {
    let bytes = fs::read(input).map_err(|e| format!("Failed to read file '{}': {}", input, e))?;

    let config = MachineConfig {
        trace: options.verbose,
        max_steps: None,
    };
    let mut machine = Machine::with_output(DEFAULT_MAX_DEPTH, config, io::stdout());
    machine
        .load(&bytes)
        .map_err(|e| format!("Failed to load '{}': {}", input, e))?;
    machine.run().map_err(|e| format!("Execution fault: {}", e))?;
    Ok(())
}

fn main() {
    let options = match parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    if options.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(io::stderr)
            .init();
    }

    let input = match options.input {
        Some(ref input) => input.clone(),
        None => {
            eprintln!("Error: Missing input file");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    let result = match extension(&input).as_deref() {
        Some(SYMBOLIC_EXT) => compile_file(&input, &options).and_then(|compiled| {
            if options.compile_only {
                Ok(())
            } else {
                run_file(&compiled, &options)
            }
        }),
        Some(COMPILED_EXT) => run_file(&input, &options),
        _ if options.force => run_file(&input, &options),
        _ => Err(format!(
            "Unrecognized extension for '{}' (expected .{} or .{}; use -f to force)",
            input, SYMBOLIC_EXT, COMPILED_EXT
        )),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
