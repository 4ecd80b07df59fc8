mod bytecode;
mod fault;
mod machine;
mod value;
mod vm;

use bytecode::{ConstantPool, Program};
use std::env;
use std::fs;
use std::process;
use vm::{Outcome, Report, Vm, VmConfig};

fn print_usage(program: &str) {
    eprintln!("hydro - stack-based bytecode virtual machine");
    eprintln!();
    eprintln!("Usage: {} [options] <file>", program);
    eprintln!("       {} [options] -e BYTECODE", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c TEXT      Constant pool tokens (default: empty)");
    eprintln!("  -e TEXT      Run inline bytecode instead of a file");
    eprintln!("  --cycles N   Cycle ceiling (default: {})", vm::DEFAULT_CYCLE_LIMIT);
    eprintln!("  --locals N   Local variable slots (default: {})", vm::DEFAULT_MAX_LOCALS);
    eprintln!("  --trace      Log every executed instruction");
    eprintln!("  -h, --help   Show this help");
}

fn init_tracing(trace: bool) {
    let level = if trace {
        tracing::Level::TRACE
    } else {
        tracing::Level::WARN
    };
    let _ = tracing_subscriber::fmt()
        .without_time()
        .with_target(false)
        .with_max_level(level)
        .try_init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        process::exit(1);
    }

    let mut constants_text = String::new();
    let mut inline_bytecode: Option<String> = None;
    let mut input_file: Option<String> = None;
    let mut config = VmConfig::default();
    let mut trace = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-c" => {
                i += 1;
                if i < args.len() {
                    constants_text = args[i].clone();
                } else {
                    eprintln!("Error: -c requires constant pool text");
                    process::exit(1);
                }
            }
            "-e" => {
                i += 1;
                if i < args.len() {
                    inline_bytecode = Some(args[i].clone());
                } else {
                    eprintln!("Error: -e requires bytecode text");
                    process::exit(1);
                }
            }
            "--cycles" => {
                i += 1;
                match args.get(i).and_then(|n| n.parse().ok()) {
                    Some(n) => config.cycle_limit = n,
                    None => {
                        eprintln!("Error: --cycles requires a number");
                        process::exit(1);
                    }
                }
            }
            "--locals" => {
                i += 1;
                match args.get(i).and_then(|n| n.parse().ok()) {
                    Some(n) => config.max_locals = n,
                    None => {
                        eprintln!("Error: --locals requires a number");
                        process::exit(1);
                    }
                }
            }
            "--trace" => trace = true,
            "-h" | "--help" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            arg if arg.starts_with('-') => {
                eprintln!("Unknown option: {}", arg);
                process::exit(1);
            }
            _ => {
                if input_file.is_none() {
                    input_file = Some(args[i].clone());
                } else {
                    eprintln!("Multiple input files not supported");
                    process::exit(1);
                }
            }
        }
        i += 1;
    }

    init_tracing(trace);

    let bytecode_text = match (inline_bytecode, input_file) {
        (Some(text), None) => text,
        (None, Some(path)) => match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error reading {}: {}", path, e);
                process::exit(1);
            }
        },
        (Some(_), Some(_)) => {
            eprintln!("Error: both -e and an input file given");
            process::exit(1);
        }
        (None, None) => {
            eprintln!("Error: no bytecode specified");
            process::exit(1);
        }
    };

    let constants = ConstantPool::parse(&constants_text);
    let program = Program::parse(&bytecode_text);
    let report = Vm::with_config(constants.clone(), program, config).run();

    print_report(&constants, &bytecode_text, &report);

    if let Outcome::Faulted(fault) = &report.outcome {
        eprintln!("Fault: {}", fault);
        process::exit(1);
    }
}

fn print_report(constants: &ConstantPool, bytecode_text: &str, report: &Report) {
    let rendered_constants: Vec<String> =
        constants.values().iter().map(|v| v.to_string()).collect();
    let rendered_stack: Vec<String> = report.stack.iter().map(|v| v.to_string()).collect();
    let bytecode: Vec<&str> = bytecode_text.split_whitespace().collect();

    println!("constants: {}", rendered_constants.join(", "));
    println!("bytecode: {}", bytecode.join(" "));
    println!("--- Output ----------------------------------------------------------");
    for line in &report.output {
        println!("{}", line);
    }
    println!("---------------------------------------------------------------------");
    println!("Finished in {} cycles", report.cycles);
    println!("End stack: {}", rendered_stack.join(" "));
    println!("Stack depth: {}", report.stack_depth());
    println!("PC: {}", report.pc);
    println!(
        "State: {}",
        match &report.outcome {
            Outcome::HaltedByReturn => "halted (return)".to_string(),
            Outcome::HaltedByCycleLimit => "halted (cycle limit)".to_string(),
            Outcome::Faulted(fault) => format!("faulted ({})", fault),
        }
    );
}
