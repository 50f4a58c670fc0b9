#[macro_use]
extern crate clap;

use clap::Arg;
use rvcpu::{RunOutcome, StepOutcome};
use rvsim::Simulator;
use std::io::{self, BufRead, Write};

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("FILE")
                .help("Source file to load at startup")
                .index(1),
        )
        .get_matches();

    let mut simulator = Simulator::new();
    if let Some(file) = matches.value_of("FILE") {
        load(&mut simulator, file);
    }

    let stdin = io::stdin();
    loop {
        print!("simulator> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        if !dispatch(&mut simulator, line.trim()) {
            break;
        }
    }

    println!("Exited the simulator");
}

/// Integer command arguments accept the same bases as the assembler.
fn parse_number(token: &str) -> Option<i64> {
    let (radix, digits) = if token.starts_with("0x") || token.starts_with("0X") {
        (16, &token[2..])
    } else if token.len() > 1 && token.starts_with('0') {
        (8, &token[1..])
    } else {
        (10, token)
    };
    i64::from_str_radix(digits, radix).ok()
}

fn load(simulator: &mut Simulator, file: &str) {
    match simulator.load(file) {
        Ok(summary) => {
            for warning in &summary.warnings {
                eprintln!("{}", warning);
            }
            println!(
                "Loaded {} ({} instructions, {} data bytes)",
                file, summary.instructions, summary.data_bytes
            );
        }
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("Input file was not loaded");
        }
    }
}

fn step(simulator: &mut Simulator) {
    if simulator.machine().map_or(false, |m| m.finished()) {
        println!("Nothing to step");
        return;
    }
    match simulator.step() {
        Ok(StepOutcome::Executed { index, .. }) => {
            let machine = simulator.machine().unwrap();
            let text = machine
                .program()
                .entry(index)
                .map(|entry| entry.text.as_str())
                .unwrap_or("");
            println!("Executed {}; PC=0x{:08X}", text, machine.pc());
        }
        Ok(StepOutcome::Breakpoint { .. }) => println!("Execution stopped at breakpoint"),
        Ok(StepOutcome::Finished) => println!("Nothing to step"),
        Err(err) => println!("{}", err),
    }
}

fn run(simulator: &mut Simulator) {
    if simulator.machine().map_or(false, |m| m.finished()) {
        println!("Reached end of program. Load the file again to re-run.");
        return;
    }
    match simulator.run() {
        Ok(RunOutcome::Halted { steps }) => println!("Executed {} instructions", steps),
        Ok(RunOutcome::Breakpoint { file_line, steps }) => println!(
            "Execution stopped at breakpoint on line {} after {} instructions",
            file_line, steps
        ),
        Ok(RunOutcome::Timeout { .. }) => println!("Timeout! Enter run again."),
        Err(err) => println!("{}", err),
    }
}

fn show_stack(simulator: &Simulator) {
    match simulator.call_stack() {
        Ok(frames) => {
            if frames.is_empty() {
                println!("Empty Call Stack: Execution complete");
            } else {
                println!("Call Stack:");
                for frame in frames {
                    println!("{}:{}", frame.function, frame.line);
                }
            }
        }
        Err(err) => println!("{}", err),
    }
}

fn cache_command(simulator: &mut Simulator, tokens: &[&str]) {
    match tokens.first() {
        None => println!("Please specify a command."),
        Some(&"enable") => match tokens.get(1) {
            Some(config) => match simulator.cache_enable(config) {
                Ok(()) => println!("Cache enabled."),
                Err(err) => println!("{}", err),
            },
            None => println!("No config file provided."),
        },
        Some(&"disable") => {
            simulator.cache_disable();
            println!("Cache disabled.");
        }
        Some(&"status") => match simulator.cache() {
            Some(cache) => println!("{}", cache.config()),
            None => println!("Cache disabled"),
        },
        Some(&"invalidate") => {
            if !simulator.cache_invalidate() {
                println!("Cache disabled.");
            }
        }
        Some(&"dump") => match tokens.get(1) {
            Some(file) => match simulator.cache_dump(file) {
                Ok(true) => println!("Cache contents written to {}", file),
                Ok(false) => println!("Cache disabled."),
                Err(err) => println!("Writing cache dump failed: {}", err),
            },
            None => println!("No output location provided."),
        },
        Some(&"stats") => match simulator.cache_stats() {
            Some(stats) => println!(
                "D-cache statistics: Accesses={}, Hit={}, Miss={}, Hit Rate={:.2}",
                stats.accesses,
                stats.hits,
                stats.misses,
                stats.hit_rate()
            ),
            None => println!("Cache disabled."),
        },
        Some(other) => println!("Unknown command \"{}\".", other),
    }
}

fn dispatch(simulator: &mut Simulator, line: &str) -> bool {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let command = match tokens.first() {
        Some(command) => *command,
        None => return true,
    };

    match command {
        "exit" => return false,
        "load" => match tokens.get(1) {
            Some(file) => load(simulator, file),
            None => println!("No file specified."),
        },
        "step" => step(simulator),
        "run" => run(simulator),
        "break" => match tokens.get(1).and_then(|t| parse_number(t)) {
            Some(file_line) => match simulator.set_breakpoint(file_line as u32) {
                Ok(()) => println!("Breakpoint set at line {}", file_line),
                Err(err) => println!("{}", err),
            },
            None => println!("Specify a line number."),
        },
        "del" => match (tokens.get(1), tokens.get(2).and_then(|t| parse_number(t))) {
            (Some(&"break"), Some(file_line)) => {
                match simulator.clear_breakpoint(file_line as u32) {
                    Ok(()) => println!("Break point removed from line {}.", file_line),
                    Err(err) => println!("{}", err),
                }
            }
            _ => println!("Did you mean 'del break <line>'?"),
        },
        "regs" => {
            println!("Registers:");
            for (i, value) in simulator.registers().iter().enumerate() {
                println!("x{:<2} = 0x{:X}", i, *value as u64);
            }
        }
        "mem" => {
            let address = tokens.get(1).and_then(|t| parse_number(t));
            let count = tokens.get(2).and_then(|t| parse_number(t));
            match (address, count) {
                (Some(address), Some(count)) => {
                    let bytes = simulator.read_memory(address as u32, count as u32);
                    for (i, byte) in bytes.iter().enumerate() {
                        println!("Memory[0x{:X}] = 0x{:X}", address as u32 + i as u32, byte);
                    }
                }
                _ => println!("Provide a memory address and a byte count."),
            }
        }
        "show-stack" => show_stack(simulator),
        "cache_sim" => cache_command(simulator, &tokens[1..]),
        _ => println!("Unknown command \"{}\".", command),
    }

    true
}
