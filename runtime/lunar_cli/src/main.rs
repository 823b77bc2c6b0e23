//! Lunar CLI
//!
//! Runs or syntax-checks script files with the standard libraries loaded.

mod tracing_setup;

use std::process::ExitCode;

use lunar_eval::{Cancellation, Engine, Value, Values};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_setup::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let command = &args[1];
    match command.as_str() {
        "run" => {
            let Some(path) = args.get(2) else {
                eprintln!("Usage: lunar run <file.lua> [args...]");
                return ExitCode::FAILURE;
            };
            run_file(path, &args[3..]).await
        }
        "check" => {
            let Some(path) = args.get(2) else {
                eprintln!("Usage: lunar check <file.lua>");
                return ExitCode::FAILURE;
            };
            check_file(path)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-v" => {
            println!("Lunar {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            if std::path::Path::new(command)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("lua"))
            {
                run_file(command, &args[2..]).await
            } else {
                eprintln!("Unknown command: {command}");
                eprintln!();
                print_usage();
                ExitCode::FAILURE
            }
        }
    }
}

fn read_source(path: &str) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(source) => Some(source),
        Err(err) => {
            eprintln!("error: cannot read '{path}': {err}");
            None
        }
    }
}

/// Execute `path`, passing `script_args` as the chunk's varargs. Ctrl-C
/// cancels the running script.
async fn run_file(path: &str, script_args: &[String]) -> ExitCode {
    let Some(source) = read_source(path) else {
        return ExitCode::FAILURE;
    };

    let engine = Engine::new();
    let cancellation = Cancellation::new();
    let on_interrupt = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted");
            on_interrupt.cancel();
        }
    });

    let args: Values = script_args.iter().map(|a| Value::from(a.as_str())).collect();
    match engine.execute_with(&source, args, cancellation.clone()).await {
        Ok(results) => {
            if cancellation.is_cancelled() {
                eprintln!("interrupted");
                return ExitCode::from(130);
            }
            if !results.is_empty() {
                let line: Vec<String> = results.iter().map(|v| v.as_string().to_string()).collect();
                println!("{}", line.join("\t"));
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn check_file(path: &str) -> ExitCode {
    let Some(source) = read_source(path) else {
        return ExitCode::FAILURE;
    };
    let engine = Engine::builder().standard_libraries(false).build();
    match engine.parse(&source) {
        Ok(_) => {
            println!("{path}: ok");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {path}: {err}");
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    println!("Lunar - embeddable Lua runtime");
    println!();
    println!("Usage: lunar <command> [options]");
    println!();
    println!("Commands:");
    println!("  run <file.lua> [args...]  Run a script; args become its '...'");
    println!("  check <file.lua>          Parse a file without running it");
    println!("  help                      Show this help message");
    println!("  version                   Show version information");
    println!();
    println!("Environment:");
    println!("  LUNAR_LOG=<filter>        Log filter, default warn (e.g. lunar_eval=debug)");
    println!("  LUNAR_LOG_TREE=1          Render spans as an indented tree");
    println!();
    println!("Examples:");
    println!("  lunar run main.lua");
    println!("  lunar main.lua one two    # '...' is 'one', 'two'");
    println!("  lunar check lib.lua");
}
