use stack_eval::batch::evaluate_all;
use stack_eval::config::Config;
use stack_eval::vm::listing;
use std::path::Path;
use std::process;

/// Resolves the run to perform from the command line.
///
/// # Returns
/// * `Ok(Config)` - the run file's contents, or the built-in samples when no file is given
/// * `Err(String)` - message describing why the run file could not be used
fn load_run(path: Option<&str>) -> Result<Config, String> {
    let config = match path {
        Some(path) => {
            log::info!("Loading run file '{}'...", path);
            Config::load(Path::new(path)).map_err(|e| e.to_string())?
        }
        None => {
            log::info!("No run file given, evaluating the built-in samples.");
            Config::samples()
        }
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn main() {
    env_logger::init();

    let mut show_listing = false;
    let mut run_file = None;
    for arg in std::env::args().skip(1) {
        if arg == "--list" {
            show_listing = true;
        } else if run_file.is_none() {
            run_file = Some(arg);
        } else {
            log::error!("Unexpected argument '{}'", arg);
            eprintln!("usage: stack-eval [RUN_FILE] [--list]");
            process::exit(2);
        }
    }

    let config = match load_run(run_file.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };
    log::info!(
        "Running {} programs with stack capacity {}.",
        config.programs.len(),
        config.stack_capacity
    );

    let codes: Vec<&[i64]> = config.programs.iter().map(|p| p.code.as_slice()).collect();
    let results = evaluate_all(&codes, config.stack_capacity);

    let mut failures = 0;
    for (program, result) in config.programs.iter().zip(results) {
        if show_listing {
            match listing(&program.code) {
                Ok(text) => print!("{}", text),
                Err(e) => println!("  <undecodable: {}>", e),
            }
        }
        match result {
            Ok(value) => println!("{}: {}", program.name, value),
            Err(e) => {
                failures += 1;
                log::error!("'{}' failed: {}", program.name, e);
                println!("{}: error: {}", program.name, e);
            }
        }
    }

    if failures > 0 {
        log::error!("{} of {} programs failed.", failures, config.programs.len());
        process::exit(1);
    }
}
