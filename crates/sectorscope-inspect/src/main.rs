use std::path::{Path, PathBuf};
use std::process;

use sectorscope_inspect::config::{load_config, InspectConfig};
use sectorscope_inspect::report;
use sectorscope_inspect::runner::Inspector;

fn usage() {
    eprintln!("Usage: sectorscope [OPTIONS]");
    eprintln!("  --config <path>    Load inspector settings from a RON file");
    eprintln!("  --archive <path>   Archive file to open (default: DUKE3D.GRP)");
    eprintln!("  --level <name>     Level entry to inspect (default: E1L1.MAP)");
    eprintln!("  --output <path>    Write the report as JSON");
    eprintln!("  --show <path>      Print a saved JSON report and exit");
}

fn value(args: &[String], i: usize) -> &str {
    match args.get(i) {
        Some(v) => v,
        None => {
            eprintln!("Missing value for {}", args[i - 1]);
            usage();
            process::exit(1);
        }
    }
}

fn show(path: &Path) -> ! {
    match report::load_report(path) {
        Ok(saved) => {
            println!("{}", report::format_markdown(&saved));
            process::exit(0);
        }
        Err(e) => {
            log::error!("Failed to read {}: {e}", path.display());
            process::exit(1);
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut archive: Option<PathBuf> = None;
    let mut level: Option<String> = None;
    let mut output: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                config_path = Some(PathBuf::from(value(&args, i)));
            }
            "--archive" => {
                i += 1;
                archive = Some(PathBuf::from(value(&args, i)));
            }
            "--level" => {
                i += 1;
                level = Some(value(&args, i).to_string());
            }
            "--output" => {
                i += 1;
                output = Some(PathBuf::from(value(&args, i)));
            }
            "--show" => {
                i += 1;
                show(Path::new(value(&args, i)));
            }
            "--help" | "-h" => {
                usage();
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(path) => match load_config(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                process::exit(1);
            }
        },
        None => InspectConfig::default(),
    };
    if let Some(archive) = archive {
        config.archive = archive;
    }
    if let Some(level) = level {
        config.level = level;
    }
    if output.is_some() {
        config.output = output;
    }

    log::info!("Opening {}", config.archive.display());
    let result = Inspector::open(&config).and_then(|mut inspector| inspector.run(&config));
    let level_report = match result {
        Ok(report) => report,
        Err(e) => {
            log::error!("{e}");
            process::exit(1);
        }
    };

    println!("{}", report::format_markdown(&level_report));

    if let Some(ref path) = config.output {
        if let Err(e) = report::save_report(path, &level_report) {
            log::error!("Failed to save report to {}: {e}", path.display());
            process::exit(1);
        }
        log::info!("Saved report to {}", path.display());
    }
}
