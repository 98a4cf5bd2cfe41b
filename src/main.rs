//! Unibuild config compiler CLI
//!
//! Entry point for the `unibuild-config` command-line tool.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process;

use unibuild_config::{compile, CompileOptions};

#[derive(Parser)]
#[command(name = "unibuild-config")]
#[command(about = "Compile layered device config sources into build and runtime JSON", version)]
struct Cli {
    /// Path to the structural schema (JSON)
    #[arg(long, short = 's')]
    schema: Option<PathBuf>,

    /// Program-level config (YAML)
    #[arg(long, short = 'p')]
    program_config: PathBuf,

    /// Project-level config (YAML); repeat to layer several projects
    #[arg(long = "project-config", short = 'c')]
    project_configs: Vec<PathBuf>,

    /// Output path for the runtime configuration JSON
    #[arg(long, short = 'o')]
    output: PathBuf,

    /// Strip build-only elements from the runtime output
    #[arg(long, short = 'f')]
    filter: bool,

    /// Output path for the build configuration JSON (array of build records)
    #[arg(long, short = 'b')]
    build_output: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let options = CompileOptions {
        schema: cli.schema,
        program_config: cli.program_config,
        project_configs: cli.project_configs,
        filter_build_elements: cli.filter,
        emit_build_config: cli.build_output.is_some(),
    };

    // Compile fully before touching the filesystem: a failed run must
    // not leave partial artifacts behind.
    let output = match compile(&options) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = fs::write(&cli.output, &output.runtime_json) {
        eprintln!("Error writing {}: {}", cli.output.display(), e);
        process::exit(1);
    }

    if let (Some(path), Some(build_json)) = (&cli.build_output, &output.build_json) {
        if let Err(e) = fs::write(path, build_json) {
            eprintln!("Error writing {}: {}", path.display(), e);
            process::exit(1);
        }
    }
}
