use std::{path::PathBuf, process::ExitCode};

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "apng2webp", version, about = "Convert an animated PNG into an animated WebP")]
struct Cli {
    /// Input APNG path.
    input: PathBuf,

    /// Output WebP path.
    output: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Argument errors (and --help/--version) go through clap's own
            // printer; anything that is not a clean exit maps to code 1.
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match apng2webp::convert_file(&cli.input, &cli.output) {
        Ok(()) => {
            println!(
                "Converted {} to {}",
                cli.input.display(),
                cli.output.display()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}
