use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use repair_rs::{archive, repair, Error};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

#[derive(Parser, Debug)]
#[command(
    name = "rp",
    version,
    about = "Compressor and decompressor based on the Re-Pair grammar"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Print progress information (-vv for per-phase detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress a file into a .rp archive
    Compress {
        input: PathBuf,
        /// Defaults to <input>.rp
        output: Option<PathBuf>,
    },
    /// Expand a .rp archive back to the original file
    Decompress {
        input: PathBuf,
        /// Defaults to <input> without .rp, or <input>.decompressed
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = TermLogger::init(
        filter,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("rp: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Error> {
    match command {
        Command::Compress { input, output } => {
            let output = output.unwrap_or_else(|| compressed_name(&input));
            let data = fs::read(&input)?;
            let grammar = repair(&data)?;

            let stats = grammar.stats();
            info!(
                "{}: {} rules, {} sequence symbols, ratio {:.1}%",
                input.display(),
                stats.rules,
                stats.sequence_len,
                stats.compression_ratio(data.len())
            );

            let bytes = archive::write_archive(&grammar);
            info!(
                "{}: {} bytes in, {} bytes out",
                output.display(),
                data.len(),
                bytes.len()
            );
            fs::write(&output, bytes)?;
        }
        Command::Decompress { input, output } => {
            let output = output.unwrap_or_else(|| decompressed_name(&input));
            let data = fs::read(&input)?;
            let grammar = archive::read_archive(&data)?;
            let expanded = grammar.expand();
            info!(
                "{}: {} bytes in, {} bytes out",
                output.display(),
                data.len(),
                expanded.len()
            );
            fs::write(&output, expanded)?;
        }
    }
    Ok(())
}

fn compressed_name(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".rp");
    PathBuf::from(name)
}

fn decompressed_name(input: &Path) -> PathBuf {
    if input.extension().is_some_and(|e| e == "rp") {
        input.with_extension("")
    } else {
        let mut name = input.as_os_str().to_owned();
        name.push(".decompressed");
        PathBuf::from(name)
    }
}
