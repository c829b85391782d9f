use std::fs::File;
use std::io::{self, BufReader, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use anyhow::Context;
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use png_stego::cli::{self, Mode};
use png_stego::{Extraction, StegoConfig, extract, inject, scan_chunks};

/// Exit status when the image carries no payload
const EXIT_NO_PAYLOAD: u8 = 2;

#[derive(Parser)]
#[command(name = "png-stego")]
#[command(about = "Hide a payload in a PNG chunk after IEND, or read it back")]
struct Cli {
    /// Path to the PNG image
    image: PathBuf,

    /// File to hide inside the image; omit to extract instead
    payload: Option<PathBuf>,

    /// Where the injected image is written
    #[arg(short, long, default_value = cli::DEFAULT_OUTPUT)]
    output: PathBuf,

    /// XOR key for the payload bytes (decimal or 0x-prefixed hex)
    #[arg(long, default_value = "0xAF", value_parser = cli::parse_key)]
    key: u8,

    /// List the image's chunks instead of extracting
    #[arg(long, conflicts_with = "payload")]
    list: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Logs go to stderr; stdout is reserved for extracted payload bytes.
/// `RUST_LOG` overrides the level picked from `-v`.
fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn open(path: &Path) -> anyhow::Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("could not open {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn run(args: Cli) -> anyhow::Result<ExitCode> {
    let config = StegoConfig { key: args.key, ..StegoConfig::default() };

    match Mode::from_inputs(args.image, args.payload, args.output, args.list) {
        Mode::Inject { image, payload, output } => {
            let mut image_file = open(&image)?;
            let mut payload_file = open(&payload)?;

            let report = cli::write_atomically(&output, |out| {
                inject(&mut image_file, &mut payload_file, out, &config)
            })
            .with_context(|| format!("could not inject {} into {}", payload.display(), image.display()))?;

            println!(
                "Hid {} bytes in {} ({} chunks copied)",
                report.payload_len,
                output.display(),
                report.chunks_copied
            );
        }

        Mode::Extract { image } => {
            let mut image_file = open(&image)?;
            let extraction = extract(&mut image_file, &config)
                .with_context(|| format!("could not read {}", image.display()))?;

            match extraction {
                Extraction::Payload(data) => {
                    let mut stdout = io::stdout().lock();
                    stdout.write_all(&data)?;
                    if stdout.is_terminal() && !data.ends_with(b"\n") {
                        stdout.write_all(b"\n")?;
                    }
                    stdout.flush()?;
                }
                Extraction::NoPayloadPresent => {
                    eprintln!("No hidden data in this image");
                    return Ok(ExitCode::from(EXIT_NO_PAYLOAD));
                }
            }
        }

        Mode::List { image } => {
            let mut image_file = open(&image)?;
            let chunks = scan_chunks(&mut image_file)
                .with_context(|| format!("could not read {}", image.display()))?;

            println!("{:>4}  {:<4}  {:>10}  {:<8}", "#", "type", "length", "crc");
            for (i, chunk) in chunks.iter().enumerate() {
                println!(
                    "{:>4}  {:<4}  {:>10}  {:08x}{}",
                    i,
                    chunk.chunk_type,
                    chunk.length,
                    chunk.crc,
                    if chunk.crc_valid { "" } else { "  (CRC mismatch)" }
                );
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let args = Cli::parse();
    init_logger(args.verbose);

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
