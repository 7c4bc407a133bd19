use anyhow::{Context, Result, bail};
use bootimg_patch::ramdisk::PatchPair;
use bootimg_patch::report::LogReporter;
use bootimg_patch::{PatchError, PatchOptions, patch_file};
use clap::Parser;
use log::{Level, LevelFilter, Log, Metadata, Record, error, info};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    version,
    about = "Modifies a Nexus 5X boot or recovery image to disable big cores."
)]
struct Cli {
    /// input file
    input: PathBuf,
    /// output file
    output: PathBuf,
    /// disable encryption and verified boot
    #[arg(long)]
    disable_encryption: bool,
    /// extra ramdisk replacement, both strings must have the same length
    #[arg(long, num_args = 2, value_names = ["SEARCH", "REPLACE"])]
    replace: Vec<String>,
    /// print section layout and other debug output
    #[arg(short, long)]
    verbose: bool,
}

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Info => println!("{}", record.args()),
            Level::Error => eprintln!("error: {}", record.args()),
            Level::Warn => eprintln!("warning: {}", record.args()),
            Level::Debug | Level::Trace => eprintln!("debug: {}", record.args()),
        }
    }

    fn flush(&self) {}
}

fn init_logger(verbose: bool) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        });
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<PatchError>() {
        Some(PatchError::MalformedHeader(_)) => 3,
        Some(PatchError::TruncatedImage { .. }) => 4,
        Some(PatchError::InvalidPatchPair { .. } | PatchError::InvalidCmdlinePatch { .. }) => 5,
        Some(PatchError::DecompressionFailure(_)) => 6,
        Some(PatchError::CmdlineOverflow { .. }) => 7,
        Some(PatchError::Io(_)) => 8,
        None => 1,
    }
}

fn build_options(cli: &Cli) -> Result<PatchOptions> {
    let mut options = PatchOptions::new()?;
    options.disable_encryption(cli.disable_encryption);
    for pair in cli.replace.chunks(2) {
        let [search, replace] = pair else {
            bail!("--replace needs SEARCH and REPLACE");
        };
        let pair = PatchPair::new(search.as_bytes(), replace.as_bytes())
            .context("invalid --replace pair")?;
        options.add_ramdisk_pair(pair);
    }
    Ok(options)
}

fn run(cli: &Cli) -> Result<()> {
    let options = build_options(cli)?;
    patch_file(&cli.input, &cli.output, &options, &mut LogReporter)
        .with_context(|| format!("failed to patch {}", cli.input.display()))?;
    info!("Wrote {}", cli.output.display());
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}
