use std::{
    io::Write,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::LevelFilter;
use reqpack::{BundleOrchestrator, BundleOutput, config::Config};

#[derive(Parser, Debug)]
#[command(
    name = "reqpack",
    version,
    about = "Bundle a require()-based JavaScript module graph into a single file"
)]
struct Cli {
    /// Entry file of the program
    #[arg(value_name = "ENTRY", required_unless_present = "entry")]
    entry_path: Option<PathBuf>,

    /// Entry file of the program (alternative to the positional argument)
    #[arg(long, alias = "entry-point", value_name = "PATH", conflicts_with = "entry_path")]
    entry: Option<PathBuf>,

    /// Where to write the bundle. Without it nothing is written to disk.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Print the bundle to stdout; the report goes to stderr
    #[arg(long)]
    stdout: bool,

    /// Project config file (defaults to reqpack.toml next to the entry)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Skip the import/export syntax normalizer
    #[arg(long)]
    no_transform: bool,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn entry(&self) -> Option<&Path> {
        self.entry.as_deref().or(self.entry_path.as_deref())
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // RUST_LOG, when set, wins over the flag
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Error: {e:?}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let entry = cli
        .entry()
        .context("An entry file is required (pass it positionally or with --entry)")?;
    let project_dir = std::path::absolute(entry)
        .ok()
        .and_then(|path| path.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    let mut config = Config::load(&project_dir, cli.config.as_deref())?;
    if cli.no_transform {
        config.transform_esm = false;
    }

    let output = BundleOrchestrator::new(config).bundle(entry)?;

    if let Some(path) = &cli.output {
        output.write_to(path)?;
    }

    if cli.stdout {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(output.bundle.text().as_bytes())?;
        stdout.flush()?;
        report(&mut std::io::stderr().lock(), entry, &output, cli.output.as_deref())?;
    } else {
        report(&mut std::io::stdout().lock(), entry, &output, cli.output.as_deref())?;
    }
    Ok(())
}

fn report(
    out: &mut impl Write,
    entry: &Path,
    output: &BundleOutput,
    written: Option<&Path>,
) -> Result<()> {
    writeln!(out, "> Building {}", entry.display())?;
    writeln!(out, "> Found {} files", output.module_count())?;
    for (id, path) in output.modules.iter().enumerate() {
        writeln!(out, "  [{id}] {}", path.display())?;
    }
    let short = output.fingerprint.get(..12).unwrap_or(&output.fingerprint);
    writeln!(out, "> Fingerprint {short}")?;
    for cycle in &output.cycles {
        let ids: Vec<String> = cycle.iter().map(ToString::to_string).collect();
        writeln!(out, "> Circular dependency: {}", ids.join(" -> "))?;
    }
    match written {
        Some(path) => writeln!(out, "> Wrote {} ({} bytes)", path.display(), output.bundle.byte_len())?,
        None => writeln!(out, "> Bundle is {} bytes (use --output to write it)", output.bundle.byte_len())?,
    }
    Ok(())
}
