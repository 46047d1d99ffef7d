#![forbid(unsafe_code)]

//! Sigtuna CLI — canonicalize XML documents.

use anyhow::{bail, Context, Result};
use clap::Parser;
use sigtuna_c14n::{canonicalize_str, C14nMode};
use sigtuna_core::algorithm;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(
    name = "sigtuna",
    about = "Sigtuna — W3C Canonical XML 1.0 and Exclusive Canonical XML 1.0",
    version
)]
struct Cli {
    /// Input XML file ("-" or absent reads standard input)
    file: Option<PathBuf>,

    /// Canonicalization algorithm URI (overrides the mode flags)
    #[arg(short = 'a', long)]
    algorithm: Option<String>,

    /// Use Exclusive Canonical XML 1.0
    #[arg(short = 'x', long)]
    exclusive: bool,

    /// Keep comments in the canonical output
    #[arg(short = 'c', long = "with-comments")]
    with_comments: bool,

    /// InclusiveNamespaces prefix list for exclusive canonicalization
    /// ("#default" names the default namespace)
    #[arg(short = 'p', long = "inclusive-prefixes", value_delimiter = ',')]
    inclusive_prefixes: Vec<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// List the supported algorithm URIs and exit
    #[arg(long)]
    list_algorithms: bool,
}

fn main() {
    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.list_algorithms {
        for uri in [
            algorithm::C14N,
            algorithm::C14N_WITH_COMMENTS,
            algorithm::EXC_C14N,
            algorithm::EXC_C14N_WITH_COMMENTS,
        ] {
            println!("{uri}");
        }
        return Ok(());
    }

    let mode = resolve_mode(&cli)?;
    if !cli.inclusive_prefixes.is_empty() && !mode.is_exclusive() {
        bail!("--inclusive-prefixes only applies to the exclusive algorithms");
    }

    let xml = read_input(cli.file.as_ref())?;
    let canonical = canonicalize_str(&xml, mode, None, &cli.inclusive_prefixes)?;
    write_output(cli.output.as_ref(), &canonical)
}

fn resolve_mode(cli: &Cli) -> Result<C14nMode> {
    match &cli.algorithm {
        Some(uri) => {
            if cli.exclusive || cli.with_comments {
                bail!("--algorithm cannot be combined with --exclusive or --with-comments");
            }
            C14nMode::from_uri(uri)
                .with_context(|| format!("unsupported canonicalization algorithm: {uri}"))
        }
        None => Ok(match (cli.exclusive, cli.with_comments) {
            (false, false) => C14nMode::Inclusive,
            (false, true) => C14nMode::InclusiveWithComments,
            (true, false) => C14nMode::Exclusive,
            (true, true) => C14nMode::ExclusiveWithComments,
        }),
    }
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(p) if p.as_os_str() != "-" => std::fs::read_to_string(p)
            .with_context(|| format!("reading {}", p.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading standard input")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&PathBuf>, data: &[u8]) -> Result<()> {
    match path {
        Some(p) => {
            std::fs::write(p, data).with_context(|| format!("writing {}", p.display()))
        }
        None => std::io::stdout()
            .write_all(data)
            .context("writing to standard output"),
    }
}
