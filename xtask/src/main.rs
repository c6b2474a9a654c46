use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for tumbler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, doc, headless smoke run
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Time the surface tick in release mode
    Bench,
    /// Tick the default scene headlessly through tumbler-cli
    Smoke {
        #[arg(long, default_value = "120")]
        ticks: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            run_fmt()?;
            run_clippy()?;
            run_tests()?;
            run_doc()?;
            run_smoke(10)?;
        }
        Commands::Fmt => run_fmt()?,
        Commands::Clippy => run_clippy()?,
        Commands::Test => run_tests()?,
        Commands::Doc => run_doc()?,
        Commands::Build => cargo("build", &["build", "--workspace"])?,
        Commands::Bench => cargo(
            "bench",
            &["bench", "-p", "tumbler-terrain", "--bench", "bench_surface_tick"],
        )?,
        Commands::Smoke { ticks } => run_smoke(ticks)?,
    }

    Ok(())
}

fn cargo(step: &str, args: &[&str]) -> Result<()> {
    println!("==> Running cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {step} failed");
    }
    Ok(())
}

fn run_fmt() -> Result<()> {
    cargo("fmt check", &["fmt", "--all", "--", "--check"])
}

fn run_clippy() -> Result<()> {
    cargo(
        "clippy",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
    )
}

fn run_tests() -> Result<()> {
    cargo("test", &["test", "--workspace"])
}

fn run_doc() -> Result<()> {
    cargo("doc", &["doc", "--workspace", "--no-deps"])
}

fn run_smoke(ticks: u64) -> Result<()> {
    let ticks = ticks.to_string();
    cargo(
        "smoke run",
        &[
            "run",
            "-q",
            "-p",
            "tumbler-cli",
            "--",
            "simulate",
            "--ticks",
            &ticks,
        ],
    )
}
