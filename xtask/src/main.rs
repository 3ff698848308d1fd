use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development automation for xenos-fb")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks (fmt, clippy, build, test)
    Ci {
        #[arg(long)]
        verbose: bool,
    },
    /// Format code
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy
    Clippy {
        #[arg(long)]
        fix: bool,
    },
    /// Build the project
    Build {
        #[arg(long)]
        release: bool,
    },
    /// Run tests
    Test {
        #[arg(long)]
        doc: bool,
        #[arg(long)]
        ignored: bool,
        /// Run only the GPU/CPU equivalence tests (needs an adapter)
        #[arg(long)]
        gpu: bool,
        /// Run only one library module's unit tests
        #[arg(long, value_enum)]
        module: Option<Module>,
    },
    /// Run benchmarks
    Bench,
    /// Detile a dump headlessly and write a PNG
    Export {
        /// Path to the tiled dump (omit to export the test pattern)
        dump: Option<String>,
        /// PNG to write
        #[arg(short, long, default_value = "export.png")]
        output: String,
        /// Console render resolution, e.g. 1280x720
        #[arg(long)]
        internal: Option<String>,
        /// Build in release mode
        #[arg(long)]
        release: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Module {
    Detile,
    Framebuffer,
    Convert,
    Gpu,
    Display,
}

impl Module {
    fn path(self) -> &'static str {
        match self {
            Module::Detile => "detile::",
            Module::Framebuffer => "framebuffer::",
            Module::Convert => "convert::",
            Module::Gpu => "gpu::",
            Module::Display => "display::",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { verbose } => run_ci(verbose),
        Commands::Fmt { check } => run_fmt(check),
        Commands::Clippy { fix } => run_clippy(fix),
        Commands::Build { release } => run_build(release),
        Commands::Test {
            doc,
            ignored,
            gpu,
            module,
        } => {
            if gpu {
                run_gpu_tests()
            } else {
                run_test(doc, ignored, module)
            }
        }
        Commands::Bench => run_bench(),
        Commands::Export {
            dump,
            output,
            internal,
            release,
        } => run_export(dump.as_deref(), &output, internal.as_deref(), release),
    }
}

fn run_ci(verbose: bool) -> Result<()> {
    println!("{}", "=== Running CI Pipeline ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), verbose)?;
    run_task("Clippy", || run_clippy(false), verbose)?;
    run_task("Build", || run_build(false), verbose)?;
    run_task("Test", || run_test(false, false, None), verbose)?;

    let elapsed = start.elapsed();
    println!(
        "\n{} {}",
        "✓ CI passed in".green().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold()
    );

    Ok(())
}

fn run_fmt(check: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("fmt").arg("--all");

    if check {
        cmd.arg("--").arg("--check");
    }

    execute_command(&mut cmd)
}

fn run_clippy(fix: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("clippy").arg("--workspace").arg("--all-targets");

    if fix {
        cmd.arg("--fix");
    } else {
        cmd.arg("--").arg("-D").arg("warnings");
    }

    execute_command(&mut cmd)
}

fn run_build(release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("build");

    if release {
        cmd.arg("--release");
    }

    execute_command(&mut cmd)
}

fn run_test(doc: bool, ignored: bool, module: Option<Module>) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("test");

    if doc {
        cmd.arg("--doc");
    } else if let Some(module) = module {
        println!("{} Running {} tests...", "→".blue(), module.path().bold());
        cmd.arg("--lib").arg(module.path());
    } else {
        cmd.arg("--workspace");
    }

    if ignored {
        cmd.arg("--").arg("--ignored");
    }

    execute_command(&mut cmd)
}

fn run_gpu_tests() -> Result<()> {
    println!(
        "{} Running GPU equivalence tests (requires a GPU adapter)...",
        "→".blue()
    );

    let mut cmd = Command::new("cargo");
    cmd.arg("test")
        .arg("--test")
        .arg("conversion_test")
        .arg("gpu_")
        .arg("--")
        .arg("--ignored");

    execute_command(&mut cmd)
}

fn run_bench() -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("bench");

    execute_command(&mut cmd)
}

fn run_export(
    dump: Option<&str>,
    output: &str,
    internal: Option<&str>,
    release: bool,
) -> Result<()> {
    use std::path::Path;

    println!("{}", "=== Export ===".bold().blue());

    match dump {
        Some(dump) => {
            // Check if dump file exists
            if !Path::new(dump).exists() {
                println!("{} Dump file not found: {}", "✗".red().bold(), dump.yellow());
                println!(
                    "\n{} Please provide a tiled framebuffer dump (e.g. fbmem.bin).",
                    "ℹ".blue()
                );
                anyhow::bail!("Dump file not found");
            }
            println!("{} Dump file: {}", "✓".green(), dump.cyan());
        }
        None => println!("{} Source: {}", "→".blue(), "test pattern".cyan()),
    }

    println!("{} Output: {}", "→".blue(), output.bold());
    println!(
        "{} Build mode: {}",
        "→".blue(),
        if release {
            "release".green().bold()
        } else {
            "debug".yellow().bold()
        }
    );
    println!();

    // Build first if needed
    if release {
        println!("{} Building in release mode...", "→".blue());
        run_build(true)?;
        println!();
    }

    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.arg("run");

    if release {
        cmd.arg("--release");
    }

    cmd.arg("--").arg("--export").arg(output);

    match dump {
        Some(dump) => {
            cmd.arg("--dump").arg(dump);
        }
        None => {
            cmd.arg("--test-pattern");
        }
    }

    if let Some(internal) = internal {
        cmd.arg("--internal").arg(internal);
    }

    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        println!("\n{} Export failed", "✗".red().bold());
        anyhow::bail!("Export failed with exit code: {}", status);
    }

    let elapsed = start.elapsed();
    println!(
        "\n{} Export completed in {}",
        "✓".green().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold()
    );

    Ok(())
}

fn run_task<F>(name: &str, task: F, verbose: bool) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    print!("{} {} ... ", "→".blue(), name);

    let start = Instant::now();

    match task() {
        Ok(_) => {
            let elapsed = start.elapsed();
            println!(
                "{} {}",
                "✓".green().bold(),
                if verbose {
                    format!("({:.2}s)", elapsed.as_secs_f64())
                } else {
                    String::new()
                }
            );
            Ok(())
        }
        Err(e) => {
            println!("{}", "✗".red().bold());
            Err(e)
        }
    }
}

fn execute_command(cmd: &mut Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        anyhow::bail!("Command failed with exit code: {}", status);
    }

    Ok(())
}
