mod toolchain;

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use anyhow::{Context, Result, bail};
use clap::Parser;
use lispc_core::ast::render_tree;
use lispc_core::parser::parse;
use lispc_core::{CompilationArtifact, Runtime, compile};

use crate::toolchain::Toolchain;

/// Compile a Lisp program to C++ and build it with the native compiler.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long, help = "Source file (reads stdin when omitted)")]
    input: Option<String>,

    #[arg(
        short,
        long,
        help = "Output path (defaults to <input>.out, a.out for stdin, stdout for cpp/ast)"
    )]
    output: Option<String>,

    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "exe",
        help = "Output format: exe, cpp, ast"
    )]
    emit: String,

    #[arg(
        long,
        value_name = "PATH",
        help = "Path to a runtime template (defaults to the bundled runtime)"
    )]
    runtime: Option<String>,

    #[arg(long, value_name = "CMD", default_value = "g++", help = "Native C++ compiler")]
    cxx: String,

    #[arg(
        long = "cxx-flag",
        value_name = "FLAG",
        default_value = "-O2",
        allow_hyphen_values = true,
        help = "Flag passed to the native compiler (repeatable)"
    )]
    cxx_flags: Vec<String>,

    #[arg(long, help = "Also write assembly next to the executable")]
    asm: bool,

    #[arg(long, help = "Keep the generated C++ next to the executable")]
    keep_cpp: bool,

    #[arg(long, help = "Run the executable after building it")]
    run: bool,

    #[arg(short, long, help = "Print each stage to stderr")]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    execute(cli)
}

fn execute(cli: Cli) -> Result<ExitCode> {
    let source = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {path}"))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read source from stdin")?;
            buffer
        }
    };

    let runtime = match &cli.runtime {
        Some(path) => {
            log(&cli, format!("loading runtime template {path}"));
            Runtime::load(path)?
        }
        None => Runtime::bundled(),
    };

    match cli.emit.as_str() {
        "ast" => {
            log(&cli, "parsing");
            let program = parse(&source)?;
            emit_text(cli.output.as_deref(), &render_tree(&program))?;
        }
        "cpp" => {
            log(&cli, "generating C++");
            let artifact = compile(&source, &runtime)?;
            emit_text(cli.output.as_deref(), &artifact.cpp)?;
        }
        "exe" => {
            log(&cli, "generating C++");
            let artifact = compile(&source, &runtime)?;
            for function in &artifact.functions {
                log(
                    &cli,
                    format!(
                        "defined {} as {} ({} parameters)",
                        function.name, function.generated, function.arity
                    ),
                );
            }
            let output = executable_path(&cli);
            build(&cli, &artifact, &output)?;
            if cli.run {
                return run_program(&cli, &output);
            }
        }
        other => bail!("unsupported emit format: {other}"),
    }

    if cli.run && cli.emit != "exe" {
        eprintln!("--run is ignored for non-exe outputs");
    }

    Ok(ExitCode::SUCCESS)
}

fn executable_path(cli: &Cli) -> PathBuf {
    match (&cli.output, &cli.input) {
        (Some(output), _) => PathBuf::from(output),
        (None, Some(input)) => PathBuf::from(format!("{input}.out")),
        (None, None) => PathBuf::from("a.out"),
    }
}

fn build(cli: &Cli, artifact: &CompilationArtifact, output: &Path) -> Result<()> {
    let assembly = cli
        .asm
        .then(|| companion_path(output, "s", "--asm"))
        .transpose()?;
    let kept = cli
        .keep_cpp
        .then(|| companion_path(output, "cpp", "--keep-cpp"))
        .transpose()?;

    let mut cpp = tempfile::Builder::new()
        .prefix("lispc-")
        .suffix(".cpp")
        .tempfile()
        .context("failed to create temporary C++ file")?;
    cpp.write_all(artifact.cpp.as_bytes())
        .and_then(|()| cpp.flush())
        .context("failed to write temporary C++ file")?;
    create_parent(output)?;

    let toolchain = Toolchain::new(cli.cxx.clone(), cli.cxx_flags.clone());
    log(cli, format!("running {} {}", cli.cxx, cli.cxx_flags.join(" ")));
    toolchain.compile_executable(cpp.path(), output)?;
    println!(
        "Compilation successful. Executable created at: {}",
        output.display()
    );

    if let Some(assembly) = assembly {
        log(cli, "generating assembly");
        toolchain.emit_assembly(cpp.path(), &assembly)?;
        println!("Assembly generated at: {}", assembly.display());
    }

    if let Some(kept) = kept {
        fs::copy(cpp.path(), &kept)
            .with_context(|| format!("failed to keep generated C++ at {}", kept.display()))?;
        log(cli, format!("kept generated C++ at {}", kept.display()));
    }

    Ok(())
}

/// A file written next to the executable, with its extension replaced.
fn companion_path(output: &Path, extension: &str, flag: &str) -> Result<PathBuf> {
    let path = output.with_extension(extension);
    if path == output {
        bail!("{flag} would overwrite the executable at {}", output.display());
    }
    Ok(path)
}

fn run_program(cli: &Cli, executable: &Path) -> Result<ExitCode> {
    let executable = fs::canonicalize(executable)
        .with_context(|| format!("failed to locate {}", executable.display()))?;
    log(cli, format!("running {}", executable.display()));
    let status = Command::new(&executable)
        .status()
        .with_context(|| format!("failed to run {}", executable.display()))?;
    log(cli, format!("program exited with {status}"));
    let code = status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .unwrap_or(1);
    Ok(ExitCode::from(code))
}

fn emit_text(output: Option<&str>, text: &str) -> Result<()> {
    match output {
        Some(path) => write_output(path, text.as_bytes()),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .context("failed to write to stdout")?;
            Ok(())
        }
    }
}

fn write_output(path: &str, bytes: &[u8]) -> Result<()> {
    create_parent(Path::new(path))?;
    fs::write(path, bytes).with_context(|| format!("failed to write output file {path}"))?;
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    Ok(())
}

fn log(cli: &Cli, message: impl AsRef<str>) {
    if cli.verbose {
        eprintln!("[lispc] {}", message.as_ref());
    }
}
