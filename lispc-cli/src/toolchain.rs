use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};

/// The native C++ compiler the generated code is handed to.
#[derive(Debug, Clone)]
pub struct Toolchain {
    cxx: String,
    flags: Vec<String>,
}

impl Toolchain {
    pub fn new(cxx: impl Into<String>, flags: Vec<String>) -> Self {
        Toolchain {
            cxx: cxx.into(),
            flags,
        }
    }

    pub fn compile_executable(&self, source: &Path, output: &Path) -> Result<()> {
        let mut command = Command::new(&self.cxx);
        command.args(&self.flags).arg("-o").arg(output).arg(source);
        self.invoke(command, "compilation")
    }

    pub fn emit_assembly(&self, source: &Path, output: &Path) -> Result<()> {
        let mut command = Command::new(&self.cxx);
        command.args(&self.flags);
        if cfg!(any(target_arch = "x86", target_arch = "x86_64")) {
            command.arg("-masm=att");
        }
        command.arg("-S").arg("-o").arg(output).arg(source);
        self.invoke(command, "assembly generation")
    }

    fn invoke(&self, mut command: Command, what: &str) -> Result<()> {
        let output = command
            .output()
            .with_context(|| format!("failed to run native compiler '{}'", self.cxx))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "{what} failed: '{}' exited with {}\n{}",
                self.cxx,
                output.status,
                stderr.trim_end()
            );
        }
        Ok(())
    }
}
