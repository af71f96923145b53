//! External build command.
//!
//! Runs the configured command (e.g. `["npx", "vite", "build"]`) in the
//! project root, then reads everything it wrote under the output root into
//! a manifest. A non-zero exit turns the command's output into diagnostics.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};

use super::{CompileRequest, Compiler, Diagnostics};
use crate::asset::{Manifest, scan_dir};

/// Environment variable carrying the compile run id to the build command.
pub const BUILD_ID_ENV: &str = "HOTSERVE_BUILD_ID";

pub struct CommandCompiler {
    program: PathBuf,
    args: Vec<String>,
    workdir: PathBuf,
    output_root: PathBuf,
    display: String,
}

impl CommandCompiler {
    /// Resolve the program on `PATH` (or relative to `workdir`).
    pub fn new(argv: &[String], workdir: &Path, output_root: &Path) -> Result<Self> {
        let Some((program, args)) = argv.split_first() else {
            bail!("build command is empty");
        };

        let program = which::which_in(program, std::env::var_os("PATH"), workdir)
            .with_context(|| format!("build command `{program}` not found"))?;

        Ok(Self {
            program,
            args: args.to_vec(),
            workdir: workdir.to_path_buf(),
            output_root: output_root.to_path_buf(),
            display: argv.join(" "),
        })
    }
}

impl Compiler for CommandCompiler {
    fn name(&self) -> &str {
        &self.display
    }

    fn run(&self, request: &CompileRequest) -> Result<Manifest, Diagnostics> {
        crate::debug!("compile"; "running `{}` (#{})", self.display, request.id);

        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.workdir)
            .env(BUILD_ID_ENV, request.id.to_string())
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                Diagnostics::single_error(format!("failed to run `{}`: {e}", self.display))
            })?;

        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
            text.push('\n');
            text.push_str(&String::from_utf8_lossy(&output.stdout));

            let diagnostics = Diagnostics::parse_output(&text)
                .ensure_error(format!("`{}` exited with {}", self.display, output.status));
            return Err(diagnostics);
        }

        scan_dir(&self.output_root).map_err(|e| Diagnostics::single_error(format!("{e}")))
    }
}
