//! Emulator rendering through an external command.
//!
//! The command is invoked as `CMD <out.wav> <p0> <p1> ...` and must write a
//! WAV file to `<out.wav>` before exiting successfully.

use std::process::{Command, Stdio};

use tribecal_analysis::AudioBuffer;
use tribecal_calibrate::{Render, RenderError};

/// Renders by running an external program once per parameter vector.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    /// Split a command line on whitespace into program and leading arguments.
    pub fn parse(command_line: &str) -> anyhow::Result<Self> {
        let mut words = command_line.split_whitespace().map(str::to_string);
        let Some(program) = words.next() else {
            anyhow::bail!("render command is empty");
        };
        Ok(Self {
            program,
            args: words.collect(),
        })
    }
}

impl Render for CommandRenderer {
    fn render(&self, parameters: &[f64]) -> Result<AudioBuffer, RenderError> {
        let scratch = tempfile::tempdir()?;
        let out = scratch.path().join("render.wav");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&out)
            .args(parameters.iter().map(f64::to_string))
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::Failed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        tracing::trace!(?parameters, "rendered");
        Ok(tribecal_io::load_buffer(&out)?)
    }
}
