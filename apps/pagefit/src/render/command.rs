//! Command-backed oracle: runs an external renderer as a child process.
//!
//! Protocol: the content is written as JSON into a fresh temp directory and
//! the configured command is invoked with `<input.json> <output.pdf>` appended.
//! A zero exit status plus a readable PDF at the output path is success.
//! The HTML template and the HTML→PDF engine live entirely in that process.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::models::ContentModel;
use crate::render::{RenderError, RenderOracle};

const INPUT_FILE: &str = "content.json";
const OUTPUT_FILE: &str = "document.pdf";

#[derive(Debug, Clone)]
pub struct CommandRenderOracle {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandRenderOracle {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Splits a whitespace-separated command line such as `render-cv --a4`.
    pub fn from_command_line(command: &str, timeout: Duration) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let Some(program) = parts.next() else {
            bail!("Render command is empty");
        };
        Ok(Self::new(program, parts.collect(), timeout))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    async fn run(&self, input: &Path, output: &Path) -> Result<(), RenderError> {
        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(&self.args)
            .arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => {
                return Err(RenderError::Timeout {
                    timeout: self.timeout,
                })
            }
            Ok(Err(source)) => {
                return Err(RenderError::Spawn {
                    program: self.program.clone(),
                    source,
                })
            }
            Ok(Ok(result)) => result,
        };

        debug!(
            program = %self.program,
            elapsed_ms = started.elapsed().as_millis() as u64,
            status = %result.status,
            "Renderer finished"
        );

        if !result.status.success() {
            return Err(RenderError::Process {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RenderOracle for CommandRenderOracle {
    async fn render(&self, content: &ContentModel) -> Result<Bytes, RenderError> {
        // Dropped (and deleted) when this call returns.
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join(INPUT_FILE);
        let output = workdir.path().join(OUTPUT_FILE);

        tokio::fs::write(&input, serde_json::to_vec(content)?).await?;
        self.run(&input, &output).await?;

        let document = tokio::fs::read(&output).await?;
        Ok(Bytes::from(document))
    }

    fn count_pages(&self, document: &[u8]) -> Result<u32, RenderError> {
        count_pdf_pages(document)
    }
}

/// Counts the leaves of a PDF's page tree.
pub fn count_pdf_pages(document: &[u8]) -> Result<u32, RenderError> {
    let pdf = lopdf::Document::load_mem(document).map_err(|e| RenderError::Pdf(e.to_string()))?;
    Ok(pdf.get_pages().len() as u32)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
