use crate::model::{CheckState, OutputConfig, OutputFormat, RunSummary};
use std::io::Write;

pub struct SummaryWriter<W: Write> {
    cfg: OutputConfig,
    writer: W,
}

impl SummaryWriter<std::io::Stdout> {
    pub fn stdout(cfg: OutputConfig) -> Self {
        Self::new(cfg, std::io::stdout())
    }
}

impl<W: Write> SummaryWriter<W> {
    pub fn new(cfg: OutputConfig, writer: W) -> Self {
        Self { cfg, writer }
    }

    pub fn write_summary(&mut self, summary: &RunSummary) -> anyhow::Result<()> {
        match self.cfg.format {
            OutputFormat::Jsonl => {
                let line = serde_json::to_string(summary)?;
                writeln!(self.writer, "{line}")?;
            }
            OutputFormat::Pretty => {
                writeln!(
                    self.writer,
                    "{}:{} -> {} ({} addresses, {} ms)",
                    summary.hostname,
                    summary.port,
                    if summary.is_healthy() { "up" } else { "down" },
                    summary.attempted.len(),
                    summary.elapsed_ms
                )?;
                for outcome in &summary.outcomes {
                    match (&outcome.state, &outcome.reason) {
                        (CheckState::Matched, _) => {
                            writeln!(self.writer, "  {}: greeting ok", outcome.address)?
                        }
                        (state, Some(reason)) => {
                            writeln!(self.writer, "  {}: {} ({})", outcome.address, state, reason)?
                        }
                        (state, None) => writeln!(self.writer, "  {}: {}", outcome.address, state)?,
                    }
                }
                if summary.attempted.is_empty() {
                    for event in &summary.down {
                        writeln!(self.writer, "  {}", event.message())?;
                    }
                }
            }
        }

        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
