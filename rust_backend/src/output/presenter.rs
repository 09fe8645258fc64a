use std::io::Write;

use crate::error::{PipelineError, PipelineResult};
use crate::output::literal::Literal;
use crate::output::{FormatConfig, OutputFormat};

/// Sink for stage diagnostics.
///
/// Stages compute structured values; a presenter decides how they are shown.
/// `stage` names the emitting stage and `label` the question answered.
pub trait Presenter {
    fn emit(&mut self, stage: &str, label: &str, value: &Literal) -> PipelineResult<()>;
}

/// Writes each value as one Python-literal line.
pub struct PythonPresenter<W: Write> {
    writer: W,
    format: FormatConfig,
}

impl<W: Write> PythonPresenter<W> {
    pub fn new(writer: W, format: FormatConfig) -> Self {
        Self { writer, format }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Presenter for PythonPresenter<W> {
    fn emit(&mut self, _stage: &str, _label: &str, value: &Literal) -> PipelineResult<()> {
        writeln!(self.writer, "{}", value.render(self.format.max_items))
            .map_err(|e| PipelineError::Output(e.to_string()))
    }
}

/// Writes one JSON object per line: `{"stage": .., "label": .., "value": ..}`.
pub struct JsonPresenter<W: Write> {
    writer: W,
}

impl<W: Write> JsonPresenter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Presenter for JsonPresenter<W> {
    fn emit(&mut self, stage: &str, label: &str, value: &Literal) -> PipelineResult<()> {
        let record = serde_json::json!({
            "stage": stage,
            "label": label,
            "value": value.to_json(),
        });
        serde_json::to_writer(&mut self.writer, &record)
            .map_err(|e| PipelineError::Output(e.to_string()))?;
        writeln!(self.writer).map_err(|e| PipelineError::Output(e.to_string()))
    }
}

/// Routes diagnostics through the `log` facade at info level.
pub struct LogPresenter {
    format: FormatConfig,
}

impl LogPresenter {
    pub fn new(format: FormatConfig) -> Self {
        Self { format }
    }
}

impl Presenter for LogPresenter {
    fn emit(&mut self, stage: &str, label: &str, value: &Literal) -> PipelineResult<()> {
        log::info!(
            "[{}] {}: {}",
            stage,
            label,
            value.render(self.format.max_items)
        );
        Ok(())
    }
}

/// Presenter writing to stdout in the configured format.
pub fn stdout_presenter(format: &FormatConfig) -> Box<dyn Presenter> {
    match format.format {
        OutputFormat::Python => Box::new(PythonPresenter::new(std::io::stdout(), format.clone())),
        OutputFormat::Json => Box::new(JsonPresenter::new(std::io::stdout())),
        OutputFormat::Log => Box::new(LogPresenter::new(format.clone())),
    }
}
