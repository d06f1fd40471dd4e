//! Response export for the CLI frontend.
//!
//! Writes a [`PhysicalResponse`] to any [`Write`] sink (stdout by default)
//! as CSV (`t,x1,...,xN`) or JSON.

use std::io::{self, BufWriter, Write};

use clap::ValueEnum;

use crate::error::{MdofError, Result};
use crate::solver::PhysicalResponse;

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Comma-separated values, one row per sample
    #[default]
    Csv,
    /// A single JSON object
    Json,
}

fn output_error(e: impl ToString) -> MdofError {
    MdofError::OutputError {
        message: e.to_string(),
    }
}

/// Response writer over a byte sink.
pub struct ResponseWriter<W: Write> {
    out: BufWriter<W>,
    include_velocity: bool,
}

impl<W: Write> ResponseWriter<W> {
    /// Create a writer over `sink`.
    pub fn new(sink: W) -> Self {
        Self {
            out: BufWriter::new(sink),
            include_velocity: false,
        }
    }

    /// Also emit velocity columns (`v1..vN`) in CSV output.
    pub fn with_velocity(mut self, include_velocity: bool) -> Self {
        self.include_velocity = include_velocity;
        self
    }

    /// Write the response in the given format and flush.
    pub fn write(&mut self, response: &PhysicalResponse, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Csv => self.write_csv(response)?,
            OutputFormat::Json => self.write_json(response)?,
        }
        self.flush()
    }

    /// Write CSV with a header row.
    pub fn write_csv(&mut self, response: &PhysicalResponse) -> Result<()> {
        let n = response.dof();

        let mut header = vec!["t".to_string()];
        header.extend((1..=n).map(|i| format!("x{i}")));
        if self.include_velocity {
            header.extend((1..=n).map(|i| format!("v{i}")));
        }
        writeln!(self.out, "{}", header.join(",")).map_err(output_error)?;

        for (row, &t) in response.time.iter().enumerate() {
            write!(self.out, "{t}").map_err(output_error)?;
            for series in &response.displacement {
                write!(self.out, ",{}", series[row]).map_err(output_error)?;
            }
            if self.include_velocity {
                for series in &response.velocity {
                    write!(self.out, ",{}", series[row]).map_err(output_error)?;
                }
            }
            writeln!(self.out).map_err(output_error)?;
        }
        Ok(())
    }

    /// Write the response as one JSON object.
    pub fn write_json(&mut self, response: &PhysicalResponse) -> Result<()> {
        serde_json::to_writer(&mut self.out, response).map_err(output_error)?;
        writeln!(self.out).map_err(output_error)
    }

    /// Flush the output stream.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush().map_err(output_error)
    }
}

/// Write a response to stdout.
pub fn write_stdout(
    response: &PhysicalResponse,
    format: OutputFormat,
    include_velocity: bool,
) -> Result<()> {
    let stdout = io::stdout();
    ResponseWriter::new(stdout.lock())
        .with_velocity(include_velocity)
        .write(response, format)
}
