//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use otadex_types::{ColorChoice, DexoptCommand, OutputFormat, RelocationReport, RunReport};
use serde::Serialize;
use std::io;

/// Result of a CLI command, ready for rendering
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationResult {
    /// Commands handed out by an export run
    Export {
        commands: Vec<DexoptCommand>,
        report: RunReport,
    },
    /// Summary of a direct run
    Run(RunReport),
    /// Counters of the startup relocation pass
    Relocation(RelocationReport),
}

impl OperationResult {
    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    format: OutputFormat,
    color_choice: ColorChoice,
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(format: OutputFormat, color_choice: ColorChoice) -> Self {
        Self {
            format,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.render_json(result),
            OutputFormat::Plain => self.render_plain(result),
            OutputFormat::Tty => self.render_table(result),
        }
    }

    fn render_json(&self, result: &OperationResult) -> io::Result<()> {
        let json = result.to_json().map_err(io::Error::other)?;
        self.term.write_line(&json)
    }

    /// Commands one per line, summaries as key=value pairs
    fn render_plain(&self, result: &OperationResult) -> io::Result<()> {
        match result {
            OperationResult::Export { commands, .. } => self.write_commands(commands),
            OperationResult::Run(report) => self.term.write_line(&format!(
                "mode={} packages={} duration_ms={}",
                report.mode, report.total_packages, report.duration_ms
            )),
            OperationResult::Relocation(report) => self.term.write_line(&format!(
                "scanned={} skipped={} attempted={} moved={} not_staged={} failed={}",
                report.packages_scanned,
                report.packages_skipped,
                report.attempted,
                report.moved,
                report.not_staged,
                report.failed
            )),
        }
    }

    fn render_table(&self, result: &OperationResult) -> io::Result<()> {
        match result {
            OperationResult::Export { commands, report } => {
                self.write_commands(commands)?;
                // Summary goes to stderr so stdout stays a clean command list
                Term::stderr().write_line(&self.run_table(report).to_string())
            }
            OperationResult::Run(report) => {
                self.term.write_line(&self.run_table(report).to_string())
            }
            OperationResult::Relocation(report) => self.render_relocation_report(report),
        }
    }

    fn write_commands(&self, commands: &[DexoptCommand]) -> io::Result<()> {
        for command in commands {
            self.term.write_line(command.as_str())?;
        }
        Ok(())
    }

    fn run_table(&self, report: &RunReport) -> Table {
        let mut table = self.new_table(&["Mode", "Packages", "Commands", "Duration"]);
        table.add_row(vec![
            Cell::new(report.mode.to_string()),
            Cell::new(report.total_packages),
            Cell::new(report.commands),
            Cell::new(format!("{} ms", report.duration_ms)),
        ]);
        table
    }

    fn render_relocation_report(&self, report: &RelocationReport) -> io::Result<()> {
        let mut table = self.new_table(&[
            "Scanned",
            "Skipped",
            "Attempted",
            "Moved",
            "Not staged",
            "Failed",
        ]);
        table.add_row(vec![
            Cell::new(report.packages_scanned),
            Cell::new(report.packages_skipped),
            Cell::new(report.attempted),
            self.count_cell(report.moved, Color::Green),
            Cell::new(report.not_staged),
            self.count_cell(report.failed, Color::Red),
        ]);
        self.term.write_line(&table.to_string())?;

        if report.failed > 0 {
            let style = if self.colors_enabled() {
                Style::new().yellow()
            } else {
                Style::new()
            };
            self.term.write_line(&format!(
                "{}",
                style.apply_to("Some artifacts could not be moved; they will be recompiled on first use.")
            ))?;
        }
        Ok(())
    }

    fn new_table(&self, headers: &[&str]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(
            headers
                .iter()
                .map(|header| Cell::new(header).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
        if !self.colors_enabled() {
            table.force_no_tty();
        }
        table
    }

    fn count_cell(&self, count: usize, color: Color) -> Cell {
        let cell = Cell::new(count);
        if count > 0 && self.colors_enabled() {
            cell.fg(color)
        } else {
            cell
        }
    }

    fn colors_enabled(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}
