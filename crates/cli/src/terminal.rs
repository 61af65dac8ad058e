use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};

use ragreader_controller::{ControllerView, ErrorPayload, Navigator, ServerMessage, View};
use ragreader_core::Phase;

const BAR_WIDTH: usize = 30;
const FAILURE_HINT: &str = "Please check the logs or try again later.";

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const PHASE: Color = Color::Cyan;
    const BAR: Color = Color::Green;
    const READY: Color = Color::Green;
    const ERROR: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
    const HEADER: Color = Color::Magenta;
}

/// Renders loading progress and command results.
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    /// Print the startup banner.
    pub fn print_banner(&self, server: &str, user: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("ragreader"),
            ResetColor,
            Print(" - Preparing your documents\n"),
            SetForegroundColor(Colors::DIM),
            Print(format!("Server: {} | User: {}\n", server, user)),
            Print("Ctrl+C stops waiting; the server keeps ingesting.\n"),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Redraw the single progress line for the current view.
    pub fn render_view(&self, view: &ControllerView) -> Result<()> {
        let mut stdout = io::stdout();
        let job = view
            .job_id
            .as_ref()
            .map(|id| format!(" [job {}]", id.short()))
            .unwrap_or_default();
        execute!(
            stdout,
            Print("\r"),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(Colors::BAR),
            Print(progress_bar(view.progress)),
            ResetColor,
            Print(format!(" {:>3}% ", view.progress)),
            SetForegroundColor(Colors::PHASE),
            Print(view.phase.message()),
            SetForegroundColor(Colors::DIM),
            Print(job),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print the panel shown when the job or its creation failed.
    pub fn print_failure(&self, view: &ControllerView) -> Result<()> {
        let message = view
            .error
            .as_deref()
            .or(view.init_error.as_deref())
            .unwrap_or(Phase::Failed.message());
        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("\n\n"),
            SetForegroundColor(Colors::ERROR),
            Print(format!("{}\n", Phase::Failed.message())),
            Print(format!("  {}\n", message)),
            ResetColor,
            SetForegroundColor(Colors::DIM),
            Print(format!("{}\n", FAILURE_HINT)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print the answer of a query, followed by any retrieved passages.
    pub fn print_answer(&self, reply: &ServerMessage) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::PHASE),
            Print(format!("{}\n", reply.answer().unwrap_or("(no answer)"))),
            ResetColor,
        )?;
        for (i, passage) in reply.context().iter().enumerate() {
            execute!(
                stdout,
                SetForegroundColor(Colors::DIM),
                Print(format!("  [{}] {}\n", i + 1, truncate(passage, 120))),
                ResetColor,
            )?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// Print an error message.
    pub fn print_error(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::ERROR),
            Print(format!("Error: {}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print an info message.
    pub fn print_info(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(format!("{}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }
}

/// [`Navigator`] that announces view changes on the terminal.
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, view: View) {
        let mut stdout = io::stdout();
        let result = match view {
            View::Chat => execute!(
                stdout,
                Print("\n\n"),
                SetForegroundColor(Colors::READY),
                Print(format!("{}\n", Phase::Ready.message())),
                ResetColor,
                SetForegroundColor(Colors::DIM),
                Print("Ask a question with: ragreader-cli ask \"...\"\n"),
                ResetColor,
            ),
            View::Error(payload) => execute!(
                stdout,
                SetForegroundColor(Colors::ERROR),
                Print(error_panel(&payload)),
                ResetColor,
            ),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to render navigation");
        }
    }
}

fn error_panel(payload: &ErrorPayload) -> String {
    format!(
        "{} {}\n{}\nRun: ragreader-cli login --username <name> --email <email>\n",
        payload.status, payload.error, payload.message
    )
}

fn progress_bar(progress: u8) -> String {
    let filled = usize::from(progress.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut)
}
