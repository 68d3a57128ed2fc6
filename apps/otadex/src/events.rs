//! Event handling and terminal feedback

use console::{style, Term};
use otadex_events::{
    AppEvent, EventMessage, PackageEvent, RelocationEvent, SessionEvent, SkipReason,
};

use crate::logging::{is_user_visible, log_event_with_tracing};

/// Routes events to tracing and, in tty mode, to the terminal
pub struct EventHandler {
    colors_enabled: bool,
    debug_enabled: bool,
    interactive: bool,
    term: Term,
}

impl EventHandler {
    /// Create new event handler
    pub fn new(colors_enabled: bool, debug_enabled: bool, interactive: bool) -> Self {
        Self {
            colors_enabled,
            debug_enabled,
            interactive,
            term: Term::stderr(),
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: EventMessage) {
        log_event_with_tracing(&message);

        if !self.interactive {
            return;
        }

        match &message.event {
            AppEvent::Session(SessionEvent::Prepared { total_packages }) => {
                self.show_status(&format!("Prepared {total_packages} packages"));
            }
            AppEvent::Package(PackageEvent::Compiled { package }) if self.debug_enabled => {
                self.show_status(&format!("Compiled {package}"));
            }
            _ if is_user_visible(&message) => self.show_problem(&message),
            _ => {}
        }
    }

    fn show_status(&self, line: &str) {
        let line = if self.colors_enabled {
            style(line).cyan().to_string()
        } else {
            line.to_string()
        };
        let _ = self.term.write_line(&line);
    }

    fn show_problem(&self, message: &EventMessage) {
        let text = describe(&message.event);
        let line = if self.colors_enabled {
            format!("{} {text}", style("warning:").yellow().bold())
        } else {
            format!("warning: {text}")
        };
        let _ = self.term.write_line(&line);
    }
}

/// One-line human description of a warning or error event
fn describe(event: &AppEvent) -> String {
    match event {
        AppEvent::Package(PackageEvent::Skipped { package, reason }) => match reason {
            SkipReason::LowSpace {
                usable_bytes,
                threshold_bytes,
            } => format!("skipped {package}: {usable_bytes} bytes free, {threshold_bytes} required"),
            SkipReason::PolicyFailed { message } => format!("skipped {package}: {message}"),
        },
        AppEvent::Package(PackageEvent::Failed { package, failure }) => {
            format!("{package} failed: {}", failure.message)
        }
        AppEvent::Session(SessionEvent::InvariantViolated { package }) => {
            format!("command queue for {package} was empty; session reset")
        }
        AppEvent::Relocation(RelocationEvent::PackageSkipped { package, reason }) => {
            format!("not relocating {package}: {reason}")
        }
        other => format!("{other:?}"),
    }
}
