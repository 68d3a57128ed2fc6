//! Structured logging integration for events
//!
//! Converts domain events into tracing records with structured fields.

use otadex_events::{
    AppEvent, EventMessage, PackageEvent, RelocationEvent, SessionEvent, SkipReason,
};
use tracing::{debug, error, info, trace, warn};

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(message: &EventMessage) {
    let event = &message.event;
    let meta = &message.meta;

    match event {
        AppEvent::Session(session_event) => match session_event {
            SessionEvent::Prepared { total_packages } => {
                info!(
                    domain = meta.domain.as_str(),
                    event_id = %meta.event_id,
                    total_packages = total_packages,
                    "Dexopt session prepared"
                );
            }
            SessionEvent::CleanedUp => {
                debug!(
                    domain = meta.domain.as_str(),
                    event_id = %meta.event_id,
                    "Dexopt session cleaned up"
                );
            }
            SessionEvent::Exhausted { total_packages } => {
                info!(
                    domain = meta.domain.as_str(),
                    event_id = %meta.event_id,
                    total_packages = total_packages,
                    "All packages processed"
                );
            }
            SessionEvent::InvariantViolated { package } => {
                error!(
                    domain = meta.domain.as_str(),
                    event_id = %meta.event_id,
                    package = %package,
                    "Command queue left empty; session reset"
                );
            }
        },

        AppEvent::Package(package_event) => match package_event {
            PackageEvent::Processing {
                package,
                mode,
                remaining,
            } => {
                debug!(
                    domain = meta.domain.as_str(),
                    event_id = %meta.event_id,
                    package = %package,
                    mode = %mode,
                    remaining = remaining,
                    "Processing package for OTA dexopt"
                );
            }
            PackageEvent::CommandsGenerated { package, commands } => {
                trace!(
                    domain = meta.domain.as_str(),
                    event_id = %meta.event_id,
                    package = %package,
                    commands = commands,
                    "Commands generated"
                );
            }
            PackageEvent::Compiled { package } => {
                info!(
                    domain = meta.domain.as_str(),
                    event_id = %meta.event_id,
                    package = %package,
                    "Package compiled"
                );
            }
            PackageEvent::Skipped { package, reason } => match reason {
                SkipReason::LowSpace {
                    usable_bytes,
                    threshold_bytes,
                } => {
                    warn!(
                        domain = meta.domain.as_str(),
                        event_id = %meta.event_id,
                        package = %package,
                        usable_bytes = usable_bytes,
                        threshold_bytes = threshold_bytes,
                        "Package skipped: low space"
                    );
                }
                SkipReason::PolicyFailed { message } => {
                    warn!(
                        domain = meta.domain.as_str(),
                        event_id = %meta.event_id,
                        package = %package,
                        message = %message,
                        "Package skipped: policy failed"
                    );
                }
            },
            PackageEvent::Failed { package, failure } => {
                error!(
                    domain = meta.domain.as_str(),
                    event_id = %meta.event_id,
                    package = %package,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Package compilation failed"
                );
            }
        },

        AppEvent::Relocation(relocation_event) => match relocation_event {
            RelocationEvent::Started { packages } => {
                debug!(
                    domain = meta.domain.as_str(),
                    event_id = %meta.event_id,
                    packages = packages,
                    "Artifact relocation started"
                );
            }
            RelocationEvent::PackageSkipped { package, reason } => {
                warn!(
                    domain = meta.domain.as_str(),
                    event_id = %meta.event_id,
                    package = %package,
                    reason = %reason,
                    "Package skipped during relocation"
                );
            }
            RelocationEvent::ArtifactMoved {
                package,
                code_path,
                instruction_set,
            } => {
                debug!(
                    domain = meta.domain.as_str(),
                    event_id = %meta.event_id,
                    package = %package,
                    code_path = %code_path.display(),
                    instruction_set = %instruction_set,
                    "Artifact moved"
                );
            }
            RelocationEvent::ArtifactMoveFailed {
                package,
                code_path,
                instruction_set,
                message,
            } => {
                warn!(
                    domain = meta.domain.as_str(),
                    event_id = %meta.event_id,
                    package = %package,
                    code_path = %code_path.display(),
                    instruction_set = %instruction_set,
                    message = %message,
                    "Artifact move failed"
                );
            }
            RelocationEvent::Completed { report } => {
                info!(
                    domain = meta.domain.as_str(),
                    event_id = %meta.event_id,
                    scanned = report.packages_scanned,
                    attempted = report.attempted,
                    moved = report.moved,
                    failed = report.failed,
                    "Artifact relocation completed"
                );
            }
        },
    }
}

/// Whether an event should also be shown to the user on the terminal
pub fn is_user_visible(message: &EventMessage) -> bool {
    message.meta.level.is_user_visible()
}
