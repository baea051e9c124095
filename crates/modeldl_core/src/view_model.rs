use crate::{Phase, SessionMachine};

/// What the presentation layer needs to draw the form and progress panel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DownloadViewModel {
    pub phase: Phase,
    pub percentage: u8,
    pub filename: String,
    pub error_message: Option<String>,
    /// Validation message for the URL field.
    pub field_error: Option<String>,
    pub status_label: Option<&'static str>,
    pub submit_label: &'static str,
    pub form_enabled: bool,
    pub show_progress: bool,
}

impl DownloadViewModel {
    pub(crate) fn from_machine(machine: &SessionMachine) -> Self {
        let snapshot = machine.snapshot();
        let phase = snapshot.phase();
        let busy = machine.is_submitting() || phase.is_active();
        Self {
            phase,
            percentage: snapshot.percentage(),
            filename: snapshot.filename().to_string(),
            error_message: snapshot.error_message().map(ToOwned::to_owned),
            field_error: machine.field_error().map(ToString::to_string),
            status_label: status_label(phase),
            submit_label: if busy { "Downloading..." } else { "Start Download" },
            form_enabled: !busy,
            show_progress: phase != Phase::Idle,
        }
    }
}

fn status_label(phase: Phase) -> Option<&'static str> {
    match phase {
        Phase::Idle => None,
        Phase::Connecting => Some("Connecting..."),
        Phase::InProgress => Some("Downloading..."),
        Phase::Completed => Some("Download Complete"),
        Phase::Failed => Some("Download Failed"),
    }
}
