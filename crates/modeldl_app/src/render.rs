//! Plain-text rendering of the session view.

use modeldl_core::{DownloadViewModel, Phase};

/// One progress line, e.g. `[ 42%] Downloading... model.safetensors`.
pub fn render_line(view: &DownloadViewModel) -> String {
    let mut line = format!(
        "[{:>3}%] {}",
        view.percentage,
        view.status_label.unwrap_or("Idle")
    );
    if !view.filename.is_empty() {
        line.push(' ');
        line.push_str(&view.filename);
    }
    if let Some(message) = &view.error_message {
        line.push_str(": ");
        line.push_str(message);
    }
    line
}

pub fn summary(view: &DownloadViewModel) -> String {
    match view.phase {
        Phase::Completed if view.filename.is_empty() => "Download Complete".to_string(),
        Phase::Completed => format!("Download Complete: {}", view.filename),
        Phase::Failed => format!(
            "Download Failed: {}",
            view.error_message.as_deref().unwrap_or("unknown error")
        ),
        Phase::Idle => "Download cancelled".to_string(),
        Phase::Connecting | Phase::InProgress => "Download still running".to_string(),
    }
}
