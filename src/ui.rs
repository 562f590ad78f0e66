//! Terminal presentation of the assistant state
//!
//! Pure rendering only: the view is a function of the recording flag and
//! the response text.

use crate::app::ViewState;

/// Label for the record toggle, depending on the recording flag
#[must_use]
pub const fn toggle_label(recording: bool) -> &'static str {
    if recording {
        "stop recording"
    } else {
        "start talking"
    }
}

/// Render the current view as terminal text
#[must_use]
pub fn render(view: &ViewState, assistant_name: &str) -> String {
    let mut out = String::new();

    if !view.response_text.is_empty() {
        out.push_str(assistant_name);
        out.push_str(": ");
        out.push_str(&view.response_text);
        out.push('\n');
    }

    out.push_str("[Enter] ");
    out.push_str(toggle_label(view.recording));
    out.push_str("  [q] quit\n");

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_label_follows_state() {
        assert_eq!(toggle_label(false), "start talking");
        assert_eq!(toggle_label(true), "stop recording");
    }

    #[test]
    fn test_render_without_response() {
        let view = ViewState::default();
        let out = render(&view, "Sophia");

        assert!(!out.contains("Sophia:"));
        assert!(out.contains("start talking"));
    }

    #[test]
    fn test_render_with_response() {
        let view = ViewState {
            recording: false,
            response_text: "hello".to_string(),
            audio_url: String::new(),
        };

        let out = render(&view, "Sophia");
        assert!(out.contains("Sophia: hello"));
    }

    #[test]
    fn test_render_never_shows_audio_url() {
        let view = ViewState {
            recording: true,
            response_text: "hello".to_string(),
            audio_url: "http://127.0.0.1:8000/media/out.mp3".to_string(),
        };

        let out = render(&view, "Sophia");
        assert!(!out.contains("/media/out.mp3"));
        assert!(out.contains("stop recording"));
    }
}
