use serde::Serialize;
use serde_json::Value;

pub const TOKEN_TEXT_ID: &str = "token";
pub const TOKEN_REGION_ID: &str = "token_div";
pub const PERMISSION_REGION_ID: &str = "permission_div";
pub const MESSAGES_ID: &str = "messages";

pub const LOADING_TEXT: &str = "loading...";
pub const MESSAGE_HEADER_TEXT: &str = "Received message:";
pub const FETCH_ERROR_PREFIX: &str = "Error retrieving registration token. ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Token,
    PermissionRequest,
}

impl Region {
    pub fn element_id(self) -> &'static str {
        match self {
            Self::Token => TOKEN_REGION_ID,
            Self::PermissionRequest => PERMISSION_REGION_ID,
        }
    }

    /// Inline style applied to the region element.
    pub fn display_style(visible: bool) -> &'static str {
        if visible {
            "display: visible"
        } else {
            "display: none"
        }
    }
}

/// What the page is showing. Each state fixes the visibility of both
/// regions, so exactly one of them is visible after a render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum UiState {
    Loading,
    TokenShown(String),
    PermissionRequired,
    Error(String),
}

impl UiState {
    pub fn fetch_error(detail: impl std::fmt::Display) -> Self {
        Self::Error(format!("{FETCH_ERROR_PREFIX}{detail}"))
    }

    pub fn visible_region(&self) -> Region {
        match self {
            Self::PermissionRequired => Region::PermissionRequest,
            Self::Loading | Self::TokenShown(_) | Self::Error(_) => Region::Token,
        }
    }

    pub fn token_text(&self) -> Option<&str> {
        match self {
            Self::Loading => Some(LOADING_TEXT),
            Self::TokenShown(text) | Self::Error(text) => Some(text),
            Self::PermissionRequired => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("element #{0} is missing from the document")]
    MissingElement(String),
    #[error("dom operation failed: {0}")]
    Dom(String),
    #[error("message payload is not serializable: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The page surface. Implementations write straight into the DOM; the
/// controller only talks to this trait.
pub trait Renderer {
    fn show_token(&self, text: &str) -> Result<(), RenderError>;
    fn show_region(&self, region: Region, visible: bool) -> Result<(), RenderError>;
    /// Appends a header and a body holding `body_text` to the log.
    fn append_message_text(&self, header: &str, body_text: &str) -> Result<(), RenderError>;
    fn clear_messages(&self) -> Result<(), RenderError>;

    fn append_message(&self, payload: &Value) -> Result<(), RenderError> {
        let body = format_payload(payload)?;
        self.append_message_text(MESSAGE_HEADER_TEXT, &body)
    }

    fn render(&self, state: &UiState) -> Result<(), RenderError> {
        let visible = state.visible_region();
        match visible {
            Region::Token => {
                self.show_region(Region::PermissionRequest, false)?;
                self.show_region(Region::Token, true)?;
            }
            Region::PermissionRequest => {
                self.show_region(Region::Token, false)?;
                self.show_region(Region::PermissionRequest, true)?;
            }
        }
        if let Some(text) = state.token_text() {
            self.show_token(text)?;
        }
        Ok(())
    }
}

/// Two-space indented JSON, matching what the log shows.
pub fn format_payload(payload: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingRenderer;
    use serde_json::json;

    #[test]
    fn every_state_shows_exactly_one_region() {
        let states = [
            UiState::Loading,
            UiState::TokenShown("T".to_string()),
            UiState::PermissionRequired,
            UiState::fetch_error("boom"),
        ];
        for state in states {
            let renderer = RecordingRenderer::default();
            renderer.render(&state).expect("render");
            let token = renderer.region_visible(Region::Token);
            let permission = renderer.region_visible(Region::PermissionRequest);
            assert_ne!(token, permission, "state {state:?}");
            assert_eq!(
                permission,
                state == UiState::PermissionRequired,
                "state {state:?}"
            );
        }
    }

    #[test]
    fn loading_writes_placeholder() {
        let renderer = RecordingRenderer::default();
        renderer.render(&UiState::Loading).expect("render");
        assert_eq!(renderer.token_text(), "loading...");
    }

    #[test]
    fn permission_required_leaves_token_text_alone() {
        let renderer = RecordingRenderer::default();
        renderer
            .render(&UiState::TokenShown("OLD".to_string()))
            .expect("render");
        renderer.render(&UiState::PermissionRequired).expect("render");
        assert_eq!(renderer.token_text(), "OLD");
    }

    #[test]
    fn fetch_error_text_carries_detail() {
        let state = UiState::fetch_error("net down");
        assert_eq!(
            state.token_text(),
            Some("Error retrieving registration token. net down")
        );
    }

    #[test]
    fn payload_is_pretty_printed_with_two_spaces() {
        let text = format_payload(&json!({"notification": {"title": "hi"}})).expect("format");
        assert_eq!(
            text,
            "{\n  \"notification\": {\n    \"title\": \"hi\"\n  }\n}"
        );
    }

    #[test]
    fn appended_messages_keep_arrival_order_and_round_trip() {
        let renderer = RecordingRenderer::default();
        let payloads = vec![
            json!({"data": {"n": 1}}),
            json!({"from": "1234", "data": {"n": 2, "tags": ["a", "b"]}}),
            json!([1, null, "three"]),
        ];
        for payload in &payloads {
            renderer.append_message(payload).expect("append");
        }

        let nodes = renderer.message_nodes();
        assert_eq!(nodes.len(), payloads.len() * 2);
        for (pair, payload) in nodes.chunks(2).zip(&payloads) {
            assert_eq!(pair[0], MESSAGE_HEADER_TEXT);
            let parsed: Value = serde_json::from_str(&pair[1]).expect("parse body");
            assert_eq!(&parsed, payload);
        }
    }

    #[test]
    fn clear_messages_empties_log_regardless_of_count() {
        let renderer = RecordingRenderer::default();
        for n in 0..5 {
            renderer.append_message(&json!({"n": n})).expect("append");
        }
        renderer.clear_messages().expect("clear");
        assert!(renderer.message_nodes().is_empty());
        renderer.clear_messages().expect("clear empty log");
        assert!(renderer.message_nodes().is_empty());
    }
}
