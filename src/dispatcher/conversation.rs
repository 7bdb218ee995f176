//! Turns a chat request into model conversation turns.

use tracing::{debug, warn};

use crate::media::{decode_image, detect_mime_type};
use crate::model::{Content, Part, ROLE_MODEL, ROLE_USER};
use crate::models::ChatRequest;
use crate::prompts::build_chat_prompt;

/// Model turn that acknowledges the system instruction.
pub const ACKNOWLEDGEMENT: &str =
    "Understood. I'll provide plant care assistance with JSON responses.";

/// Conversation ready to send, plus the messages whose image was dropped.
#[derive(Debug, Default)]
pub struct Conversation {
    pub contents: Vec<Content>,
    /// Indexes of messages whose image failed to decode
    pub dropped_images: Vec<usize>,
}

/// Maps client roles onto the model's vocabulary (`assistant` → `model`).
pub fn normalize_role(role: &str) -> String {
    match role {
        "assistant" => ROLE_MODEL.to_string(),
        other => other.to_string(),
    }
}

/// Builds the conversation for a chat request.
///
/// A non-empty history is preceded by the system prompt as a user turn and a
/// fixed model acknowledgement. Each message contributes its image (when it
/// decodes) and its text; messages left with no parts are skipped. An image
/// that fails to decode is dropped and recorded, and the message keeps its
/// text.
pub fn build_conversation(request: &ChatRequest) -> Conversation {
    let mut preamble = Vec::new();
    if !request.messages.is_empty() {
        preamble.push(Content::new(
            ROLE_USER,
            vec![Part::text(build_chat_prompt(&[], &request.context))],
        ));
        preamble.push(Content::new(ROLE_MODEL, vec![Part::text(ACKNOWLEDGEMENT)]));
    }

    let initial = Conversation {
        contents: preamble,
        dropped_images: Vec::new(),
    };

    request
        .messages
        .iter()
        .enumerate()
        .fold(initial, |mut conversation, (i, message)| {
            let role = normalize_role(&message.role());
            let mut parts = Vec::new();

            if let Some(encoded) = message.image() {
                match decode_image(encoded) {
                    Ok(bytes) => {
                        let mime_type = detect_mime_type(&bytes);
                        debug!(message = i, size = bytes.len(), mime_type, "Attaching image");
                        parts.push(Part::image(mime_type, bytes));
                    }
                    Err(e) => {
                        warn!(message = i, error = %e, "Failed to decode image, dropping it");
                        conversation.dropped_images.push(i);
                    }
                }
            }

            if !message.text().is_empty() {
                parts.push(Part::text(message.text()));
            }

            if parts.is_empty() {
                debug!(message = i, "Skipping message with no content");
            } else {
                debug!(message = i, role = %role, parts = parts.len(), "Adding turn");
                conversation.contents.push(Content::new(role, parts));
            }

            conversation
        })
}
