//! Prompt builders for the analyze and chat operations.

use crate::models::{ChatMessage, PlantContext};

const UNKNOWN: &str = "Unknown";

fn or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(UNKNOWN)
}

/// Builds the instruction sent alongside a plant photo.
pub fn build_analyze_prompt(context: &PlantContext) -> String {
    let plant_name = or_unknown(&context.plant_name);

    let mut prompt = format!(
        "You are a plant health assistant. Analyze the plant photo and return JSON only. \
         Do not include extra text or markdown.\n\n\
         Return a JSON object with exactly these keys:\n\
         status (one of: healthy, needs_attention, critical),\n\
         confidence (0.0 to 1.0),\n\
         issues (array of strings),\n\
         recommendations (array of strings),\n\
         suggested_interval_days (number),\n\
         rationale (string),\n\
         suggested_name (string, optional - provide if plant_name is Unknown).\n\n\
         Context:\n\
         - plant_name: {}\n\
         - species: {}\n\
         - season: {}\n\
         - current_date: {}\n\
         - last_watered: {}\n",
        plant_name,
        or_unknown(&context.species),
        or_unknown(&context.season),
        or_unknown(&context.current_date),
        or_unknown(&context.last_watered),
    );

    if plant_name == UNKNOWN {
        prompt.push_str(
            "\nNOTE: The user has not provided a name for this plant. \
             Please analyze the image and suggest an appropriate name in the 'suggested_name' field. \
             This could be the common name or scientific name based on what you can identify.\n",
        );
    }

    if let Some(question) = &context.custom_prompt {
        prompt.push_str(&format!("\nUser's specific question/concern: {}\n", question));
        prompt.push_str("Please address this question in your analysis.\n");
    }

    prompt.push_str("\nIf information is uncertain, state that in the rationale.");
    prompt
}

/// Builds the chat system prompt.
///
/// With an empty `history` only the system instruction is returned, which is
/// what the multimodal conversation uses. A non-empty history is appended as
/// a plain-text transcript.
pub fn build_chat_prompt(history: &[ChatMessage], context: &PlantContext) -> String {
    let system_prompt = format!(
        "You are a plant care assistant. Respond to the user and return JSON only. \
         Do not include extra text or markdown.\n\n\
         Return a JSON object with exactly these keys:\n\
         reply (string),\n\
         action_suggestions (array of strings),\n\
         safety_note (string, optional).\n\n\
         Plant context:\n\
         - plant_name: {}\n\
         - species: {}\n\
         - current_date: {}\n\
         - last_assessment_status: {}\n\n\
         If the user has attached an image, analyze it in your response. \
         Reference images in the conversation history when relevant \
         (e.g., 'Based on the photo you shared earlier...').",
        or_unknown(&context.plant_name),
        or_unknown(&context.species),
        or_unknown(&context.current_date),
        or_unknown(&context.last_assessment_status),
    );

    if history.is_empty() {
        return system_prompt;
    }

    let lines: Vec<String> = history
        .iter()
        .filter(|msg| !msg.text().is_empty())
        .map(|msg| {
            let image_note = if msg.image().is_some() { " [with image]" } else { "" };
            format!("{}: {}{}", msg.role(), msg.text(), image_note)
        })
        .collect();

    let transcript = if lines.is_empty() {
        "user: (no messages)".to_string()
    } else {
        lines.join("\n")
    };

    format!("{}\n\nConversation:\n{}\n", system_prompt, transcript)
}
