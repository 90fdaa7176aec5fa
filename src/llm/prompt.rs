//! Instruction texts and user-message construction.
//!
//! [`PromptBuilder`] holds the three system instructions the pipeline uses:
//! * **calibration**: correct a transcript chunk without changing meaning;
//! * **key points**: map stage of summarization;
//! * **synthesis**: reduce stage of summarization.
//!
//! Each one can be replaced through [`PromptConfig`]; the built-in defaults
//! below are used otherwise. The builder also wraps a chunk with the last
//! sentence of the chunk before it.

use crate::config::PromptConfig;

// ---------------------------------------------------------------------------
// Built-in instructions
// ---------------------------------------------------------------------------

/// Transcript calibration: remove disfluencies, fix recognition errors, keep
/// every detail.
pub const DEFAULT_CALIBRATION_PROMPT: &str = "\
You are a transcript calibration specialist.
Task: turn a raw speech-recognition transcript into clean written text
without losing or adding information.

Rules:
1. Remove pauses, false starts, repetitions and filler words.
2. Fix mis-recognised words, homophones and wrong characters.
3. Keep every fact, name, number and detail of the original.
4. Calibrate only. Do not rewrite, summarise or shorten the content.
5. Keep the original meaning and language.
6. Reply with ONLY the calibrated text, no explanation or commentary.";

/// Map stage: extract the key points of one excerpt.
pub const DEFAULT_KEY_POINTS_PROMPT: &str = "\
You are an analyst reading one excerpt of a longer transcript.
Task: extract the key points of this excerpt.

Rules:
1. List the main topics, claims, decisions, facts and figures.
2. Keep names, numbers and dates exactly as written.
3. Be concise; one point per line.
4. Do not add information that is not in the excerpt.
5. Reply with ONLY the list of key points.";

/// Reduce stage: write one coherent analysis from the combined points.
pub const DEFAULT_SYNTHESIS_PROMPT: &str = "\
You are an analyst writing a summary of a full transcript.
Task: write one coherent, well-structured summary from the material below.

Rules:
1. Cover the overall subject, the main points and any conclusions.
2. Merge overlapping points and order them logically.
3. Write flowing prose as a direct analysis of the transcript.
4. Never mention that the material was a list, excerpts or extracted points.
5. Reply with ONLY the summary.";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Resolves instruction texts and builds user messages.
///
/// # Example
/// ```rust
/// use transcript_calibrate::llm::PromptBuilder;
///
/// let builder = PromptBuilder::default();
/// let user = builder.user_content("Second part.", Some("First part."));
/// assert!(user.contains("First part."));
/// assert!(user.contains("Second part."));
/// ```
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    calibration: String,
    key_points: String,
    synthesis: String,
}

impl PromptBuilder {
    /// Build from config overrides, falling back to the built-in texts for
    /// anything unset or blank.
    pub fn from_config(config: &PromptConfig) -> Self {
        fn pick(custom: &Option<String>, default: &str) -> String {
            custom
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(default)
                .to_string()
        }

        Self {
            calibration: pick(&config.calibration, DEFAULT_CALIBRATION_PROMPT),
            key_points: pick(&config.key_points, DEFAULT_KEY_POINTS_PROMPT),
            synthesis: pick(&config.synthesis, DEFAULT_SYNTHESIS_PROMPT),
        }
    }

    pub fn calibration(&self) -> &str {
        &self.calibration
    }

    pub fn key_points(&self) -> &str {
        &self.key_points
    }

    pub fn synthesis(&self) -> &str {
        &self.synthesis
    }

    /// Build the user message for one chunk.
    ///
    /// Without context the chunk text goes out verbatim. With context the
    /// message quotes the preceding sentence and tells the model to return
    /// only the new text, not the context.
    pub fn user_content(&self, text: &str, context: Option<&str>) -> String {
        match context.filter(|c| !c.trim().is_empty()) {
            None => text.to_string(),
            Some(ctx) => format!(
                "For continuity, this is the last sentence that comes right before the current text:\n\
                 ---CONTEXT---\n{ctx}\n---END CONTEXT---\n\n\
                 Process and return only the following new text. \
                 Do not repeat the context above in your reply:\n\
                 ---TEXT---\n{text}\n---END TEXT---"
            ),
        }
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::from_config(&PromptConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_distinct() {
        let builder = PromptBuilder::default();
        assert_eq!(builder.calibration(), DEFAULT_CALIBRATION_PROMPT);
        assert_ne!(builder.key_points(), builder.synthesis());
        assert_ne!(builder.calibration(), builder.key_points());
    }

    #[test]
    fn synthesis_forbids_mentioning_points() {
        let builder = PromptBuilder::default();
        assert!(builder.synthesis().contains("Never mention"));
    }

    #[test]
    fn overrides_replace_defaults() {
        let config = PromptConfig {
            calibration: Some("Fix it.".into()),
            key_points: None,
            synthesis: Some("   ".into()),
        };
        let builder = PromptBuilder::from_config(&config);

        assert_eq!(builder.calibration(), "Fix it.");
        assert_eq!(builder.key_points(), DEFAULT_KEY_POINTS_PROMPT);
        // Blank override is ignored.
        assert_eq!(builder.synthesis(), DEFAULT_SYNTHESIS_PROMPT);
    }

    #[test]
    fn no_context_sends_text_verbatim() {
        let builder = PromptBuilder::default();
        assert_eq!(builder.user_content("raw chunk", None), "raw chunk");
        assert_eq!(builder.user_content("raw chunk", Some("  ")), "raw chunk");
    }

    #[test]
    fn context_is_wrapped_with_no_repeat_instruction() {
        let builder = PromptBuilder::default();
        let user = builder.user_content("New text.", Some("Old sentence."));

        assert!(user.contains("---CONTEXT---\nOld sentence.\n---END CONTEXT---"));
        assert!(user.contains("---TEXT---\nNew text.\n---END TEXT---"));
        assert!(user.contains("Do not repeat the context"));
        let ctx_pos = user.find("Old sentence.").unwrap();
        let text_pos = user.find("New text.").unwrap();
        assert!(ctx_pos < text_pos);
    }
}
