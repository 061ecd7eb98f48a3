use crate::cli::chat::context::SessionContext;
use crate::cli::chat::conversation_state::{Message, Role};
use crate::cli::chat::language::LanguageMode;

/// Literal reply tag for Nepglish-classified messages.
pub const NEPGLISH_MARKER: &str = "[NEPGLISH]";
/// Literal reply tag for English-classified messages.
pub const ENGLISH_MARKER: &str = "[ENGLISH ONLY]";

/// Fixed persona and culture-awareness instruction.
///
/// Deliberately free of the literal reply tags: a Devanagari turn must
/// produce a prompt that contains neither marker, so the tag convention is
/// only ever spelled out on the marker line itself.
const PERSONA: &str = "\
You are Kancha, a friendly bilingual AI assistant built for Nepali users.
You are equally at home in English, in Nepali written in Devanagari, and in
Romanized Nepali (Nepglish). You know Nepal's culture and daily life:
festivals such as Dashain and Tihar, the education system (SEE, +2, IOE
entrance, Lok Sewa), food, places, and customs. Be warm, concise, and
practical, and briefly explain Nepali cultural terms when the user seems
unfamiliar with them.

A reply tag may follow these instructions; obey it exactly. When the user's
message is written in Devanagari script and no reply tag is present, reply
in Devanagari. If a block of current web search results is included, ground
any time-sensitive answer in that block.";

/// The instruction payload for one generation call: the system text built
/// from persona, session context, reply tag, and optional search context,
/// followed by the conversation turns in arrival order (new user message
/// last).
#[derive(Debug, Clone)]
pub struct ComposedPrompt {
    pub system_text: String,
    pub turns: Vec<(Role, String)>,
}

impl ComposedPrompt {
    /// Flatten the whole prompt to one string, system text first, then each
    /// turn prefixed with its wire role. Used for debug logging and tests.
    pub fn transcript(&self) -> String {
        let mut out = self.system_text.clone();
        for (role, text) in &self.turns {
            out.push_str("\n\n");
            out.push_str(role.wire_name());
            out.push_str(": ");
            out.push_str(text);
        }
        out
    }
}

/// Builds the instruction payload sent to the generation service.
///
/// Pure construction: composing has no side effects and the same inputs
/// always yield the same prompt.
pub struct PromptComposer {
    context: SessionContext,
}

impl PromptComposer {
    pub fn new(context: SessionContext) -> Self {
        Self { context }
    }

    /// Compose the prompt for one turn.
    ///
    /// `history` is the prior conversation only; `user_text` becomes the
    /// final turn. The mode decides the reply tag: Nepglish and English get
    /// their literal markers, Devanagari gets none and relies on the persona
    /// instruction instead.
    pub fn compose(
        &self,
        mode: LanguageMode,
        user_text: &str,
        history: &[Message],
        search_context: Option<&str>,
    ) -> ComposedPrompt {
        let mut system_text = String::from(PERSONA);

        system_text.push_str("\n\n# Session\n");
        system_text.push_str(&self.context.summary());

        if let Some(marker) = marker_line(mode) {
            system_text.push_str("\n\n");
            system_text.push_str(&marker);
        }

        if let Some(context) = search_context {
            system_text.push_str("\n\n");
            system_text.push_str(context);
        }

        let mut turns: Vec<(Role, String)> = history
            .iter()
            .map(|message| (message.role, message.text.clone()))
            .collect();
        turns.push((Role::User, user_text.to_string()));

        ComposedPrompt { system_text, turns }
    }
}

/// The reply-tag line for a mode, or None for Devanagari.
fn marker_line(mode: LanguageMode) -> Option<String> {
    match mode {
        LanguageMode::Nepglish => Some(format!(
            "{NEPGLISH_MARKER} Reply in Romanized Nepali (Latin script), mixing in English naturally the way Nepalis text."
        )),
        LanguageMode::English => Some(format!("{ENGLISH_MARKER} Reply in English only.")),
        LanguageMode::Devanagari => None,
    }
}
