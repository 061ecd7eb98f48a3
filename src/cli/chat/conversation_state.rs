use crate::cli::chat::language::LanguageMode;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Role name on the Gemini wire, which calls the assistant "model".
    pub fn wire_name(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "model",
        }
    }
}

/// One immutable entry in the conversation history.
///
/// User messages always carry the language mode they were classified with;
/// assistant messages never do.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub detected_mode: Option<LanguageMode>,
}

impl Message {
    pub fn user(text: impl Into<String>, mode: LanguageMode) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            detected_mode: Some(mode),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            detected_mode: None,
        }
    }
}

/// Ordered, append-only conversation history for one session.
///
/// Owned by the chat loop and passed by reference into the composer; nothing
/// else holds or mutates it. Messages are never edited or deleted within a
/// session, only cleared wholesale.
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self { messages: Vec::new() }
    }

    pub fn add_user_message(&mut self, text: &str, mode: LanguageMode) {
        self.messages.push(Message::user(text, mode));
    }

    pub fn add_assistant_message(&mut self, text: &str) {
        self.messages.push(Message::assistant(text));
    }

    /// All messages in arrival order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
