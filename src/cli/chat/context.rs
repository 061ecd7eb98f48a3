use std::env;

/// Per-session facts woven into the system instruction.
///
/// The date matters for a Nepal-focused assistant: questions about "the
/// current government" or festival dates are time-sensitive, and the model
/// is told to defer to the search-context block for anything newer than its
/// training data.
pub struct SessionContext {
    pub today: String,
    pub username: String,
}

impl SessionContext {
    pub fn new() -> Self {
        let today = chrono::Local::now().format("%B %d, %Y").to_string();

        let username = env::var("USER")
            .or_else(|_| env::var("USERNAME"))
            .unwrap_or_else(|_| "friend".to_string());

        Self { today, username }
    }

    pub fn summary(&self) -> String {
        format!("Today's date: {}\nUser's login name: {}", self.today, self.username)
    }
}
