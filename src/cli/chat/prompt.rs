use std::path::PathBuf;

use rustyline::{Config, Editor, Result};

pub fn generate_prompt(custom_prompt: Option<&str>) -> String {
    custom_prompt.unwrap_or("> ").to_string()
}

/// Where readline history persists between sessions, when a config
/// directory exists on this platform.
pub fn history_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("kancha").join("history.txt"))
}

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(rustyline::CompletionType::List)
        .build();
    let mut editor = Editor::with_config(config)?;

    if let Some(path) = history_path() {
        // No history yet is the normal first-run case.
        let _ = editor.load_history(&path);
    }

    Ok(editor)
}

pub fn save_history(editor: &mut Editor<()>) {
    if let Some(path) = history_path() {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = editor.save_history(&path);
    }
}
