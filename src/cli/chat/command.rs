use winnow::branch::alt;
use winnow::bytes::tag;
use winnow::sequence::preceded;
use winnow::IResult;
use winnow::Parser;

/// What one line of user input asks the chat loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Clear,
    History,
    Quit,
    /// A plain chat message for the model.
    Ask(String),
    /// Looked like a slash command but matched nothing known.
    Unknown(String),
}

fn slash_command(input: &str) -> IResult<&str, Command> {
    preceded(
        '/',
        alt((
            tag("help").value(Command::Help),
            tag("clear").value(Command::Clear),
            tag("history").value(Command::History),
            alt((tag("quit"), tag("exit"), tag("q"))).value(Command::Quit),
        )),
    )
    .parse_next(input)
}

/// Classify a line of input. Slash commands are case-sensitive and take no
/// arguments; anything else is a message for the model.
pub fn parse(line: &str) -> Command {
    let trimmed = line.trim();

    if trimmed.starts_with('/') {
        return match slash_command(trimmed) {
            Ok((rest, command)) if rest.trim().is_empty() => command,
            _ => Command::Unknown(trimmed.to_string()),
        };
    }

    Command::Ask(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_commands_parse() {
        assert_eq!(parse("/help"), Command::Help);
        assert_eq!(parse("/clear"), Command::Clear);
        assert_eq!(parse("/history"), Command::History);
        assert_eq!(parse("/quit"), Command::Quit);
    }

    #[test]
    fn quit_aliases_parse() {
        assert_eq!(parse("/exit"), Command::Quit);
        assert_eq!(parse("/q"), Command::Quit);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(parse("  /clear  "), Command::Clear);
    }

    #[test]
    fn unknown_slash_input_is_flagged() {
        assert_eq!(parse("/halp"), Command::Unknown("/halp".to_string()));
        assert_eq!(parse("/historyy"), Command::Unknown("/historyy".to_string()));
        assert_eq!(parse("/"), Command::Unknown("/".to_string()));
    }

    #[test]
    fn plain_text_becomes_a_question() {
        assert_eq!(parse("k cha bro?"), Command::Ask("k cha bro?".to_string()));
        assert_eq!(
            parse("tell me about /help pages"),
            Command::Ask("tell me about /help pages".to_string())
        );
    }
}
