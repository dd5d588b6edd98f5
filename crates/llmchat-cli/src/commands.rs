/// What the user asked for at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Message(String),
    New,
    List,
    Switch(String),
    Delete(Option<String>),
    Title(String),
    Help,
    Unknown(String),
    Empty,
    Exit,
}

pub const HELP: &str = "\
/new              start a new conversation
/list             list conversations
/switch <id>      make a conversation active
/delete [id]      delete a conversation (the active one by default)
/title <text>     rename the active conversation
exit              leave";

pub fn parse_input(input: &str) -> Command {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }
    if trimmed.eq_ignore_ascii_case("exit") {
        return Command::Exit;
    }

    let Some(command) = trimmed.strip_prefix('/') else {
        return Command::Message(trimmed.to_string());
    };
    let (name, argument) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match (name, argument) {
        ("exit" | "quit", _) => Command::Exit,
        ("new", _) => Command::New,
        ("list", _) => Command::List,
        ("help", _) => Command::Help,
        ("switch", id) if !id.is_empty() => Command::Switch(id.to_string()),
        ("delete", "") => Command::Delete(None),
        ("delete", id) => Command::Delete(Some(id.to_string())),
        ("title", title) if !title.is_empty() => Command::Title(title.to_string()),
        _ => Command::Unknown(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_message() {
        assert_eq!(
            parse_input("  what is a lifetime?\n"),
            Command::Message("what is a lifetime?".to_string())
        );
        assert_eq!(parse_input("   "), Command::Empty);
    }

    #[test]
    fn test_exit_variants() {
        assert_eq!(parse_input("exit"), Command::Exit);
        assert_eq!(parse_input("EXIT"), Command::Exit);
        assert_eq!(parse_input("/quit"), Command::Exit);
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(
            parse_input("/switch 1718000000000"),
            Command::Switch("1718000000000".to_string())
        );
        assert_eq!(parse_input("/delete"), Command::Delete(None));
        assert_eq!(
            parse_input("/delete 42"),
            Command::Delete(Some("42".to_string()))
        );
        assert_eq!(
            parse_input("/title  Borrow checker  "),
            Command::Title("Borrow checker".to_string())
        );
    }

    #[test]
    fn test_missing_arguments_are_unknown() {
        assert_eq!(parse_input("/switch"), Command::Unknown("switch".to_string()));
        assert_eq!(parse_input("/title"), Command::Unknown("title".to_string()));
        assert_eq!(parse_input("/frobnicate"), Command::Unknown("frobnicate".to_string()));
    }
}
