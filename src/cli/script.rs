//! Ordered batch commands from raw command-line tokens.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchCommand {
    Purge,
    Add(PathBuf),
    Remove(PathBuf),
    Reindex,
    List,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScriptError {
    #[error("'{0}' requires a path")]
    MissingOperand(String),

    #[error("unknown command '{0}'")]
    UnknownToken(String),
}

/// Parse tokens into commands, keeping their order.
pub fn parse_commands<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<BatchCommand>, ScriptError> {
    let mut commands = Vec::new();
    let mut tokens = tokens.iter().map(AsRef::as_ref);

    while let Some(token) = tokens.next() {
        let command = match token {
            "--purge" => BatchCommand::Purge,
            "--reindex" => BatchCommand::Reindex,
            "--list" => BatchCommand::List,
            "--add" | "--rm" => {
                let path = tokens
                    .next()
                    .map(PathBuf::from)
                    .ok_or_else(|| ScriptError::MissingOperand(token.to_string()))?;
                if token == "--add" {
                    BatchCommand::Add(path)
                } else {
                    BatchCommand::Remove(path)
                }
            }
            other => return Err(ScriptError::UnknownToken(other.to_string())),
        };
        commands.push(command);
    }

    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_preserved() {
        let commands =
            parse_commands(&["--purge", "--add", "/a", "--rm", "/b", "--reindex", "--list"])
                .unwrap();
        assert_eq!(
            commands,
            vec![
                BatchCommand::Purge,
                BatchCommand::Add(PathBuf::from("/a")),
                BatchCommand::Remove(PathBuf::from("/b")),
                BatchCommand::Reindex,
                BatchCommand::List,
            ]
        );
    }

    #[test]
    fn test_commands_repeat() {
        let commands = parse_commands(&["--list", "--add", "/a", "--list"]).unwrap();
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0], commands[2]);
    }

    #[test]
    fn test_missing_operand() {
        assert_eq!(
            parse_commands(&["--list", "--add"]),
            Err(ScriptError::MissingOperand("--add".to_string()))
        );
    }

    #[test]
    fn test_unknown_token() {
        assert_eq!(
            parse_commands(&["--list", "/stray"]),
            Err(ScriptError::UnknownToken("/stray".to_string()))
        );
    }

    #[test]
    fn test_empty() {
        let empty: [&str; 0] = [];
        assert!(parse_commands(&empty).unwrap().is_empty());
    }
}
