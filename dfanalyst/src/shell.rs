//! Interactive line-oriented shell.
//!
//! Each line is `<tool> [json-arguments]`. Results are printed as pretty
//! JSON; failures as `Error [kind]: message`.

use dfanalyst_core::Analyst;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::tools::{TOOL_NAMES, call_tool, is_tool};

/// Prompt printed before each command.
pub const PROMPT: &str = "dfanalyst> ";

const BANNER: &str = "dfanalyst shell. Type 'help' for commands, 'exit' to quit.";

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    /// Blank line
    Empty,
    /// `help` or `?`
    Help,
    /// `exit` or `quit`
    Exit,
    /// Tool invocation with parsed JSON arguments
    Call { tool: String, arguments: Value },
    /// Unrecognized command word
    Unknown(String),
    /// Tool name followed by unparseable arguments
    InvalidJson(String),
}

/// Parses a single input line.
pub fn parse_line(line: &str) -> ShellCommand {
    let line = line.trim();
    if line.is_empty() {
        return ShellCommand::Empty;
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head {
        "help" | "?" => ShellCommand::Help,
        "exit" | "quit" => ShellCommand::Exit,
        tool if !is_tool(tool) => ShellCommand::Unknown(tool.to_string()),
        tool => {
            let arguments = if rest.is_empty() {
                Ok(Value::Null)
            } else {
                serde_json::from_str(rest)
            };
            match arguments {
                Ok(arguments) => ShellCommand::Call {
                    tool: tool.to_string(),
                    arguments,
                },
                Err(e) => ShellCommand::InvalidJson(e.to_string()),
            }
        }
    }
}

fn help_text() -> String {
    let tools: Vec<String> = TOOL_NAMES
        .iter()
        .map(|name| format!("  {} [json]", name))
        .collect();
    format!(
        "commands:\n{}\n  help\n  exit | quit\nexample: detect_outliers {{\"column\": \"precio\", \"method\": \"zscore\"}}",
        tools.join("\n")
    )
}

/// Runs the shell over arbitrary streams until `exit` or end of input.
///
/// # Errors
/// I/O errors on either stream.
pub async fn run_io<R, W>(analyst: &Analyst, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    writer.write_all(format!("{}\n", BANNER).as_bytes()).await?;

    loop {
        writer.write_all(PROMPT.as_bytes()).await?;
        writer.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let output = match parse_line(&line) {
            ShellCommand::Empty => continue,
            ShellCommand::Exit => break,
            ShellCommand::Help => help_text(),
            ShellCommand::Unknown(_) => "Unknown command. Type 'help'.".to_string(),
            ShellCommand::InvalidJson(message) => format!("Invalid JSON: {}", message),
            ShellCommand::Call { tool, arguments } => {
                match call_tool(analyst, &tool, arguments).await {
                    Ok(value) => serde_json::to_string_pretty(&value)?,
                    Err(error) => format!("Error [{}]: {}", error.kind, error.message),
                }
            }
        };

        writer.write_all(output.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }

    writer.flush().await
}

/// Runs the shell on the process stdin/stdout.
///
/// # Errors
/// I/O errors on stdin or stdout.
pub async fn run(analyst: &Analyst) -> std::io::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    run_io(analyst, stdin, tokio::io::stdout()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("   "), ShellCommand::Empty);
        assert_eq!(parse_line("help"), ShellCommand::Help);
        assert_eq!(parse_line("quit"), ShellCommand::Exit);
        assert_eq!(
            parse_line("pivot {}"),
            ShellCommand::Unknown("pivot".to_string())
        );
        assert_eq!(
            parse_line("infer_schema"),
            ShellCommand::Call {
                tool: "infer_schema".to_string(),
                arguments: Value::Null,
            }
        );
        assert_eq!(
            parse_line("correlation   {\"method\": \"kendall\"}"),
            ShellCommand::Call {
                tool: "correlation".to_string(),
                arguments: json!({"method": "kendall"}),
            }
        );
        assert!(matches!(
            parse_line("profile {columns"),
            ShellCommand::InvalidJson(_)
        ));
    }

    #[test]
    fn test_help_lists_every_tool() {
        let help = help_text();
        for name in TOOL_NAMES {
            assert!(help.contains(name), "help is missing {}", name);
        }
    }

    #[tokio::test]
    async fn test_session_before_load() {
        let analyst = Analyst::default();
        let input: &[u8] = b"help\nmissing_report\nbogus\nexit\ninfer_schema\n";
        let mut output = Vec::new();

        run_io(&analyst, input, &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with(BANNER));
        assert!(text.contains("commands:"));
        assert!(text.contains("Error [NoDatasetLoaded]: No dataset loaded."));
        assert!(text.contains("Unknown command. Type 'help'."));
        assert_eq!(text.matches("Error [").count(), 1);
    }
}
