//! Control console: commands read from a byte stream, applied to a group.
//!
//! Recognized verbs:
//!
//! - `kill`: broadcast the configured kill signal to the group and settle
//!   with exit code 1;
//! - `exit [code]`: force the group's exit code and settle with it;
//! - `echo args...`: write the arguments, space separated, to the output.
//!
//! End of input behaves as `exit` with the configured default code.

use std::sync::{Arc, Weak};

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::command::{commands, simple_commands, tokens, SimpleCommandParser};
use crate::config::{CommandSyntax, ConsoleConfig};
use crate::process::{BoxError, ProcessGroup, ProcessLike, TaskProcess, EXIT_ABORTED, EXIT_FAILURE};
use crate::stream::{byte_chunks, decode_utf8, lines, StreamError};

/// Argument vectors parsed from a console's input.
pub type CommandStream = BoxStream<'static, Result<Vec<String>, StreamError>>;

/// Parse `input` into argument vectors using `syntax`.
///
/// # Errors
///
/// Returns `StreamError::Pattern` if the simple parser cannot be built.
pub fn read_commands<R>(input: R, syntax: CommandSyntax) -> Result<CommandStream, StreamError>
where
    R: AsyncRead + Send + 'static,
{
    let text = decode_utf8(byte_chunks(input));
    Ok(match syntax {
        CommandSyntax::Tokens => commands(tokens(text))
            .map(|command| command.map(|c| c.args().into_iter().map(str::to_owned).collect()))
            .boxed(),
        CommandSyntax::Simple => simple_commands(SimpleCommandParser::new()?, lines(text)).boxed(),
    })
}

enum Outcome {
    Continue,
    Settle(i32),
}

/// Start a console reading commands from `input` and acting on `group`.
///
/// The console only holds a weak reference to the group, so it can be
/// added to that same group as a child. Cancelling the console between
/// commands settles it with [`EXIT_ABORTED`]; a malformed command stream
/// settles it with [`EXIT_FAILURE`].
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
pub fn spawn_console<R, W>(group: &Arc<ProcessGroup>, input: R, output: W, config: ConsoleConfig) -> TaskProcess
where
    R: AsyncRead + Send + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
{
    let group = Arc::downgrade(group);
    TaskProcess::builder()
        .name("console")
        .spawn(move |cancel| async move {
            let mut output = output;
            let mut commands = read_commands(input, config.syntax)?;
            loop {
                let next = tokio::select! {
                    () = cancel.cancelled() => {
                        tracing::info!("Console cancelled");
                        return Ok(EXIT_ABORTED);
                    }
                    next = commands.next() => next,
                };
                match next {
                    Some(Ok(args)) => {
                        if let Outcome::Settle(code) = dispatch(&args, &group, &mut output, &config).await? {
                            return Ok(code);
                        }
                    }
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Console input failed");
                        return Ok(EXIT_FAILURE);
                    }
                    None => {
                        let code = config.default_exit_code;
                        tracing::info!(code, "End of console input");
                        if let Some(group) = group.upgrade() {
                            group.exit(code);
                        }
                        return Ok(code);
                    }
                }
            }
        })
}

async fn dispatch<W>(
    args: &[String],
    group: &Weak<ProcessGroup>,
    output: &mut W,
    config: &ConsoleConfig,
) -> Result<Outcome, BoxError>
where
    W: AsyncWrite + Unpin,
{
    let Some((verb, rest)) = args.split_first() else {
        return Ok(Outcome::Continue);
    };
    tracing::debug!(verb = %verb, args = rest.len(), "Console command");

    match verb.as_str() {
        "kill" => {
            tracing::info!(signal = %config.kill_signal, "Killing process group");
            if let Some(group) = group.upgrade() {
                group.kill(config.kill_signal);
            }
            Ok(Outcome::Settle(EXIT_FAILURE))
        }
        "exit" => {
            let code = match rest.first() {
                None => config.default_exit_code,
                Some(raw) => match raw.parse::<i32>() {
                    Ok(code) => code,
                    Err(_) => {
                        tracing::warn!(code = %raw, "Invalid exit code");
                        write_line(output, &format!("Invalid exit code: '{raw}'")).await?;
                        EXIT_FAILURE
                    }
                },
            };
            tracing::info!(code, "Forcing process group exit");
            if let Some(group) = group.upgrade() {
                group.exit(code);
            }
            Ok(Outcome::Settle(code))
        }
        "echo" => {
            write_line(output, &rest.join(" ")).await?;
            Ok(Outcome::Continue)
        }
        other => {
            tracing::warn!(verb = %other, "Unrecognized command");
            write_line(output, &format!("Unrecognized command: '{other}'")).await?;
            Ok(Outcome::Continue)
        }
    }
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, line: &str) -> std::io::Result<()> {
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::AsyncReadExt;
    use tokio_test::assert_pending;

    use super::*;
    use crate::process::ProcSig;

    fn idle_child() -> Arc<dyn ProcessLike> {
        Arc::new(TaskProcess::spawn(|cancel| async move {
            cancel.cancelled().await;
            Ok(EXIT_ABORTED)
        }))
    }

    async fn run(input: &'static [u8], config: ConsoleConfig) -> (i32, i32, String) {
        let group = Arc::new(ProcessGroup::new());
        group.add_child(idle_child());
        let (writer, mut reader) = tokio::io::duplex(4096);
        let console = Arc::new(spawn_console(&group, input, writer, config));
        group.add_child(console.clone());

        let group_code = tokio::time::timeout(Duration::from_secs(5), group.wait())
            .await
            .unwrap();
        let console_code = console.wait().await;
        let mut output = String::new();
        reader.read_to_string(&mut output).await.unwrap();
        (group_code, console_code, output)
    }

    #[tokio::test]
    async fn test_kill_stops_group_with_nonzero_code() {
        let (group_code, console_code, _) = run(b"kill\n", ConsoleConfig::default()).await;
        assert_eq!(console_code, EXIT_FAILURE);
        assert_ne!(group_code, 0);
    }

    #[tokio::test]
    async fn test_exit_forces_group_code() {
        let (group_code, console_code, _) = run(b"exit 7\n", ConsoleConfig::default()).await;
        assert_eq!(console_code, 7);
        assert_eq!(group_code, 7);
    }

    #[tokio::test]
    async fn test_echo_then_end_of_input() {
        let config = ConsoleConfig {
            default_exit_code: 4,
            ..ConsoleConfig::default()
        };
        let (group_code, _, output) = run(b"echo \"hello there\" world\n# done\n", config).await;
        assert_eq!(output, "hello there world\n");
        assert_eq!(group_code, 4);
    }

    #[tokio::test]
    async fn test_unknown_verb_is_reported() {
        let (group_code, _, output) = run(b"dance\nexit\n", ConsoleConfig::default()).await;
        assert_eq!(output, "Unrecognized command: 'dance'\n");
        assert_eq!(group_code, 0);
    }

    #[tokio::test]
    async fn test_invalid_exit_code_is_failure() {
        let (group_code, _, output) = run(b"exit \"soon\"\n", ConsoleConfig::default()).await;
        assert!(output.starts_with("Invalid exit code"));
        assert_eq!(group_code, EXIT_FAILURE);
    }

    #[tokio::test]
    async fn test_simple_syntax() {
        let config = ConsoleConfig {
            syntax: CommandSyntax::Simple,
            ..ConsoleConfig::default()
        };
        let (group_code, _, output) = run(b"# hi\necho a+b \"c\\td\"\nexit 2\n", config).await;
        assert_eq!(output, "a+b c\td\n");
        assert_eq!(group_code, 2);
    }

    #[tokio::test]
    async fn test_syntax_error_settles_with_failure() {
        let group = Arc::new(ProcessGroup::new());
        let console = spawn_console(&group, &b"echo @\n"[..], tokio::io::sink(), ConsoleConfig::default());
        assert_eq!(console.wait().await, EXIT_FAILURE);
        assert_eq!(group.forced_exit_code(), None);
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_input() {
        let group = Arc::new(ProcessGroup::new());
        let (_keep_open, input) = tokio::io::duplex(64);
        let console = spawn_console(&group, input, tokio::io::sink(), ConsoleConfig::default());

        let mut waiting = tokio_test::task::spawn(console.wait());
        assert_pending!(waiting.poll());
        drop(waiting);

        console.kill(ProcSig::SigTerm);
        assert_eq!(console.wait().await, EXIT_ABORTED);
    }
}
