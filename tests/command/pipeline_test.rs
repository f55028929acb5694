//! Bytes to commands through the decoder, tokenizer and assembler.

use balance_bridge::command::{commands, simple_commands, tokens, Command, SimpleCommandParser, Token};
use balance_bridge::stream::{byte_chunks_with_capacity, decode_utf8, lines, StreamError};
use futures_util::{stream, StreamExt};

async fn parse(input: &'static [u8], capacity: usize) -> Vec<Command> {
    commands(tokens(decode_utf8(byte_chunks_with_capacity(input, capacity))))
        .map(Result::unwrap)
        .collect()
        .await
}

#[tokio::test]
async fn kill_line_is_one_bareword_command() {
    let out = parse(b"kill\n", 4096).await;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].tokens(), &[Token::Bareword("kill".to_string())]);
}

#[tokio::test]
async fn chunk_size_does_not_change_commands() {
    let input: &'static [u8] = "echo \"caf\\u00e9 ☕\" x_1 # note\n\n# skipped\r\nexit 0 \n".as_bytes();
    let whole = parse(input, 4096).await;
    assert_eq!(whole.len(), 2);
    assert_eq!(whole[0].args(), vec!["echo", "café ☕", "x_1"]);
    assert_eq!(whole[1].args(), vec!["exit", "0"]);

    for capacity in 1..=6 {
        assert_eq!(parse(input, capacity).await, whole, "capacity {capacity}");
    }
}

#[tokio::test]
async fn tokens_before_a_syntax_error_are_delivered() {
    let source = stream::iter([Ok::<_, StreamError>("say hi"), Ok(" & more")]);
    let out: Vec<_> = tokens(source).collect().await;
    let (ok, err): (Vec<_>, Vec<_>) = out.into_iter().partition(Result::is_ok);
    let ok: Vec<Token> = ok.into_iter().map(Result::unwrap).collect();
    assert_eq!(
        ok,
        vec![
            Token::Bareword("say".into()),
            Token::Whitespace,
            Token::Bareword("hi".into()),
            Token::Whitespace,
        ]
    );
    assert_eq!(err.len(), 1);
}

#[tokio::test]
async fn dangling_quote_fails_at_end_of_input() {
    let out: Vec<_> = commands(tokens(stream::iter([Ok::<_, StreamError>("echo \"open")])))
        .collect()
        .await;
    assert_eq!(out.len(), 1);
    assert!(matches!(out[0], Err(StreamError::Syntax { .. })));
}

#[tokio::test]
async fn simple_syntax_over_chunks() {
    let parser = SimpleCommandParser::new().unwrap();
    let source = stream::iter([Ok::<_, StreamError>("foo \"bar"), Ok(" baz\" quux\n# c\nkill")]);
    let out: Vec<Vec<String>> = simple_commands(parser, lines(source))
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(out, vec![vec!["foo", "bar baz", "quux"], vec!["kill"]]);
}
