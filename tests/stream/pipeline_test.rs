//! Stages chained over real readers with unaligned chunking.

use std::num::NonZeroUsize;

use balance_bridge::stream::{
    byte_chunks, byte_chunks_with_capacity, decode_utf8, lines, records, StreamError,
};
use futures_util::{stream, StreamExt};
use tokio::io::AsyncWriteExt;

async fn collect_ok<T>(s: impl futures_util::Stream<Item = Result<T, StreamError>>) -> Vec<T> {
    s.map(Result::unwrap).collect().await
}

#[tokio::test]
async fn lines_survive_any_read_size() {
    let text = "first ñ line\r\nsecond 💩\n\nlast";
    for capacity in 1..=8 {
        let out = collect_ok(lines(decode_utf8(byte_chunks_with_capacity(text.as_bytes(), capacity)))).await;
        assert_eq!(out, vec!["first ñ line\r", "second 💩", "", "last"], "capacity {capacity}");
    }
}

#[tokio::test]
async fn records_from_a_pipe() {
    let (mut writer, reader) = tokio::io::duplex(5);
    let producer = tokio::spawn(async move {
        for byte in 0u8..14 {
            writer.write_all(&[byte]).await.unwrap();
        }
    });

    let size = NonZeroUsize::new(4).unwrap();
    let out = collect_ok(records(size, byte_chunks(reader))).await;
    producer.await.unwrap();
    assert_eq!(out, vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9, 10, 11]]);
}

#[tokio::test]
async fn decode_error_ends_the_pipeline() {
    let chunks: Vec<Result<Vec<u8>, StreamError>> = vec![
        Ok(b"ok\nbad ".to_vec()),
        Ok(vec![0xC3, 0x28]),
        Ok(b"\nnever".to_vec()),
    ];
    let out: Vec<_> = lines(decode_utf8(stream::iter(chunks))).collect().await;

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].as_ref().unwrap(), "ok");
    assert!(matches!(out[1], Err(StreamError::Decode { offset: 7, .. })));
}

#[tokio::test]
async fn truncated_tail_is_a_decode_error() {
    let chunks: Vec<Result<Vec<u8>, StreamError>> = vec![Ok(b"abc".to_vec()), Ok(vec![0xE2, 0x82])];
    let out: Vec<_> = decode_utf8(stream::iter(chunks)).collect().await;
    assert_eq!(out[0].as_ref().unwrap(), "abc");
    assert!(matches!(out.last(), Some(Err(StreamError::Decode { .. }))));
}
