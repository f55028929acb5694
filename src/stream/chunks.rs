//! Byte chunk sources.

use futures_core::Stream;
use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

use super::StreamError;

/// Read `reader` as a stream of byte chunks until end of file.
///
/// Chunk sizes are whatever the reader delivers; downstream stages make no
/// assumption about them.
pub fn byte_chunks<R: AsyncRead>(reader: R) -> impl Stream<Item = Result<Vec<u8>, StreamError>> {
    ReaderStream::new(reader).map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(StreamError::from))
}

/// Like [`byte_chunks`], reading at most `capacity` bytes per chunk.
pub fn byte_chunks_with_capacity<R: AsyncRead>(
    reader: R,
    capacity: usize,
) -> impl Stream<Item = Result<Vec<u8>, StreamError>> {
    ReaderStream::with_capacity(reader, capacity)
        .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(StreamError::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_until_eof() {
        let input: &[u8] = b"hello world";
        let chunks: Vec<_> = byte_chunks_with_capacity(input, 4).collect().await;
        let chunks: Vec<Vec<u8>> = chunks.into_iter().map(Result::unwrap).collect();
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), b"hello world".to_vec());
    }

    #[tokio::test]
    async fn test_empty_reader_yields_nothing() {
        let input: &[u8] = b"";
        let chunks: Vec<_> = byte_chunks(input).collect().await;
        assert!(chunks.is_empty());
    }
}
