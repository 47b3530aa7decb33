//! File I/O engine tests against real files.

use bytes::Bytes;
use futures_util::stream;
use sluice::files::{FileIO, ThreadPool};
use sluice::http::{Body, BodyStream, StreamChunk};
use sluice::Error;

mod common;

const CHUNK: usize = 1024;

fn engine() -> FileIO {
    FileIO::new(ThreadPool::new(4), CHUNK)
}

#[tokio::test]
async fn small_file_loads_as_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_patterned(dir.path(), "small.bin", CHUNK - 1);

    let body = engine().load_file(&path).await.unwrap();
    assert!(!body.is_stream());
    assert_eq!(body.as_bytes().unwrap(), &common::patterned(CHUNK - 1)[..]);
}

#[tokio::test]
async fn file_of_exactly_one_chunk_streams() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_patterned(dir.path(), "exact.bin", CHUNK);

    let body = engine().load_file(&path).await.unwrap();
    assert!(body.is_stream());
    assert_eq!(&body.collect().await.unwrap()[..], &common::patterned(CHUNK)[..]);
}

#[tokio::test]
async fn large_file_streams_chunk_by_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let len = CHUNK * 3 + 100;
    let path = common::write_patterned(dir.path(), "large.bin", len);

    let Body::Stream(mut stream) = engine().load_file(&path).await.unwrap() else {
        panic!("expected a stream body");
    };

    let mut sizes = Vec::new();
    let mut collected = Vec::new();
    while let StreamChunk::Data(chunk) = stream.read().await.unwrap() {
        sizes.push(chunk.len());
        collected.extend_from_slice(&chunk);
    }
    assert_eq!(sizes, vec![CHUNK, CHUNK, CHUNK, 100]);
    assert_eq!(collected, common::patterned(len));

    // The end marker is sticky.
    assert!(stream.is_finished());
    assert_eq!(stream.read().await.unwrap(), StreamChunk::End);
}

#[tokio::test]
async fn empty_file_is_an_empty_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_patterned(dir.path(), "empty.bin", 0);

    let body = engine().load_file(&path).await.unwrap();
    assert_eq!(body.as_bytes().map(|b| b.len()), Some(0));
}

#[tokio::test]
async fn range_returns_exactly_the_requested_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_patterned(dir.path(), "range.bin", 5000);
    let expected = common::patterned(5000);

    let (body, size) = engine().load_file_range(&path, 10..=19).await.unwrap();
    assert_eq!(size, 5000);
    assert_eq!(&body.collect().await.unwrap()[..], &expected[10..20]);

    // Large ranges stream, and still stop at the range end.
    let (body, _) = engine().load_file_range(&path, 100..=3099).await.unwrap();
    assert!(body.is_stream());
    assert_eq!(&body.collect().await.unwrap()[..], &expected[100..3100]);
}

#[tokio::test]
async fn range_is_clamped_to_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_patterned(dir.path(), "clamp.bin", 50);

    let (body, _) = engine().load_file_range(&path, 40..=1000).await.unwrap();
    assert_eq!(&body.collect().await.unwrap()[..], &common::patterned(50)[40..]);

    let (body, size) = engine().load_file_range(&path, 60..=70).await.unwrap();
    assert_eq!(size, 50);
    assert!(body.collect().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = engine()
        .load_file(dir.path().join("missing.bin"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Http(_)));
    assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn directories_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = engine().load_file(dir.path()).await.unwrap_err();
    assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn buffer_write_creates_and_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("written.txt");

    engine()
        .write_file(Body::from("hello, file"), &path)
        .await
        .unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"hello, file");

    let body = engine().load_file(&path).await.unwrap();
    assert_eq!(&body.collect().await.unwrap()[..], b"hello, file");
}

#[tokio::test]
async fn write_replaces_existing_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_patterned(dir.path(), "replace.bin", 4096);

    engine().write_file(Body::from("short"), &path).await.unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"short");
}

#[tokio::test]
async fn empty_buffer_write_creates_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.txt");

    engine().write_file(Body::empty(), &path).await.unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
}

#[tokio::test]
async fn stream_write_preserves_chunk_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("streamed.bin");
    let data = common::patterned(10_000);

    let chunks: Vec<std::io::Result<Bytes>> = data
        .chunks(777)
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect();
    let body = Body::Stream(BodyStream::from_stream(stream::iter(chunks)));

    engine().write_file(body, &path).await.unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), data);

    // And back out through the streaming read path.
    let body = engine().load_file(&path).await.unwrap();
    assert!(body.is_stream());
    assert_eq!(body.collect().await.unwrap().to_vec(), data);
}

#[tokio::test]
async fn failing_stream_surfaces_error_and_keeps_written_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.bin");

    let chunks = vec![
        Ok(Bytes::from_static(b"abc")),
        Err(std::io::Error::other("client went away")),
        Ok(Bytes::from_static(b"never")),
    ];
    let body = Body::Stream(BodyStream::from_stream(stream::iter(chunks)));

    let err = engine().write_file(body, &path).await.unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(std::fs::read(&path).unwrap(), b"abc");
}

#[tokio::test]
async fn write_into_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no/such/dir/file.txt");

    let err = engine().write_file(Body::from("x"), &path).await.unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[tokio::test]
async fn concurrent_loads_share_the_pool() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_patterned(dir.path(), "shared.bin", CHUNK * 4);
    let files = FileIO::new(ThreadPool::new(2), CHUNK);

    let loads = (0..8).map(|_| {
        let files = files.clone();
        let path = path.clone();
        tokio::spawn(async move { files.load_file(&path).await.unwrap().collect().await.unwrap() })
    });

    for load in loads.collect::<Vec<_>>() {
        assert_eq!(load.await.unwrap().len(), CHUNK * 4);
    }
    assert_eq!(files.pool().available(), 2);
}
