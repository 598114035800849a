use crate::error::{CamnodeError, Result};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Lazy, forward-only chunked reader over one file.
///
/// Every chunk except the last is exactly `chunk_size` bytes. The sequence ends
/// at end-of-file or at the first read error and cannot be restarted.
#[derive(Debug)]
pub struct FileStreamReader {
    path: PathBuf,
    file: Option<File>,
    chunk_size: usize,
}

impl FileStreamReader {
    /// Open `path` for chunked reading.
    ///
    /// # Errors
    /// Returns `CamnodeError::FileNotFound` if the path does not exist,
    /// `CamnodeError::StreamRead` for any other open failure.
    pub async fn open(path: &Path, chunk_size: usize) -> Result<Self> {
        let file = File::open(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CamnodeError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                CamnodeError::StreamRead {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            }
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            chunk_size: chunk_size.max(1),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the next chunk. `Ok(None)` is end-of-stream.
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(file) = self.file.as_mut() else {
            return Ok(None);
        };

        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]).await {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.file = None;
                    return Err(CamnodeError::StreamRead {
                        path: self.path.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        if filled < buf.len() {
            // Short read means end-of-file; drop the file so the sequence stays finished.
            self.file = None;
        }
        if filled == 0 {
            return Ok(None);
        }

        buf.truncate(filled);
        Ok(Some(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn collect(reader: &mut FileStreamReader) -> Vec<Vec<u8>> {
        let mut chunks = Vec::new();
        while let Some(chunk) = reader.next_chunk().await.unwrap() {
            chunks.push(chunk);
        }
        chunks
    }

    #[tokio::test]
    async fn test_open_missing_file_is_file_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.mp4");

        match FileStreamReader::open(&path, 4096).await {
            Err(CamnodeError::FileNotFound { path: missing }) => assert_eq!(missing, path),
            other => panic!("Expected FileNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_chunks_split_at_chunk_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.mp4");
        let data: Vec<u8> = (0..(4096 * 2 + 123)).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let mut reader = FileStreamReader::open(&path, 4096).await.unwrap();
        assert_eq!(reader.path(), path.as_path());
        let chunks = collect(&mut reader).await;

        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4096, 4096, 123]);
        assert_eq!(chunks.concat(), data);
    }

    #[tokio::test]
    async fn test_exact_multiple_has_no_empty_tail() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.mp4");
        std::fs::write(&path, vec![7u8; 200]).unwrap();

        let mut reader = FileStreamReader::open(&path, 100).await.unwrap();
        let chunks = collect(&mut reader).await;

        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == 100));
    }

    #[tokio::test]
    async fn test_empty_file_ends_immediately() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.mp4");
        std::fs::write(&path, b"").unwrap();

        let mut reader = FileStreamReader::open(&path, 4096).await.unwrap();

        assert_eq!(reader.next_chunk().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sequence_is_not_restartable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.mp4");
        std::fs::write(&path, b"abc").unwrap();

        let mut reader = FileStreamReader::open(&path, 2).await.unwrap();
        assert_eq!(collect(&mut reader).await, vec![b"ab".to_vec(), b"c".to_vec()]);

        assert_eq!(reader.next_chunk().await.unwrap(), None);
        assert_eq!(reader.next_chunk().await.unwrap(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_reading_a_directory_is_stream_error() {
        let dir = TempDir::new().unwrap();

        // Opening a directory succeeds on Linux; reading it fails with EISDIR.
        let mut reader = FileStreamReader::open(dir.path(), 16).await.unwrap();
        let result = reader.next_chunk().await;

        assert!(matches!(result, Err(CamnodeError::StreamRead { .. })));
        assert_eq!(reader.next_chunk().await.unwrap(), None);
    }
}
