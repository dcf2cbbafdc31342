//! Upload plans and sequential chunk reading

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// How a part count is derived from a file size when the client has to compute it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartCountRule {
    /// `ceil(size / chunk_size)`
    #[default]
    Exact,
    /// `size / chunk_size + 1`; one part too many when the size is an exact multiple
    Legacy,
}

impl PartCountRule {
    pub fn part_count(&self, byte_size: u64, chunk_size: u64) -> u64 {
        if chunk_size == 0 {
            return 0;
        }
        match self {
            PartCountRule::Exact => byte_size.div_ceil(chunk_size),
            PartCountRule::Legacy => byte_size / chunk_size + 1,
        }
    }
}

/// `multipart` object of a transfer or board upload plan
#[derive(Debug, Clone, Deserialize)]
pub struct Multipart {
    pub part_numbers: u64,
    pub chunk_size: u64,
    /// Multipart upload id; present on board plans only
    #[serde(default)]
    pub id: Option<String>,
}

/// Per-file upload plan announced by the service (or computed for the email path)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPlan {
    pub remote_file_id: String,
    pub chunk_size: u64,
    pub total_part_count: u64,
    pub multipart_upload_id: Option<String>,
}

impl UploadPlan {
    pub fn from_multipart(remote_file_id: String, multipart: Multipart) -> Result<Self> {
        if multipart.chunk_size == 0 {
            return Err(Error::Protocol(format!(
                "upload plan for file {} has a zero chunk size",
                remote_file_id
            )));
        }

        Ok(Self {
            remote_file_id,
            chunk_size: multipart.chunk_size,
            total_part_count: multipart.part_numbers,
            multipart_upload_id: multipart.id,
        })
    }
}

/// One contiguous byte range of a file, numbered from 1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub part_number: u64,
    pub data: Vec<u8>,
}

/// Reads a file front to back in `chunk_size` pieces.
///
/// Every chunk but the last is exactly `chunk_size` bytes long.
pub struct ChunkReader {
    file: File,
    chunk_size: u64,
    next_part: u64,
    bytes_read: u64,
}

impl ChunkReader {
    pub async fn open(path: &Path, chunk_size: u64) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Protocol("chunk size must be positive".to_string()));
        }

        let file = File::open(path).await?;

        Ok(Self {
            file,
            chunk_size,
            next_part: 1,
            bytes_read: 0,
        })
    }

    /// Next chunk, or `None` once the file is exhausted
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        let mut data = Vec::new();
        (&mut self.file)
            .take(self.chunk_size)
            .read_to_end(&mut data)
            .await?;

        if data.is_empty() {
            return Ok(None);
        }

        let chunk = Chunk {
            part_number: self.next_part,
            data,
        };
        self.next_part += 1;
        self.bytes_read += chunk.data.len() as u64;

        Ok(Some(chunk))
    }

    /// Chunks handed out so far
    pub fn parts_read(&self) -> u64 {
        self.next_part - 1
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    async fn read_all(path: &Path, chunk_size: u64) -> Vec<Chunk> {
        let mut reader = ChunkReader::open(path, chunk_size).await.unwrap();
        let mut chunks = Vec::new();
        while let Some(chunk) = reader.next_chunk().await.unwrap() {
            chunks.push(chunk);
        }
        assert_eq!(reader.parts_read(), chunks.len() as u64);
        chunks
    }

    #[test]
    fn test_exact_rule_is_ceiling() {
        let rule = PartCountRule::Exact;
        assert_eq!(rule.part_count(10 * MIB, 4 * MIB), 3);
        assert_eq!(rule.part_count(8 * MIB, 4 * MIB), 2);
        assert_eq!(rule.part_count(1, 4 * MIB), 1);
        assert_eq!(rule.part_count(0, 4 * MIB), 0);
    }

    #[test]
    fn test_legacy_rule_over_counts_exact_multiples() {
        let rule = PartCountRule::Legacy;
        assert_eq!(rule.part_count(10 * MIB, 4 * MIB), 3);
        assert_eq!(rule.part_count(8 * MIB, 4 * MIB), 3);
        assert_eq!(rule.part_count(0, 4 * MIB), 1);
    }

    #[test]
    fn test_zero_chunk_plan_is_a_protocol_violation() {
        let multipart = Multipart {
            part_numbers: 1,
            chunk_size: 0,
            id: None,
        };
        let err = UploadPlan::from_multipart("f1".to_string(), multipart).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn test_plan_keeps_board_multipart_id() {
        let multipart: Multipart = serde_json::from_value(serde_json::json!({
            "id": "mp-9",
            "part_numbers": 2,
            "chunk_size": 5242880
        }))
        .unwrap();
        let plan = UploadPlan::from_multipart("f1".to_string(), multipart).unwrap();

        assert_eq!(plan.multipart_upload_id.as_deref(), Some("mp-9"));
        assert_eq!(plan.total_part_count, 2);
        assert_eq!(plan.chunk_size, 5_242_880);
    }

    #[tokio::test]
    async fn test_chunks_cover_the_file_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &content).unwrap();

        let chunks = read_all(&path, 4096).await;

        let sizes: Vec<usize> = chunks.iter().map(|c| c.data.len()).collect();
        assert_eq!(sizes, vec![4096, 4096, 1808]);

        let parts: Vec<u64> = chunks.iter().map(|c| c.part_number).collect();
        assert_eq!(parts, vec![1, 2, 3]);

        let joined: Vec<u8> = chunks.into_iter().flat_map(|c| c.data).collect();
        assert_eq!(joined, content);
    }

    #[tokio::test]
    async fn test_exact_multiple_has_no_trailing_empty_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("even.bin");
        std::fs::write(&path, vec![1u8; 8192]).unwrap();

        let chunks = read_all(&path, 4096).await;
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.data.len() == 4096));
    }

    #[tokio::test]
    async fn test_empty_file_yields_no_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();

        let mut reader = ChunkReader::open(&path, 4096).await.unwrap();
        assert!(reader.next_chunk().await.unwrap().is_none());
        assert_eq!(reader.parts_read(), 0);
        assert_eq!(reader.bytes_read(), 0);
    }

    #[tokio::test]
    async fn test_zero_chunk_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.bin");
        std::fs::write(&path, b"x").unwrap();

        assert!(matches!(
            ChunkReader::open(&path, 0).await,
            Err(Error::Protocol(_))
        ));
    }
}
