//! .pens binary container for the pattern store.
//!
//! Layout: a 64-byte little-endian header followed by a JSON payload.

use std::io::{Read, Write};
use std::path::Path;

use crate::store::PatternStore;
use crate::types::{PensentError, PensentResult, PersistedPattern};

/// Magic bytes: "PENS"
const PENS_MAGIC: u32 = 0x50454E53;

const FORMAT_VERSION: u16 = 1;

const HEADER_SIZE: usize = 64;

/// Refuse payloads larger than this when reading.
const MAX_PAYLOAD_BYTES: u64 = 1 << 30;

/// Writer for .pens files.
pub struct PensWriter;

/// Reader for .pens files.
pub struct PensReader;

impl PensWriter {
    pub fn write_to_file(store: &PatternStore, path: &Path) -> PensentResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Write beside the target, then rename, so a crash never leaves a torn file.
        let tmp = path.with_extension("pens.tmp");
        {
            let mut file = std::fs::File::create(&tmp)?;
            Self::write_to(store, &mut file)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), patterns = store.count(), "Wrote pattern store");
        Ok(())
    }

    pub fn write_to<W: Write>(store: &PatternStore, writer: &mut W) -> PensentResult<()> {
        let payload = serde_json::to_vec(&SerializedStore {
            patterns: &store.patterns,
            next_id: store.next_id,
        })
        .map_err(|e| PensentError::Storage(format!("Serialization failed: {e}")))?;

        let mut header = [0u8; HEADER_SIZE];
        write_u32(&mut header[0..4], PENS_MAGIC);
        write_u16(&mut header[4..6], FORMAT_VERSION);
        write_u16(&mut header[6..8], 0); // flags
        write_u64(&mut header[8..16], store.patterns.len() as u64);
        write_u32(&mut header[16..20], store.session_count);
        write_u64(&mut header[20..28], store.created_at);
        write_u64(&mut header[28..36], store.updated_at);
        write_u64(&mut header[36..44], payload.len() as u64);

        writer.write_all(&header)?;
        writer.write_all(&payload)?;
        Ok(())
    }
}

impl PensReader {
    pub fn read_from_file(path: &Path) -> PensentResult<PatternStore> {
        let mut file = std::fs::File::open(path)?;
        let store = Self::read_from(&mut file)?;
        tracing::debug!(path = %path.display(), patterns = store.count(), "Read pattern store");
        Ok(store)
    }

    pub fn read_from<R: Read>(reader: &mut R) -> PensentResult<PatternStore> {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;

        let magic = read_u32(&header[0..4]);
        if magic != PENS_MAGIC {
            return Err(PensentError::Storage(format!(
                "Invalid magic: expected 0x{PENS_MAGIC:08X}, got 0x{magic:08X}"
            )));
        }

        let version = read_u16(&header[4..6]);
        if version != FORMAT_VERSION {
            return Err(PensentError::Storage(format!(
                "Unsupported version: {version}"
            )));
        }

        let pattern_count = read_u64(&header[8..16]);
        let session_count = read_u32(&header[16..20]);
        let created_at = read_u64(&header[20..28]);
        let updated_at = read_u64(&header[28..36]);
        let payload_len = read_u64(&header[36..44]);

        if payload_len > MAX_PAYLOAD_BYTES {
            return Err(PensentError::Storage(format!(
                "Payload of {payload_len} bytes exceeds limit"
            )));
        }

        let mut payload = vec![0u8; payload_len as usize];
        reader.read_exact(&mut payload)?;

        let serialized: DeserializedStore = serde_json::from_slice(&payload)
            .map_err(|e| PensentError::Storage(format!("Deserialization failed: {e}")))?;

        if serialized.patterns.len() as u64 != pattern_count {
            return Err(PensentError::Storage(format!(
                "Header declares {pattern_count} patterns, payload holds {}",
                serialized.patterns.len()
            )));
        }

        let max_id = serialized.patterns.iter().map(|p| p.id).max().unwrap_or(0);

        Ok(PatternStore {
            patterns: serialized.patterns,
            next_id: serialized.next_id.max(max_id + 1),
            session_count,
            created_at,
            updated_at,
        })
    }
}

#[derive(serde::Serialize)]
struct SerializedStore<'a> {
    patterns: &'a [PersistedPattern],
    next_id: u64,
}

#[derive(serde::Deserialize)]
struct DeserializedStore {
    patterns: Vec<PersistedPattern>,
    next_id: u64,
}

fn write_u16(buf: &mut [u8], val: u16) {
    buf[..2].copy_from_slice(&val.to_le_bytes());
}
fn write_u32(buf: &mut [u8], val: u32) {
    buf[..4].copy_from_slice(&val.to_le_bytes());
}
fn write_u64(buf: &mut [u8], val: u64) {
    buf[..8].copy_from_slice(&val.to_le_bytes());
}
fn read_u16(buf: &[u8]) -> u16 {
    u16::from_le_bytes([buf[0], buf[1]])
}
fn read_u32(buf: &[u8]) -> u32 {
    u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])
}
fn read_u64(buf: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[..8]);
    u64::from_le_bytes(bytes)
}
