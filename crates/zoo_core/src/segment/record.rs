//! Segment record framing.

use crate::error::{CoreError, CoreResult};
use crate::id::RecordId;

/// Flags for segment records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordFlags(u8);

impl RecordFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Record replaces an earlier version.
    pub const REPLACEMENT: Self = Self(0x01);

    /// Creates flags from the raw byte.
    #[must_use]
    pub const fn from_byte(b: u8) -> Self {
        Self(b)
    }

    /// Returns the raw byte value.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self.0
    }

    /// Checks if the replacement flag is set.
    #[must_use]
    pub const fn is_replacement(self) -> bool {
        self.0 & 0x01 != 0
    }
}

/// A record stored in a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRecord {
    /// Record flags.
    pub flags: RecordFlags,
    /// Primary identifier, duplicated from the payload so the primary
    /// index can be rebuilt without decoding payloads.
    pub id: RecordId,
    /// CBOR-encoded record.
    pub payload: Vec<u8>,
}

impl SegmentRecord {
    /// Bytes before the id: record_len (4) + flags (1) + id_len (2).
    pub(crate) const HEADER_SIZE: usize = 7;
    /// CRC size.
    const CRC_SIZE: usize = 4;

    /// Creates the first version of a record.
    #[must_use]
    pub fn insert(id: RecordId, payload: Vec<u8>) -> Self {
        Self {
            flags: RecordFlags::NONE,
            id,
            payload,
        }
    }

    /// Creates a version superseding an earlier one.
    #[must_use]
    pub fn replacement(id: RecordId, payload: Vec<u8>) -> Self {
        Self {
            flags: RecordFlags::REPLACEMENT,
            id,
            payload,
        }
    }

    /// Encodes the record to bytes.
    ///
    /// # Errors
    ///
    /// Fails when the id is longer than `u16::MAX` bytes or the record
    /// would exceed `u32::MAX` bytes.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let id = self.id.as_str().as_bytes();
        let id_len = u16::try_from(id.len())
            .map_err(|_| CoreError::invalid_record("_id longer than 65535 bytes"))?;
        let record_len = u32::try_from(self.encoded_size())
            .map_err(|_| CoreError::invalid_record("record larger than 4 GiB"))?;

        let mut buf = Vec::with_capacity(self.encoded_size());
        buf.extend_from_slice(&record_len.to_le_bytes());
        buf.push(self.flags.as_byte());
        buf.extend_from_slice(&id_len.to_le_bytes());
        buf.extend_from_slice(id);
        buf.extend_from_slice(&self.payload);

        let crc = crc32fast::hash(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        Ok(buf)
    }

    /// Decodes a record from bytes.
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        if data.len() < Self::HEADER_SIZE + Self::CRC_SIZE {
            return Err(CoreError::segment_corruption("record too short"));
        }

        let record_len = Self::read_len(data) as usize;
        if record_len < Self::HEADER_SIZE + Self::CRC_SIZE {
            return Err(CoreError::segment_corruption("record length below minimum"));
        }
        if data.len() < record_len {
            return Err(CoreError::segment_corruption("incomplete record"));
        }

        let crc_at = record_len - Self::CRC_SIZE;
        let stored_crc = u32::from_le_bytes([
            data[crc_at],
            data[crc_at + 1],
            data[crc_at + 2],
            data[crc_at + 3],
        ]);
        let computed_crc = crc32fast::hash(&data[..crc_at]);
        if stored_crc != computed_crc {
            return Err(CoreError::ChecksumMismatch {
                expected: stored_crc,
                actual: computed_crc,
            });
        }

        let flags = RecordFlags::from_byte(data[4]);
        let id_len = u16::from_le_bytes([data[5], data[6]]) as usize;
        let id_end = Self::HEADER_SIZE + id_len;
        if id_end > crc_at {
            return Err(CoreError::segment_corruption("id extends past payload"));
        }

        let id = std::str::from_utf8(&data[Self::HEADER_SIZE..id_end])
            .map_err(|_| CoreError::segment_corruption("id is not UTF-8"))?;

        Ok(Self {
            flags,
            id: RecordId::from(id),
            payload: data[id_end..crc_at].to_vec(),
        })
    }

    /// Reads the leading length field.
    ///
    /// `data` must hold at least four bytes.
    pub(crate) fn read_len(data: &[u8]) -> u32 {
        u32::from_le_bytes([data[0], data[1], data[2], data[3]])
    }

    /// Returns the encoded size of this record.
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        Self::HEADER_SIZE + self.id.as_str().len() + self.payload.len() + Self::CRC_SIZE
    }
}
