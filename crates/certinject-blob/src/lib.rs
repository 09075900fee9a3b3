//! Codec for the "Certificate Registry Blob" binary format.
//!
//! A blob is a bare concatenation of records, each a 12-byte little-endian
//! header (property tag, a reserved word that is always 1, payload length)
//! followed by the payload bytes. There is no outer framing; the end of the
//! byte stream is the end of the blob.
//!
//! The trust subsystem that consumes blobs only *requires* the raw
//! certificate record ([`TAG_CERT_CONTENT`]); every derived record (digests,
//! key identifiers) is regenerated by the consumer on first use, so the
//! minimal valid blob holds exactly one record.

use indexmap::IndexMap;

/// Subject public key bit length.
pub const TAG_KEY_BIT_LENGTH: u32 = 0x5C;
/// MD5 digest of the certificate's ECC public key.
pub const TAG_ECC_PUBKEY_MD5: u32 = 0x19;
/// Signature hash.
pub const TAG_SIGNATURE_HASH: u32 = 0x0F;
/// SHA-1 digest of the certificate.
pub const TAG_CERT_SHA1: u32 = 0x03;
/// MD5 digest of the certificate.
pub const TAG_CERT_MD5: u32 = 0x04;
/// Key identifier.
pub const TAG_KEY_IDENTIFIER: u32 = 0x14;
/// The DER-encoded certificate itself.
pub const TAG_CERT_CONTENT: u32 = 0x20;

const HEADER_LEN: usize = 12;

// Second header word. Meaning unknown, observed as 1 in every record the
// trust subsystem writes; we treat it as opaque and always emit 1.
const RESERVED: u32 = 1;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BlobError {
    #[error("record payload for tag {tag:#x} is {len} bytes, exceeding the u32 length field")]
    EncodingOverflow { tag: u32, len: usize },
    #[error("truncated record header: {remaining} bytes remain, need 12")]
    TruncatedHeader { remaining: usize },
    #[error("truncated payload for tag {tag:#x}: {remaining} bytes remain, need {expected}")]
    TruncatedPayload {
        tag: u32,
        expected: usize,
        remaining: usize,
    },
}

/// An ordered map of property tag to payload bytes.
///
/// Tags are unique by construction; inserting an existing tag replaces its
/// payload. Encoding preserves insertion order, though consumers do not rely
/// on record order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob {
    records: IndexMap<u32, Vec<u8>>,
}

impl Blob {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The minimal blob the injection path writes: a single
    /// [`TAG_CERT_CONTENT`] record carrying the DER bytes verbatim.
    #[must_use]
    pub fn for_certificate(der: &[u8]) -> Self {
        let mut blob = Self::new();
        blob.insert(TAG_CERT_CONTENT, der.to_vec());
        blob
    }

    /// Inserts a record, returning the previous payload for `tag` if any.
    pub fn insert(&mut self, tag: u32, payload: Vec<u8>) -> Option<Vec<u8>> {
        self.records.insert(tag, payload)
    }

    #[must_use]
    pub fn get(&self, tag: u32) -> Option<&[u8]> {
        self.records.get(&tag).map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u8])> {
        self.records.iter().map(|(&tag, payload)| (tag, payload.as_slice()))
    }

    /// Serializes every record as header-then-payload with no outer framing.
    pub fn encode(&self) -> Result<Vec<u8>, BlobError> {
        let mut out = Vec::with_capacity(
            self.records
                .values()
                .map(|payload| HEADER_LEN + payload.len())
                .sum(),
        );
        for (&tag, payload) in &self.records {
            let len = u32::try_from(payload.len()).map_err(|_| BlobError::EncodingOverflow {
                tag,
                len: payload.len(),
            })?;
            out.extend_from_slice(&tag.to_le_bytes());
            out.extend_from_slice(&RESERVED.to_le_bytes());
            out.extend_from_slice(&len.to_le_bytes());
            out.extend_from_slice(payload);
        }
        Ok(out)
    }

    /// Reads records until the input is exhausted.
    ///
    /// Decoding is permissive: duplicate tags are not rejected (the later
    /// record wins), and the reserved header word is not checked. Uniqueness
    /// is the producer's invariant, not the consumer's.
    pub fn decode(bytes: &[u8]) -> Result<Self, BlobError> {
        let mut records = IndexMap::new();
        let mut rest = bytes;
        while !rest.is_empty() {
            if rest.len() < HEADER_LEN {
                return Err(BlobError::TruncatedHeader {
                    remaining: rest.len(),
                });
            }
            let tag = read_u32(rest);
            let expected = read_u32(&rest[8..]) as usize;
            rest = &rest[HEADER_LEN..];
            if rest.len() < expected {
                return Err(BlobError::TruncatedPayload {
                    tag,
                    expected,
                    remaining: rest.len(),
                });
            }
            records.insert(tag, rest[..expected].to_vec());
            rest = &rest[expected..];
        }
        Ok(Self { records })
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
