//! Length-prefixed binary record stream with a sentinel end marker.
//!
//! Layout: each record is a CBOR payload preceded by its length as a
//! big-endian `u32`; the stream ends with a zero-length marker. A stream
//! that stops before the marker is corrupted, which distinguishes a
//! truncated file from a complete empty one.

use crate::error::{CodecError, CodecResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};

/// Upper bound on a single record frame. Anything larger is treated as
/// corruption rather than a legitimate record.
pub const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Encodes a single record to its CBOR frame payload.
///
/// # Errors
///
/// Returns an error if the record cannot be serialized.
pub fn encode_record<T: Serialize>(record: &T) -> CodecResult<Vec<u8>> {
    let mut payload = Vec::new();
    ciborium::into_writer(record, &mut payload)
        .map_err(|e| CodecError::encode(format!("cbor: {e}")))?;
    Ok(payload)
}

/// Decodes a single record from a CBOR frame payload.
///
/// # Errors
///
/// Returns an error if the payload is not valid CBOR for the record type.
pub fn decode_record<T: DeserializeOwned>(payload: &[u8]) -> CodecResult<T> {
    ciborium::from_reader(payload).map_err(|e| CodecError::decode(format!("cbor: {e}")))
}

/// Writes a record frame stream.
///
/// Call [`FrameWriter::finish`] when done; dropping the writer without
/// finishing leaves the stream without its end marker, and readers will
/// report it as corrupted.
#[derive(Debug)]
pub struct FrameWriter<W: Write> {
    inner: W,
}

impl<W: Write> FrameWriter<W> {
    /// Creates a writer over any byte sink.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Appends one raw payload frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload exceeds [`MAX_FRAME_LEN`], is empty
    /// (which would collide with the end marker), or the write fails.
    pub fn write_payload(&mut self, payload: &[u8]) -> CodecResult<()> {
        if payload.is_empty() {
            return Err(CodecError::encode("empty payload would encode the end marker"));
        }
        let len = u32::try_from(payload.len())
            .map_err(|_| CodecError::encode("record exceeds frame size limit"))?;
        if len > MAX_FRAME_LEN {
            return Err(CodecError::encode("record exceeds frame size limit"));
        }
        self.inner.write_all(&len.to_be_bytes())?;
        self.inner.write_all(payload)?;
        Ok(())
    }

    /// Appends one record frame.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the underlying write fails.
    pub fn write_record<T: Serialize>(&mut self, record: &T) -> CodecResult<()> {
        let payload = encode_record(record)?;
        self.write_payload(&payload)
    }

    /// Writes the sentinel end marker, flushes, and returns the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker cannot be written or flushed.
    pub fn finish(mut self) -> CodecResult<W> {
        self.inner.write_all(&0u32.to_be_bytes())?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Reads a record frame stream.
#[derive(Debug)]
pub struct FrameReader<R: Read> {
    inner: R,
    finished: bool,
}

impl<R: Read> FrameReader<R> {
    /// Creates a reader over any byte source positioned at the first frame.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            finished: false,
        }
    }

    /// Reads the next raw payload, or `None` once the end marker is reached.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream ends before the end marker or a
    /// frame exceeds [`MAX_FRAME_LEN`].
    pub fn next_payload(&mut self) -> CodecResult<Option<Vec<u8>>> {
        if self.finished {
            return Ok(None);
        }
        let mut header = [0u8; 4];
        self.inner.read_exact(&mut header).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                CodecError::malformed("record stream ended before the end marker")
            } else {
                CodecError::Io(e)
            }
        })?;
        let len = u32::from_be_bytes(header);
        if len == 0 {
            self.finished = true;
            return Ok(None);
        }
        if len > MAX_FRAME_LEN {
            return Err(CodecError::malformed(format!(
                "frame length {len} exceeds the {MAX_FRAME_LEN} byte limit"
            )));
        }
        let mut payload = vec![0u8; len as usize];
        self.inner.read_exact(&mut payload).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                CodecError::malformed("record frame truncated")
            } else {
                CodecError::Io(e)
            }
        })?;
        Ok(Some(payload))
    }

    /// Reads and decodes the next record, or `None` at the end marker.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream ends before the end marker, a frame
    /// exceeds [`MAX_FRAME_LEN`], or a payload fails to decode.
    pub fn next_record<T: DeserializeOwned>(&mut self) -> CodecResult<Option<T>> {
        match self.next_payload()? {
            Some(payload) => decode_record(&payload).map(Some),
            None => Ok(None),
        }
    }

    /// Drains the stream into a vector of records.
    ///
    /// # Errors
    ///
    /// Propagates the first frame or decode error.
    pub fn read_all<T: DeserializeOwned>(&mut self) -> CodecResult<Vec<T>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record()? {
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Rec {
        id: i64,
        label: String,
    }

    fn sample(n: i64) -> Rec {
        Rec {
            id: n,
            label: format!("rec-{n}"),
        }
    }

    #[test]
    fn roundtrip() {
        let mut writer = FrameWriter::new(Vec::new());
        for n in 1..=3 {
            writer.write_record(&sample(n)).unwrap();
        }
        let bytes = writer.finish().unwrap();

        let mut reader = FrameReader::new(bytes.as_slice());
        let records: Vec<Rec> = reader.read_all().unwrap();
        assert_eq!(records, vec![sample(1), sample(2), sample(3)]);
    }

    #[test]
    fn empty_stream_has_only_marker() {
        let writer = FrameWriter::new(Vec::new());
        let bytes = writer.finish().unwrap();
        assert_eq!(bytes, 0u32.to_be_bytes());

        let mut reader = FrameReader::new(bytes.as_slice());
        let records: Vec<Rec> = reader.read_all().unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn missing_end_marker_is_corruption() {
        // A frame with no sentinel after it.
        let mut bytes = Vec::new();
        let payload = encode_record(&sample(1)).unwrap();
        bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&payload);

        let mut reader = FrameReader::new(bytes.as_slice());
        let first: Option<Rec> = reader.next_record().unwrap();
        assert!(first.is_some());
        let err = reader.next_record::<Rec>().unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn truncated_payload_is_corruption() {
        let payload = encode_record(&sample(1)).unwrap();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&payload[..payload.len() - 1]);

        let mut reader = FrameReader::new(bytes.as_slice());
        let err = reader.next_record::<Rec>().unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn oversized_frame_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(MAX_FRAME_LEN + 1).to_be_bytes());
        let mut reader = FrameReader::new(bytes.as_slice());
        let err = reader.next_record::<Rec>().unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn reading_past_marker_yields_none() {
        let bytes = FrameWriter::new(Vec::new()).finish().unwrap();
        let mut reader = FrameReader::new(bytes.as_slice());
        assert!(reader.next_record::<Rec>().unwrap().is_none());
        assert!(reader.next_record::<Rec>().unwrap().is_none());
    }

    proptest! {
        #[test]
        fn arbitrary_records_roundtrip(ids in proptest::collection::vec(1i64..10_000, 0..32)) {
            let mut writer = FrameWriter::new(Vec::new());
            for id in &ids {
                writer.write_record(&sample(*id)).unwrap();
            }
            let bytes = writer.finish().unwrap();
            let mut reader = FrameReader::new(bytes.as_slice());
            let records: Vec<Rec> = reader.read_all().unwrap();
            let expected: Vec<Rec> = ids.iter().map(|id| sample(*id)).collect();
            prop_assert_eq!(records, expected);
        }
    }
}
