use crate::error::DecodeError;
use crate::model::Tag;
use serde_json::de::SliceRead;
use serde_json::StreamDeserializer;

/// A forward-only source of decoded tags for one symbol's tag range.
///
/// `Ok(None)` means the range is exhausted. Any iterator of
/// `Result<Tag, DecodeError>` is a cursor.
pub trait TagCursor {
    fn next_tag(&mut self) -> Result<Option<Tag>, DecodeError>;
}

impl<I> TagCursor for I
where
    I: Iterator<Item = Result<Tag, DecodeError>>,
{
    fn next_tag(&mut self) -> Result<Option<Tag>, DecodeError> {
        self.next().transpose()
    }
}

/// Lazily decodes whitespace-separated JSON tag records from a byte buffer.
///
/// Decoding stops at the first malformed record: the error is yielded once
/// and the cursor is exhausted afterwards.
pub struct JsonLinesCursor<'a> {
    records: StreamDeserializer<'a, SliceRead<'a>, Tag>,
    failed: bool,
}

impl<'a> JsonLinesCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            records: serde_json::Deserializer::from_slice(bytes).into_iter::<Tag>(),
            failed: false,
        }
    }

    /// Byte offset just past the last record decoded.
    pub fn byte_offset(&self) -> usize {
        self.records.byte_offset()
    }
}

impl Iterator for JsonLinesCursor<'_> {
    type Item = Result<Tag, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.records.next()? {
            Ok(tag) => Some(Ok(tag)),
            Err(e) => {
                self.failed = true;
                Some(Err(DecodeError::Json(e)))
            }
        }
    }
}
