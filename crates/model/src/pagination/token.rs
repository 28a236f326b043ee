use bytes::Bytes;
use std::fmt;

/// Resume marker handed out by a paged read.
///
/// The contents belong to the store that produced it. Pipeline code only
/// stores it and passes it back unchanged on the next request.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContinuationToken(Bytes);

impl ContinuationToken {
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        ContinuationToken(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContinuationToken({} bytes)", self.0.len())
    }
}
