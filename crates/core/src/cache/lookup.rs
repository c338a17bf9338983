use super::serialization::SerializationError;
use super::CacheError;

/// Outcome of a cache lookup on the read path.
///
/// Only [`CacheLookup::Hit`] is served. The other three variants all fall
/// through to the store, but stay distinct so that a definite miss is not
/// confused with a cache that could not answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<T> {
    /// A value was found and decoded.
    Hit(T),
    /// The cache answered that the key is absent or expired.
    Miss,
    /// The cache could not be reached or timed out.
    Unavailable(CacheError),
    /// A value was found but could not be decoded.
    Corrupt(SerializationError),
}

impl<T> CacheLookup<T> {
    /// Resolves a raw cache response into a lookup outcome.
    pub fn resolve<F>(raw: Result<Option<Vec<u8>>, CacheError>, decode: F) -> Self
    where
        F: FnOnce(&[u8]) -> Result<T, SerializationError>,
    {
        match raw {
            Ok(Some(bytes)) => match decode(&bytes) {
                Ok(value) => CacheLookup::Hit(value),
                Err(err) => CacheLookup::Corrupt(err),
            },
            Ok(None) => CacheLookup::Miss,
            Err(err) => CacheLookup::Unavailable(err),
        }
    }

    /// Short label used in log fields.
    pub fn outcome(&self) -> &'static str {
        match self {
            CacheLookup::Hit(_) => "hit",
            CacheLookup::Miss => "miss",
            CacheLookup::Unavailable(_) => "unavailable",
            CacheLookup::Corrupt(_) => "corrupt",
        }
    }
}
