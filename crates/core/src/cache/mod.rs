mod error;
mod invalidation;
mod keys;
mod lookup;
mod patterns;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use invalidation::{invalidation_patterns, invalidations_for, Mutation};
pub use keys::{
    collection_of_key, collection_of_pattern, collection_tracking_key, feed_collection,
    feed_collection_pattern, feed_key,
};
pub use lookup::CacheLookup;
pub use patterns::pattern_matches;
pub use serialization::{decode_feed, encode_feed, SerializationError, CODEC_VERSION};
pub use traits::Cache;
