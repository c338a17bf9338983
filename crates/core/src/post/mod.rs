mod error;
mod query;
mod requests;
mod types;

pub use error::ValidationError;
pub use query::{FeedQuery, FeedScope, MAX_FEED_LIMIT};
pub use requests::{LikePost, NewPost, MAX_CONTENT_LEN, MAX_TITLE_LEN};
pub use types::{Author, AuthorRef, Post, PostCounts, PostSummary};
