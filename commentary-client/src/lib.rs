mod config;
pub use config::{FeedConfig, RenderPolicy, RetryPolicy};

mod controller;
pub use controller::{ClientSource, FeedController};

mod error;
pub use error::Error;

mod feed;
pub use feed::{CommentList, Cursor};

mod messages;
pub use messages::Messages;

mod prefs;
pub use prefs::MemoryStore;

mod sanitize;
pub use sanitize::{display_text, sanitize, sanitize_comment};

mod timer;
pub use timer::{sleep_for, sleep_until};

mod view;
pub use view::{ConnState, View};


pub mod api {
    pub use commentary_api::*;
}
