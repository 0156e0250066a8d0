mod app;
pub use app::{App, AppMsg};

mod comment_form;
pub use comment_form::CommentForm;

mod comment_list;
pub use comment_list::{CommentList, FeedContent};

mod status_indicator;
pub use status_indicator::StatusIndicator;
