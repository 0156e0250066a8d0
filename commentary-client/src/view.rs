use crate::api::Comment;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnState {
    Uninitialized,
    Connecting,
    Connected,
    Disconnected,
}

/// Everything the controller displays goes through here
///
/// Implementations must not call back into the controller synchronously.
pub trait View {
    fn show_loading(&self, message: &str);

    /// Always called with the whole list, newest first
    fn show_comments(&self, comments: &[Comment]);

    /// Shown instead of an empty list
    fn show_placeholder(&self, message: &str);

    /// Blocking message displayed in place of the feed
    fn show_banner(&self, message: &str);

    fn set_load_more_visible(&self, visible: bool);
    fn set_connection_state(&self, state: ConnState);
    fn set_submitting(&self, submitting: bool);

    /// Inline error, next to the submission form
    fn show_error(&self, message: &str);
    fn clear_error(&self);

    fn reset_comment_input(&self);
    fn set_char_count(&self, counter: &str);
    fn set_username(&self, username: &str);
}
