use crate::api;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Data service client is not available")]
    ClientUnavailable,

    #[error("Connection probe failed: {0}")]
    ConnectionProbeFailed(#[source] api::Error),

    #[error("Failed loading comments: {0}")]
    QueryFailed(#[source] api::Error),

    #[error("Failed posting comment: {0}")]
    InsertFailed(#[source] api::Error),

    #[error("Comment is empty")]
    EmptyContent,

    #[error("Comment is {len} characters long, more than the maximum of {max}")]
    ContentTooLong { len: usize, max: usize },

    #[error("Realtime subscription dropped")]
    SubscriptionDropped,
}
