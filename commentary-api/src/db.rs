use async_trait::async_trait;
use futures::stream::LocalBoxStream;

use crate::{Comment, Error, FeedMessage, NewComment, Page, Query, SubscriptionId};

/// An open change-feed subscription
///
/// The feed yields events one at a time, in the order the service emitted them, and ends when the
/// underlying transport goes away.
pub struct Subscription {
    pub id: SubscriptionId,
    pub feed: LocalBoxStream<'static, FeedMessage>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[async_trait(?Send)]
pub trait DataService {
    async fn query(&self, q: &Query) -> Result<Page, Error>;

    /// Returns the row as stored by the service
    async fn insert(&self, table: &str, c: &NewComment) -> Result<Comment, Error>;

    /// Subscribe to insert events on `table`
    async fn subscribe(&self, table: &str) -> Result<Subscription, Error>;

    fn unsubscribe(&self, id: SubscriptionId);

    /// Keep the transport behind a subscription from idling out
    async fn touch(&self, id: SubscriptionId) -> Result<(), Error>;
}

pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}
