use crate::{Comment, Uuid, STUB_UUID};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    pub fn new() -> SubscriptionId {
        SubscriptionId(Uuid::new_v4())
    }

    pub fn stub() -> SubscriptionId {
        SubscriptionId(STUB_UUID)
    }
}

/// Status reported by the change-feed for one subscription
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Subscribed,
    ChannelError,
    TimedOut,
    Closed,
}

impl SubscriptionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, SubscriptionStatus::Subscribed)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum FeedMessage {
    Insert(Comment),
    Status(SubscriptionStatus),
}
