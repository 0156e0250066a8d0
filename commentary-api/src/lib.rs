use std::{cmp::Reverse, ops::Range};

use chrono::Utc;

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<Utc>;

mod db;
pub use db::{DataService, PreferenceStore, Subscription};

mod error;
pub use error::Error;

mod feed;
pub use feed::{FeedMessage, SubscriptionId, SubscriptionStatus};

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

/// Server-assigned identity of a comment, increasing with creation order
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct CommentId(pub i64);

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub username: String,
    pub content: String,
    pub created_at: Time,
}

/// A comment as submitted by the client, before the service assigns it an id and a date
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub username: String,
    pub content: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum OrderType {
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum Order {
    CreatedAt(OrderType),
}

impl Order {
    pub fn newest_first() -> Order {
        Order::CreatedAt(OrderType::Desc)
    }

    /// Ordering clause in the `column.direction` form understood by PostgREST
    pub fn to_postgrest(&self) -> String {
        match self {
            Order::CreatedAt(OrderType::Asc) => String::from("created_at.asc"),
            Order::CreatedAt(OrderType::Desc) => String::from("created_at.desc"),
        }
    }

    /// Ties on the creation date are broken by id, so that the order is total
    pub fn sort(&self, comments: &mut [Comment]) {
        match self {
            Order::CreatedAt(OrderType::Asc) => {
                comments.sort_unstable_by_key(|c| (c.created_at, c.id))
            }
            Order::CreatedAt(OrderType::Desc) => {
                comments.sort_unstable_by_key(|c| Reverse((c.created_at, c.id)))
            }
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Query {
    pub table: String,
    pub order: Order,

    /// Window of rows to return, end excluded
    pub range: Range<usize>,
}

impl Query {
    pub fn page(table: &str, offset: usize, limit: usize) -> Query {
        Query {
            table: String::from(table),
            order: Order::newest_first(),
            range: offset..offset + limit,
        }
    }

    /// Smallest possible read, used to check that the service answers at all
    pub fn probe(table: &str) -> Query {
        Query::page(table, 0, 1)
    }
}

/// One window of comments, along with the exact number of rows in the table
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Page {
    pub comments: Vec<Comment>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn comment(id: i64, secs: i64) -> Comment {
        Comment {
            id: CommentId(id),
            username: String::from("alice"),
            content: format!("comment {id}"),
            created_at: Utc.timestamp_opt(1_600_000_000 + secs, 0).unwrap(),
        }
    }

    #[test]
    fn newest_first_breaks_ties_by_id() {
        let mut comments = vec![comment(1, 10), comment(3, 5), comment(2, 10)];
        Order::newest_first().sort(&mut comments);
        let ids = comments.iter().map(|c| c.id.0).collect::<Vec<_>>();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn page_windows() {
        let q = Query::page("comments", 20, 10);
        assert_eq!(q.range, 20..30);
        assert_eq!(q.order.to_postgrest(), "created_at.desc");
        assert_eq!(Query::probe("comments").range, 0..1);
    }

    #[test]
    fn comment_id_is_transparent() {
        let c = comment(42, 0);
        let json = serde_json::to_value(&c).expect("serializing comment");
        assert_eq!(json["id"], serde_json::json!(42));
    }
}
