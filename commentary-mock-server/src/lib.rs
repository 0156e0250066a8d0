use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use commentary_api::{
    Comment, CommentId, DataService, Error, FeedMessage, NewComment, Order, Page, Query,
    Subscription, SubscriptionId, SubscriptionStatus, Time,
};
use futures::{channel::mpsc, StreamExt};
use parking_lot::Mutex;

/// In-memory data service with a relayed insert feed
///
/// Clones share the same tables, so a test can keep one handle to inject faults and look at
/// counters while the controller uses another.
#[derive(Clone, Debug, Default)]
pub struct MockServer(Arc<Mutex<Db>>);

#[derive(Debug, Default)]
struct Db {
    tables: HashMap<String, Vec<Comment>>,
    next_id: i64,
    clock: Option<Time>,
    feeds: HashMap<SubscriptionId, Feed>,
    latency: Duration,
    faults: Faults,
    stats: Stats,
}

#[derive(Debug)]
struct Feed {
    table: String,
    sender: mpsc::UnboundedSender<FeedMessage>,
}

#[derive(Debug, Default)]
struct Faults {
    query: Option<Error>,
    insert: Option<Error>,
    subscribe: Option<Error>,
    touch: Option<Error>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    pub queries: usize,
    pub inserts: usize,
    pub subscriptions: usize,
    pub unsubscriptions: usize,
    pub touches: usize,
}

impl Db {
    fn create(&mut self, table: &str, c: &NewComment) -> Comment {
        self.next_id += 1;
        // every comment is one second newer than the previous one, to keep orderings predictable
        let created_at = match self.clock {
            None => Utc::now(),
            Some(t) => t + chrono::Duration::seconds(1),
        };
        self.clock = Some(created_at);
        let comment = Comment {
            id: CommentId(self.next_id),
            username: c.username.clone(),
            content: c.content.clone(),
            created_at,
        };
        self.tables
            .entry(String::from(table))
            .or_insert_with(Vec::new)
            .push(comment.clone());
        comment
    }

    fn relay(&mut self, table: &str, msg: FeedMessage) {
        self.feeds
            .retain(|_, f| f.table != table || f.sender.unbounded_send(msg.clone()).is_ok());
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer::default()
    }

    /// Add `n` comments to `table` without relaying them to feeds
    pub fn seed(&self, table: &str, n: usize) -> Vec<Comment> {
        let mut db = self.0.lock();
        (0..n)
            .map(|i| {
                db.create(
                    table,
                    &NewComment {
                        username: format!("user {i}"),
                        content: format!("seeded comment {i}"),
                    },
                )
            })
            .collect()
    }

    /// Insert a comment as another visitor would, relaying it to the subscribed feeds
    pub fn insert_remote(&self, table: &str, username: &str, content: &str) -> Comment {
        let mut db = self.0.lock();
        let comment = db.create(
            table,
            &NewComment {
                username: String::from(username),
                content: String::from(content),
            },
        );
        db.relay(table, FeedMessage::Insert(comment.clone()));
        comment
    }

    /// Send an already-relayed comment again, as a redelivering transport would
    pub fn redeliver(&self, table: &str, comment: &Comment) {
        self.0
            .lock()
            .relay(table, FeedMessage::Insert(comment.clone()));
    }

    pub fn send_status(&self, table: &str, status: SubscriptionStatus) {
        self.0.lock().relay(table, FeedMessage::Status(status));
    }

    /// Close every feed, as a dropped connection would
    pub fn drop_feeds(&self) {
        self.0.lock().feeds.clear();
    }

    pub fn comments(&self, table: &str) -> Vec<Comment> {
        self.0.lock().tables.get(table).cloned().unwrap_or_default()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.0.lock().feeds.len()
    }

    pub fn stats(&self) -> Stats {
        self.0.lock().stats.clone()
    }

    /// Delay answering queries, inserts and subscriptions
    pub fn set_latency(&self, latency: Duration) {
        self.0.lock().latency = latency;
    }

    pub fn fail_queries(&self, err: Option<Error>) {
        self.0.lock().faults.query = err;
    }

    pub fn fail_inserts(&self, err: Option<Error>) {
        self.0.lock().faults.insert = err;
    }

    pub fn fail_subscriptions(&self, err: Option<Error>) {
        self.0.lock().faults.subscribe = err;
    }

    pub fn fail_touches(&self, err: Option<Error>) {
        self.0.lock().faults.touch = err;
    }

    async fn wait_latency(&self) {
        let latency = self.0.lock().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait(?Send)]
impl DataService for MockServer {
    async fn query(&self, q: &Query) -> Result<Page, Error> {
        self.0.lock().stats.queries += 1;
        self.wait_latency().await;
        let db = self.0.lock();
        if let Some(err) = &db.faults.query {
            return Err(err.clone());
        }
        let mut comments = db.tables.get(&q.table).cloned().unwrap_or_default();
        q.order.sort(&mut comments);
        let total = comments.len();
        let start = std::cmp::min(q.range.start, total);
        let end = std::cmp::min(q.range.end, total);
        Ok(Page {
            comments: comments.drain(start..end).collect(),
            total,
        })
    }

    async fn insert(&self, table: &str, c: &NewComment) -> Result<Comment, Error> {
        self.0.lock().stats.inserts += 1;
        self.wait_latency().await;
        let mut db = self.0.lock();
        if let Some(err) = &db.faults.insert {
            return Err(err.clone());
        }
        let comment = db.create(table, c);
        db.relay(table, FeedMessage::Insert(comment.clone()));
        Ok(comment)
    }

    async fn subscribe(&self, table: &str) -> Result<Subscription, Error> {
        self.wait_latency().await;
        let mut db = self.0.lock();
        if let Some(err) = &db.faults.subscribe {
            return Err(err.clone());
        }
        db.stats.subscriptions += 1;
        let id = SubscriptionId::new();
        let (sender, receiver) = mpsc::unbounded();
        let _ = sender.unbounded_send(FeedMessage::Status(SubscriptionStatus::Subscribed));
        db.feeds.insert(
            id,
            Feed {
                table: String::from(table),
                sender,
            },
        );
        tracing::debug!(?id, table, "opened mock feed");
        Ok(Subscription {
            id,
            feed: receiver.boxed_local(),
        })
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let mut db = self.0.lock();
        db.stats.unsubscriptions += 1;
        db.feeds.remove(&id);
    }

    async fn touch(&self, id: SubscriptionId) -> Result<(), Error> {
        let mut db = self.0.lock();
        db.stats.touches += 1;
        if let Some(err) = &db.faults.touch {
            return Err(err.clone());
        }
        match db.feeds.contains_key(&id) {
            true => Ok(()),
            false => Err(Error::ChannelClosed),
        }
    }
}

/// Ordering used by the service, exposed for tests that compare against it
pub fn newest_first(mut comments: Vec<Comment>) -> Vec<Comment> {
    Order::newest_first().sort(&mut comments);
    comments
}
