use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use commentary_client::{
    api::{
        Comment, DataService, Error, FeedMessage, NewComment, Page, Query, Subscription,
        SubscriptionId, SubscriptionStatus,
    },
    sleep_for,
};
use futures::{channel::mpsc, pin_mut, select, FutureExt, SinkExt, StreamExt};
use parking_lot::Mutex;
use reqwest::StatusCode;
use wasm_bindgen_futures::spawn_local;
use ws_stream_wasm::{WsMessage, WsMeta};

use crate::{realtime, util};

// If the channel join is not acknowledged within JOIN_TIMEOUT, report the subscription timed out
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for a PostgREST table with a phoenix realtime change-feed next to it
pub struct RestClient {
    url: String,
    key: String,
    next_ref: AtomicU64,
    channels: Mutex<HashMap<SubscriptionId, mpsc::UnboundedSender<String>>>,
}

/// Build the client, once the page has provided the service configuration
pub fn acquire_client() -> Option<Arc<RestClient>> {
    let (url, key) = util::service_config()?;
    Some(Arc::new(RestClient::new(url, key)))
}

fn network_error(err: reqwest::Error) -> Error {
    Error::Network(err.to_string())
}

fn service_error(status: StatusCode, body: &[u8]) -> Error {
    Error::parse(body).unwrap_or_else(|err| {
        tracing::warn!(?err, %status, "failed parsing error response");
        Error::Unknown(format!("{status}: {}", String::from_utf8_lossy(body)))
    })
}

/// Extract the total row count out of a `Content-Range: 0-9/25` header
fn parse_content_range(header: &str) -> Option<usize> {
    let (_, total) = header.split_once('/')?;
    total.trim().parse().ok()
}

impl RestClient {
    pub fn new(url: String, key: String) -> RestClient {
        RestClient {
            url: String::from(url.trim_end_matches('/')),
            key,
            next_ref: AtomicU64::new(1),
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    fn websocket_url(&self) -> String {
        let base = match self.url.strip_prefix("http") {
            Some(rest) => format!("ws{rest}"),
            None => self.url.clone(),
        };
        format!("{base}/realtime/v1/websocket?apikey={}&vsn=1.0.0", self.key)
    }

    fn next_ref(&self) -> u64 {
        self.next_ref.fetch_add(1, Ordering::Relaxed)
    }

    fn encode(msg: &realtime::PhxMessage) -> Result<String, Error> {
        serde_json::to_string(msg).map_err(|e| Error::Unknown(format!("encoding frame: {e}")))
    }
}

#[async_trait(?Send)]
impl DataService for RestClient {
    async fn query(&self, q: &Query) -> Result<Page, Error> {
        let order = q.order.to_postgrest();
        let resp = crate::CLIENT
            .get(self.table_url(&q.table))
            .query(&[("select", "*"), ("order", order.as_str())])
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Range-Unit", "items")
            .header(
                "Range",
                format!("{}-{}", q.range.start, q.range.end.saturating_sub(1)),
            )
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(network_error)?;
        let status = resp.status();
        let total = resp
            .headers()
            .get("content-range")
            .and_then(|h| h.to_str().ok())
            .and_then(parse_content_range);
        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            // asked past the end, eg. rows were deleted since the previous page
            return Ok(Page {
                comments: Vec::new(),
                total: total.unwrap_or(q.range.start),
            });
        }
        let body = resp.bytes().await.map_err(network_error)?;
        if !status.is_success() {
            return Err(service_error(status, &body));
        }
        let comments: Vec<Comment> = serde_json::from_slice(&body)
            .map_err(|e| Error::Unknown(format!("parsing comments: {e}")))?;
        let total = total.unwrap_or(q.range.start + comments.len());
        Ok(Page { comments, total })
    }

    async fn insert(&self, table: &str, c: &NewComment) -> Result<Comment, Error> {
        let resp = crate::CLIENT
            .post(self.table_url(table))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", "return=representation")
            .json(&[c])
            .send()
            .await
            .map_err(network_error)?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(network_error)?;
        if !status.is_success() {
            return Err(service_error(status, &body));
        }
        let rows: Vec<Comment> = serde_json::from_slice(&body)
            .map_err(|e| Error::Unknown(format!("parsing inserted comment: {e}")))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::Unknown(String::from("insert returned no row")))
    }

    async fn subscribe(&self, table: &str) -> Result<Subscription, Error> {
        let (_, sock) = WsMeta::connect(self.websocket_url(), None)
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let topic = realtime::topic(table);
        let join = Self::encode(&realtime::join(&topic, table, &self.key, self.next_ref()))?;
        let leave = Self::encode(&realtime::leave(&topic, self.next_ref()))?;

        let id = SubscriptionId::new();
        let (feed_sender, feed_receiver) = mpsc::unbounded();
        let (out_sender, out_receiver) = mpsc::unbounded();
        // the join goes out first, before anything touch() could queue
        out_sender
            .unbounded_send(join)
            .map_err(|_| Error::ChannelClosed)?;
        self.channels.lock().insert(id, out_sender);
        spawn_local(pump(id, topic, sock, out_receiver, feed_sender, leave));
        Ok(Subscription {
            id,
            feed: feed_receiver.boxed_local(),
        })
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        // dropping the sender makes the pump leave the channel and close the socket
        if self.channels.lock().remove(&id).is_none() {
            tracing::debug!(?id, "unsubscribing from an already-closed channel");
        }
    }

    async fn touch(&self, id: SubscriptionId) -> Result<(), Error> {
        let sender = self
            .channels
            .lock()
            .get(&id)
            .cloned()
            .ok_or(Error::ChannelClosed)?;
        let msg = Self::encode(&realtime::heartbeat(self.next_ref()))?;
        sender.unbounded_send(msg).map_err(|_| Error::ChannelClosed)
    }
}

/// Move frames between one websocket and the feed, until either side goes away
async fn pump(
    id: SubscriptionId,
    topic: String,
    sock: ws_stream_wasm::WsStream,
    outgoing: mpsc::UnboundedReceiver<String>,
    feed: mpsc::UnboundedSender<FeedMessage>,
    leave: String,
) {
    let (mut sink, stream) = sock.split();
    let mut stream = stream.fuse();
    let mut outgoing = outgoing.fuse();
    let join_timeout = sleep_for(JOIN_TIMEOUT).fuse();
    pin_mut!(join_timeout);
    let mut joined = false;
    loop {
        select! {
            msg = outgoing.next() => match msg {
                None => {
                    tracing::debug!(?id, "leaving realtime channel");
                    let _ = sink.send(WsMessage::Text(leave)).await;
                    break;
                }
                Some(msg) => {
                    if let Err(err) = sink.send(WsMessage::Text(msg)).await {
                        tracing::warn!(?id, %err, "failed sending realtime frame");
                        break;
                    }
                }
            },
            msg = stream.next() => {
                let frame = match msg {
                    None => {
                        tracing::warn!(?id, "realtime socket closed");
                        break;
                    }
                    Some(WsMessage::Text(t)) => serde_json::from_str(&t),
                    Some(WsMessage::Binary(b)) => serde_json::from_slice(&b),
                };
                let decoded = match frame {
                    Ok(frame) => realtime::decode(&topic, frame),
                    Err(err) => Err(err.into()),
                };
                match decoded {
                    Ok(None) => (),
                    Ok(Some(msg)) => {
                        if let FeedMessage::Status(status) = &msg {
                            joined |= status.is_connected();
                        }
                        if feed.unbounded_send(msg).is_err() {
                            break;
                        }
                    }
                    Err(err) => tracing::warn!(?id, ?err, "ignoring undecodable realtime frame"),
                }
            }
            _ = join_timeout => {
                if !joined {
                    let _ = feed.unbounded_send(FeedMessage::Status(SubscriptionStatus::TimedOut));
                    break;
                }
            }
        }
    }
    if let Err(err) = sink.close().await {
        tracing::debug!(?id, %err, "failed closing realtime socket");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range() {
        assert_eq!(parse_content_range("0-9/25"), Some(25));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-9/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn websocket_url_follows_scheme() {
        let c = RestClient::new(String::from("https://x.example.org/"), String::from("k"));
        assert_eq!(
            c.websocket_url(),
            "wss://x.example.org/realtime/v1/websocket?apikey=k&vsn=1.0.0"
        );
        assert_eq!(c.table_url("comments"), "https://x.example.org/rest/v1/comments");
    }
}
