use anyhow::Context;
use commentary_client::api::{Comment, FeedMessage, SubscriptionStatus};
use serde_json::json;

/// Frame of the phoenix channels protocol spoken by the realtime endpoint
#[derive(Debug, serde::Deserialize, serde::Serialize)]
pub struct PhxMessage {
    pub topic: String,
    pub event: String,
    pub payload: serde_json::Value,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct Change {
    data: ChangeData,
}

#[derive(Debug, serde::Deserialize)]
struct ChangeData {
    #[serde(rename = "type")]
    kind: String,
    record: Option<Comment>,
}

pub fn topic(table: &str) -> String {
    format!("realtime:public:{table}")
}

pub fn join(topic: &str, table: &str, access_token: &str, reference: u64) -> PhxMessage {
    PhxMessage {
        topic: String::from(topic),
        event: String::from("phx_join"),
        payload: json!({
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [
                    { "event": "INSERT", "schema": "public", "table": table },
                ],
            },
            "access_token": access_token,
        }),
        reference: Some(reference.to_string()),
    }
}

pub fn leave(topic: &str, reference: u64) -> PhxMessage {
    PhxMessage {
        topic: String::from(topic),
        event: String::from("phx_leave"),
        payload: json!({}),
        reference: Some(reference.to_string()),
    }
}

pub fn heartbeat(reference: u64) -> PhxMessage {
    PhxMessage {
        topic: String::from("phoenix"),
        event: String::from("heartbeat"),
        payload: json!({}),
        reference: Some(reference.to_string()),
    }
}

/// Translate a frame received on `topic` into what the feed controller understands
///
/// Returns None for frames that carry nothing for the feed, eg. heartbeat replies.
pub fn decode(topic: &str, msg: PhxMessage) -> anyhow::Result<Option<FeedMessage>> {
    if msg.topic != topic {
        return Ok(None);
    }
    Ok(match &msg.event as &str {
        "phx_reply" => match msg.payload.get("status").and_then(|s| s.as_str()) {
            Some("ok") => Some(FeedMessage::Status(SubscriptionStatus::Subscribed)),
            status => {
                tracing::warn!(?status, payload = %msg.payload, "realtime join refused");
                Some(FeedMessage::Status(SubscriptionStatus::ChannelError))
            }
        },
        "phx_error" => Some(FeedMessage::Status(SubscriptionStatus::ChannelError)),
        "phx_close" => Some(FeedMessage::Status(SubscriptionStatus::Closed)),
        "postgres_changes" => {
            let change: Change =
                serde_json::from_value(msg.payload).context("parsing postgres change")?;
            match (&change.data.kind as &str, change.data.record) {
                ("INSERT", Some(c)) => Some(FeedMessage::Insert(c)),
                (kind, _) => {
                    tracing::debug!(kind, "ignoring non-insert change");
                    None
                }
            }
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use commentary_client::api::CommentId;

    fn frame(s: &str) -> PhxMessage {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn decodes_insert() {
        let msg = frame(
            r#"{"topic":"realtime:public:comments","event":"postgres_changes","ref":null,
                "payload":{"ids":[1],"data":{"type":"INSERT","schema":"public","table":"comments",
                "commit_timestamp":"2023-01-01T00:00:00Z",
                "record":{"id":42,"username":"ana","content":"hi","created_at":"2023-01-01T00:00:00Z"}}}}"#,
        );
        match decode("realtime:public:comments", msg).unwrap() {
            Some(FeedMessage::Insert(c)) => {
                assert_eq!(c.id, CommentId(42));
                assert_eq!(c.content, "hi");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn decodes_statuses() {
        let t = topic("comments");
        let reply = |status: &str| {
            frame(&format!(
                r#"{{"topic":"{t}","event":"phx_reply","ref":"1","payload":{{"status":"{status}","response":{{}}}}}}"#
            ))
        };
        assert_eq!(
            decode(&t, reply("ok")).unwrap(),
            Some(FeedMessage::Status(SubscriptionStatus::Subscribed))
        );
        assert_eq!(
            decode(&t, reply("error")).unwrap(),
            Some(FeedMessage::Status(SubscriptionStatus::ChannelError))
        );
        let close = frame(&format!(
            r#"{{"topic":"{t}","event":"phx_close","ref":null,"payload":{{}}}}"#
        ));
        assert_eq!(
            decode(&t, close).unwrap(),
            Some(FeedMessage::Status(SubscriptionStatus::Closed))
        );
    }

    #[test]
    fn ignores_other_topics() {
        let msg = frame(
            r#"{"topic":"phoenix","event":"phx_reply","ref":"3","payload":{"status":"ok","response":{}}}"#,
        );
        assert_eq!(decode(&topic("comments"), msg).unwrap(), None);
    }
}
