use anyhow::{anyhow, Context};

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    /// Error reported by the service itself, displayed as the service worded it
    #[error("{message}")]
    Service {
        code: Option<String>,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Realtime channel closed")]
    ChannelClosed,
}

impl Error {
    pub fn service(message: impl Into<String>) -> Error {
        Error::Service {
            code: None,
            message: message.into(),
        }
    }

    /// Parse an error body in the form PostgREST sends them
    ///
    /// `details` and `hint` are appended to the message when present, so that nothing the
    /// service said is lost when displaying the error.
    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let field = |name: &str| {
            data.get(name)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
        };
        let mut message = String::from(
            field("message")
                .or_else(|| field("error"))
                .ok_or_else(|| anyhow!("error contents has no message"))?,
        );
        if let Some(details) = field("details") {
            message.push_str(" (");
            message.push_str(details);
            message.push(')');
        }
        if let Some(hint) = field("hint") {
            message.push_str(" hint: ");
            message.push_str(hint);
        }
        Ok(Error::Service {
            code: field("code").map(String::from),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_postgrest_error() {
        let body = br#"{"code":"23505","details":"Key (id)=(1) already exists.","hint":null,"message":"duplicate key value violates unique constraint"}"#;
        assert_eq!(
            Error::parse(body).unwrap(),
            Error::Service {
                code: Some(String::from("23505")),
                message: String::from(
                    "duplicate key value violates unique constraint (Key (id)=(1) already exists.)"
                ),
            }
        );
    }

    #[test]
    fn parse_gateway_error() {
        let body = br#"{"error":"Invalid API key"}"#;
        let err = Error::parse(body).unwrap();
        assert_eq!(err.to_string(), "Invalid API key");
    }

    #[test]
    fn parse_garbage() {
        assert!(Error::parse(b"<html>502</html>").is_err());
        assert!(Error::parse(br#"{"status":500}"#).is_err());
    }
}
