//! Direct messages over the Discord REST API.

use derive_more::Debug;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{SubscriberSink, endpoint, fetch_json};
use crate::error::ProviderError;

pub const DEFAULT_DISCORD_API_URL: &str = "https://discord.com/api/v10";

/// Sends direct messages as a bot user.
///
/// Every message opens (or reuses, Discord answers with the existing one) the
/// DM channel with the recipient and posts into it.
#[derive(Clone, Debug)]
pub struct DiscordSink {
    client: reqwest::Client,
    base: Url,
    #[debug(skip)]
    token: String,
}

impl DiscordSink {
    pub fn new(client: reqwest::Client, base: Url, token: impl Into<String>) -> Self {
        Self {
            client,
            base,
            token: token.into(),
        }
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }

    async fn open_dm_channel(&self, recipient_id: &str) -> Result<String, ProviderError> {
        let url = endpoint(&self.base, ["users", "@me", "channels"])?;
        let channel: Channel = fetch_json(
            self.client
                .post(url)
                .header(reqwest::header::AUTHORIZATION, self.authorization())
                .json(&CreateDm { recipient_id }),
        )
        .await?;
        Ok(channel.id)
    }
}

impl SubscriberSink for DiscordSink {
    async fn send_direct(&self, subscriber_id: &str, text: &str) -> Result<(), ProviderError> {
        let channel_id = self.open_dm_channel(subscriber_id).await?;
        let url = endpoint(&self.base, ["channels", channel_id.as_str(), "messages"])?;
        let message: Message = fetch_json(
            self.client
                .post(url)
                .header(reqwest::header::AUTHORIZATION, self.authorization())
                .json(&CreateMessage { content: text }),
        )
        .await?;
        debug!(subscriber = subscriber_id, channel = %channel_id, message = %message.id, "direct message sent");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CreateDm<'a> {
    recipient_id: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct Channel {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Message {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_not_logged() {
        let sink = DiscordSink::new(
            reqwest::Client::new(),
            Url::parse(DEFAULT_DISCORD_API_URL).unwrap(),
            "very-secret",
        );
        assert_eq!(sink.authorization(), "Bot very-secret");
        assert!(!format!("{sink:?}").contains("very-secret"));
    }

    #[test]
    fn test_request_bodies() {
        assert_eq!(
            serde_json::to_string(&CreateDm { recipient_id: "1234" }).unwrap(),
            r#"{"recipient_id":"1234"}"#
        );
        assert_eq!(
            serde_json::to_string(&CreateMessage { content: "hi" }).unwrap(),
            r#"{"content":"hi"}"#
        );
        let channel: Channel =
            serde_json::from_str(r#"{"id":"99","type":1,"recipients":[]}"#).unwrap();
        assert_eq!(channel.id, "99");
    }
}
