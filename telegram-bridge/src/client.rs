//! Telegram Bot API client

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// One inbound chat message with its source update id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub update_id: i64,
    pub text: String,
}

/// Thin client over `sendMessage` / `getUpdates`.
///
/// Owns the update cursor. The cursor only advances after a response has
/// been received and decoded, so a transport failure never skips
/// unprocessed messages; each message is consumed exactly once.
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    chat_id: String,
    last_update_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ApiAck {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    text: Option<String>,
}

impl TelegramClient {
    pub fn new(bot_token: &str, chat_id: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            base_url: format!("https://api.telegram.org/bot{bot_token}"),
            chat_id: chat_id.to_string(),
            last_update_id: None,
        })
    }

    /// Send an HTML-formatted message to the configured chat.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let url = format!("{}/sendMessage", self.base_url);
        let ack: ApiAck = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": self.chat_id,
                "text": text,
                "parse_mode": "HTML",
            }))
            .send()
            .await
            .context("sending Telegram message")?
            .error_for_status()
            .context("Telegram rejected sendMessage")?
            .json()
            .await
            .context("decoding sendMessage ack")?;

        if !ack.ok {
            return Err(anyhow!(
                "sendMessage not acknowledged: {}",
                ack.description.unwrap_or_default()
            ));
        }
        Ok(())
    }

    /// Fetch messages newer than the cursor, in order. Updates without a
    /// text body still advance the cursor (they were delivered; there is
    /// nothing to re-process).
    pub async fn receive_new_messages(&mut self) -> Result<Vec<InboundMessage>> {
        let url = format!("{}/getUpdates", self.base_url);
        let mut request = self.http.get(&url);
        if let Some(last) = self.last_update_id {
            request = request.query(&[("offset", last + 1)]);
        }

        let response: UpdatesResponse = request
            .send()
            .await
            .context("polling Telegram updates")?
            .error_for_status()
            .context("Telegram rejected getUpdates")?
            .json()
            .await
            .context("decoding getUpdates payload")?;

        if !response.ok {
            return Err(anyhow!("getUpdates not acknowledged"));
        }

        let (messages, cursor) = extract_messages(response);
        if let Some(cursor) = cursor {
            self.last_update_id = Some(cursor);
        }
        debug!("received {} new messages", messages.len());
        Ok(messages)
    }

    #[cfg(test)]
    fn cursor(&self) -> Option<i64> {
        self.last_update_id
    }
}

/// Pull the text messages out of a decoded updates batch, with the highest
/// update id seen (the next cursor position).
fn extract_messages(response: UpdatesResponse) -> (Vec<InboundMessage>, Option<i64>) {
    let mut cursor = None;
    let mut messages = Vec::new();
    for update in response.result {
        cursor = Some(cursor.map_or(update.update_id, |c: i64| c.max(update.update_id)));
        if let Some(text) = update.message.and_then(|m| m.text) {
            messages.push(InboundMessage {
                update_id: update.update_id,
                text,
            });
        }
    }
    (messages, cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(body: &str) -> UpdatesResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn extracts_ordered_text_messages() {
        let response = decoded(
            r#"{
                "ok": true,
                "result": [
                    {"update_id": 10, "message": {"text": "yes"}},
                    {"update_id": 11, "message": {"text": "ok bnf"}}
                ]
            }"#,
        );
        let (messages, cursor) = extract_messages(response);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "yes");
        assert_eq!(messages[1].update_id, 11);
        assert_eq!(cursor, Some(11));
    }

    #[test]
    fn textless_updates_still_advance_cursor() {
        let response = decoded(
            r#"{
                "ok": true,
                "result": [
                    {"update_id": 20, "message": {}},
                    {"update_id": 21}
                ]
            }"#,
        );
        let (messages, cursor) = extract_messages(response);
        assert!(messages.is_empty());
        assert_eq!(cursor, Some(21));
    }

    #[test]
    fn empty_batch_leaves_cursor_alone() {
        let (messages, cursor) = extract_messages(decoded(r#"{"ok": true, "result": []}"#));
        assert!(messages.is_empty());
        assert_eq!(cursor, None);
    }

    #[test]
    fn client_starts_without_cursor() {
        let client = TelegramClient::new("123:abc", "42").unwrap();
        assert_eq!(client.cursor(), None);
    }
}
