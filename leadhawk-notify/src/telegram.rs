//! Telegram notifier.
//!
//! Fixed-shape HTML message: header, query hashtag, a short summary
//! preview, and a clickable link to the post. Link previews are disabled so
//! a burst of leads doesn't flood the chat with embeds.

use crate::{Notifier, NotifyError};
use async_trait::async_trait;
use leadhawk_common::{preview, LeadRecord};
use leadhawk_http::{HttpClient, HttpError, RequestOpts};
use serde::Deserialize;
use serde_json::json;

const SUMMARY_PREVIEW_CHARS: usize = 100;

pub struct TelegramNotifier {
    http: HttpClient,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> anyhow::Result<Self> {
        let http = HttpClient::new("https://api.telegram.org")?;
        Ok(Self {
            http,
            bot_token,
            chat_id,
        })
    }
}

/// Telegram HTML parse mode only honours a handful of tags; everything
/// user-derived must be entity-escaped or the API rejects the message.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn format_message(lead: &LeadRecord) -> String {
    format!(
        "🎯 <b>Leadhawk 雷達響了！</b>\n\
         關鍵字：#{label}\n\
         ------------------\n\
         {summary}\n\
         ------------------\n\
         🔗 <a href=\"{link}\">點擊查看貼文</a>",
        label = escape_html(&lead.query_label),
        summary = escape_html(&preview(&lead.summary, SUMMARY_PREVIEW_CHARS)),
        link = escape_html(&lead.identity),
    )
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, lead: &LeadRecord) -> Result<(), NotifyError> {
        let payload = json!({
            "chat_id": self.chat_id,
            "text": format_message(lead),
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        // At most one delivery attempt per lead per run.
        let resp: SendMessageResponse = self
            .http
            .post_json(
                &format!("bot{}/sendMessage", self.bot_token),
                &payload,
                RequestOpts {
                    retries: Some(0),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| match e {
                HttpError::Network(msg) => NotifyError::Transport(msg),
                other => NotifyError::Rejected(other.to_string()),
            })?;

        if !resp.ok {
            return Err(NotifyError::Rejected("telegram answered ok=false".into()));
        }

        tracing::info!(identity = %lead.identity, query = %lead.query_label, "notify.sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead() -> LeadRecord {
        LeadRecord {
            identity: "https://threads.net/post/123".into(),
            summary: "分享我的經驗".into(),
            query_label: "中壢接睫毛".into(),
        }
    }

    #[test]
    fn message_has_label_summary_and_clickable_link() {
        let msg = format_message(&lead());
        assert!(msg.contains("#中壢接睫毛"));
        assert!(msg.contains("分享我的經驗"));
        assert!(msg.contains("<a href=\"https://threads.net/post/123\">"));
    }

    #[test]
    fn long_summaries_are_previewed_on_char_boundaries() {
        let mut l = lead();
        l.summary = "想".repeat(150);
        let msg = format_message(&l);
        assert!(msg.contains(&("想".repeat(100) + "…")));
        assert!(!msg.contains(&"想".repeat(101)));
    }

    #[test]
    fn user_text_is_entity_escaped() {
        let mut l = lead();
        l.summary = "<b>bold</b> & more".into();
        let msg = format_message(&l);
        assert!(msg.contains("&lt;b&gt;bold&lt;/b&gt; &amp; more"));
    }

    #[test]
    fn link_query_params_survive_escaping() {
        let mut l = lead();
        l.identity = "https://threads.net/post/123?a=1&b=2".into();
        let msg = format_message(&l);
        assert!(msg.contains("href=\"https://threads.net/post/123?a=1&amp;b=2\""));
    }
}
