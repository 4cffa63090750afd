//! Outlook source — one attribute-filtered Microsoft Graph query, newest
//! first, followed by per-message attachment listing.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use crate::harvest::{
    is_resume_filename, HarvestError, MailSource, RawAttachment, TimeWindow,
};

const GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";
const PAGE_SIZE: usize = 100;
/// Upper bound on messages examined per scan, matching the legacy inbox cap.
const MESSAGE_CAP: usize = 2000;

pub struct GraphSource {
    http: reqwest::Client,
    access_token: String,
}

impl GraphSource {
    pub fn new(http: reqwest::Client, access_token: String) -> Self {
        Self { http, access_token }
    }
}

#[derive(Debug, Deserialize)]
struct MessagePage {
    value: Vec<GraphMessage>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphMessage {
    id: String,
    #[serde(rename = "receivedDateTime")]
    received: Option<DateTime<Utc>>,
    #[serde(rename = "hasAttachments", default)]
    has_attachments: bool,
    from: Option<GraphFrom>,
}

#[derive(Debug, Deserialize)]
struct GraphFrom {
    #[serde(rename = "emailAddress")]
    email_address: Option<GraphEmailAddress>,
}

#[derive(Debug, Deserialize)]
struct GraphEmailAddress {
    address: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AttachmentPage {
    value: Vec<GraphAttachment>,
}

#[derive(Debug, Deserialize)]
struct GraphAttachment {
    name: Option<String>,
    #[serde(rename = "contentBytes")]
    content_bytes: Option<String>,
}

/// Builds the `$filter` expression: has-attachments AND received inside the window.
pub fn graph_filter(window: &TimeWindow) -> String {
    format!(
        "hasAttachments eq true and receivedDateTime ge {} and receivedDateTime le {}",
        window.start.to_rfc3339_opts(SecondsFormat::Secs, true),
        window.end.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

#[async_trait]
impl MailSource for GraphSource {
    async fn fetch(&self, window: &TimeWindow) -> Result<Vec<RawAttachment>, HarvestError> {
        // Authenticated-session precondition, checked before any provider call.
        if self.access_token.trim().is_empty() {
            return Err(HarvestError::NotAuthenticated);
        }

        let mut attachments = Vec::new();
        let mut scanned = 0usize;
        let mut next: Option<String> = None;

        let filter = graph_filter(window);
        let top = PAGE_SIZE.to_string();

        loop {
            let request = match &next {
                Some(link) => self.http.get(link),
                None => self.http.get(format!("{GRAPH_BASE}/me/messages")).query(&[
                    ("$filter", filter.as_str()),
                    ("$orderby", "receivedDateTime desc"),
                    ("$select", "id,from,receivedDateTime,hasAttachments"),
                    ("$top", top.as_str()),
                ]),
            };

            let response = request
                .bearer_auth(&self.access_token)
                .send()
                .await
                .map_err(|e| HarvestError::Provider(format!("Graph request failed: {e}")))?;

            let status = response.status();
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(HarvestError::Auth(format!(
                    "Graph API rejected the access token (status {status})"
                )));
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(HarvestError::Provider(format!(
                    "Graph query failed (status {status}): {body}"
                )));
            }

            let page: MessagePage = response
                .json()
                .await
                .map_err(|e| HarvestError::Provider(format!("Graph response malformed: {e}")))?;

            for message in &page.value {
                scanned += 1;
                if scanned % 25 == 0 {
                    debug!("Scanning inbox: checked {scanned} messages...");
                }
                if !message.has_attachments {
                    continue;
                }
                if let Some(received) = message.received {
                    if !window.contains(received) {
                        continue;
                    }
                }
                self.collect_message_attachments(message, &mut attachments)
                    .await?;
                if scanned >= MESSAGE_CAP {
                    break;
                }
            }

            if scanned >= MESSAGE_CAP || page.next_link.is_none() {
                break;
            }
            next = page.next_link;
        }

        info!(
            "Outlook scan checked {} messages, {} resume attachments",
            scanned,
            attachments.len()
        );
        Ok(attachments)
    }
}

impl GraphSource {
    async fn collect_message_attachments(
        &self,
        message: &GraphMessage,
        out: &mut Vec<RawAttachment>,
    ) -> Result<(), HarvestError> {
        let url = format!("{GRAPH_BASE}/me/messages/{}/attachments", message.id);
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| HarvestError::Provider(format!("Graph attachment fetch failed: {e}")))?;

        if !response.status().is_success() {
            // A single undownloadable message should not abort the scan.
            debug!(
                "Attachment listing for message {} returned {}",
                message.id,
                response.status()
            );
            return Ok(());
        }

        let page: AttachmentPage = response
            .json()
            .await
            .map_err(|e| HarvestError::Provider(format!("Graph attachment malformed: {e}")))?;

        let sender = sender_of(message);
        for attachment in page.value {
            let Some(name) = attachment.name else { continue };
            if !is_resume_filename(&name) {
                continue;
            }
            // Item attachments and references carry no contentBytes; only
            // file attachments are downloadable here.
            let Some(encoded) = attachment.content_bytes else {
                continue;
            };
            match BASE64.decode(encoded.as_bytes()) {
                Ok(bytes) => out.push(RawAttachment {
                    filename: name,
                    bytes: Bytes::from(bytes),
                    sender: sender.clone(),
                    received: message.received,
                }),
                Err(e) => debug!("Skipping undecodable attachment {name}: {e}"),
            }
        }
        Ok(())
    }
}

fn sender_of(message: &GraphMessage) -> String {
    message
        .from
        .as_ref()
        .and_then(|f| f.email_address.as_ref())
        .and_then(|e| e.address.clone().or_else(|| e.name.clone()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_graph_filter_combines_attachment_and_date_predicates() {
        let window = TimeWindow::range(
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
        );
        let filter = graph_filter(&window);
        assert!(filter.starts_with("hasAttachments eq true"));
        assert!(filter.contains("receivedDateTime ge 2024-03-10T00:00:00Z"));
        assert!(filter.contains("receivedDateTime le 2024-03-12T23:59:59Z"));
    }

    #[tokio::test]
    async fn test_empty_token_is_not_authenticated() {
        let source = GraphSource::new(reqwest::Client::new(), "   ".to_string());
        let window = TimeWindow::range(
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
        );
        let result = source.fetch(&window).await;
        assert!(matches!(result, Err(HarvestError::NotAuthenticated)));
    }

    #[test]
    fn test_message_page_deserializes_graph_shapes() {
        let body = r#"{
            "value": [{
                "id": "AAMkAD",
                "receivedDateTime": "2024-03-11T09:30:00Z",
                "hasAttachments": true,
                "from": {"emailAddress": {"address": "jane@example.com", "name": "Jane"}}
            }],
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/me/messages?$skip=100"
        }"#;
        let page: MessagePage = serde_json::from_str(body).unwrap();
        assert_eq!(page.value.len(), 1);
        assert!(page.value[0].has_attachments);
        assert_eq!(sender_of(&page.value[0]), "jane@example.com");
        assert!(page.next_link.is_some());
    }
}
