//! Gmail source — one server-side X-GM-RAW search over IMAP/TLS, then local
//! RFC822 parsing and exact-window filtering.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use mailparse::{DispositionType, MailHeaderMap, ParsedMail};
use tracing::{debug, info};

use crate::harvest::{
    decode_filename, is_resume_filename, HarvestError, MailSource, RawAttachment, TimeWindow,
};

const IMAP_PORT: u16 = 993;

pub struct ImapSource {
    host: String,
    email: String,
    app_password: String,
}

impl ImapSource {
    pub fn new(host: String, email: String, app_password: String) -> Self {
        Self {
            host,
            email,
            app_password,
        }
    }
}

#[async_trait]
impl MailSource for ImapSource {
    async fn fetch(&self, window: &TimeWindow) -> Result<Vec<RawAttachment>, HarvestError> {
        let host = self.host.clone();
        let email = self.email.clone();
        let password = self.app_password.clone();
        let window = *window;

        // The imap crate is blocking; keep the session off the async runtime.
        tokio::task::spawn_blocking(move || fetch_blocking(&host, &email, &password, &window))
            .await
            .map_err(|e| HarvestError::Provider(format!("IMAP task failed: {e}")))?
    }
}

/// Builds the single Gmail search query. The date bounds are widened by a day
/// on each side because Gmail's `after:`/`before:` operators are day-granular;
/// the exact window is re-applied per message after fetch.
pub fn gmail_query(window: &TimeWindow) -> String {
    let after = (window.start - Duration::days(1)).format("%Y/%m/%d");
    let before = (window.end + Duration::days(2)).format("%Y/%m/%d");
    format!(r#"X-GM-RAW "(filename:pdf OR filename:docx) after:{after} before:{before}""#)
}

fn fetch_blocking(
    host: &str,
    email: &str,
    password: &str,
    window: &TimeWindow,
) -> Result<Vec<RawAttachment>, HarvestError> {
    let tls = native_tls::TlsConnector::builder()
        .build()
        .map_err(|e| HarvestError::Provider(format!("TLS setup failed: {e}")))?;

    let client = imap::connect((host, IMAP_PORT), host, &tls)
        .map_err(|e| HarvestError::Provider(format!("IMAP connect failed: {e}")))?;

    let mut session = client
        .login(email, password)
        .map_err(|(e, _)| HarvestError::Auth(format!("Login failed: {e}")))?;

    session
        .select("INBOX")
        .map_err(|e| HarvestError::Provider(format!("INBOX select failed: {e}")))?;

    let query = gmail_query(window);
    debug!("IMAP search: {query}");

    let mut ids: Vec<u32> = session
        .search(&query)
        .map_err(|e| HarvestError::Provider(format!("IMAP search failed: {e}")))?
        .into_iter()
        .collect();

    if ids.is_empty() {
        session.logout().ok();
        return Ok(Vec::new());
    }

    // Higher sequence numbers are newer; order newest first.
    ids.sort_unstable_by(|a, b| b.cmp(a));
    let set = ids
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",");

    let fetches = session
        .fetch(&set, "RFC822")
        .map_err(|e| HarvestError::Provider(format!("IMAP fetch failed: {e}")))?;

    let mut by_seq: Vec<(u32, Vec<RawAttachment>)> = Vec::new();
    for fetch in fetches.iter() {
        if let Some(body) = fetch.body() {
            by_seq.push((fetch.message, collect_attachments(body, window)));
        }
    }
    session.logout().ok();

    by_seq.sort_unstable_by(|a, b| b.0.cmp(&a.0));
    let attachments: Vec<RawAttachment> =
        by_seq.into_iter().flat_map(|(_, atts)| atts).collect();

    info!(
        "Gmail scan matched {} messages, {} resume attachments",
        ids.len(),
        attachments.len()
    );
    Ok(attachments)
}

/// Parses one RFC822 message and returns its resume attachments, applying the
/// exact time window against the Date header. Unparsable dates pass through.
fn collect_attachments(raw: &[u8], window: &TimeWindow) -> Vec<RawAttachment> {
    let parsed = match mailparse::parse_mail(raw) {
        Ok(p) => p,
        Err(e) => {
            debug!("Skipping unparsable message: {e}");
            return Vec::new();
        }
    };

    let received = parsed
        .headers
        .get_first_value("Date")
        .and_then(|d| mailparse::dateparse(&d).ok())
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0));

    if let Some(instant) = received {
        if !window.contains(instant) {
            return Vec::new();
        }
    }

    let sender = parsed.headers.get_first_value("From").unwrap_or_default();

    let mut out = Vec::new();
    visit_parts(&parsed, &mut |part| {
        let disposition = part.get_content_disposition();
        if disposition.disposition != DispositionType::Attachment {
            return;
        }
        let filename = disposition
            .params
            .get("filename")
            .cloned()
            .or_else(|| part.ctype.params.get("name").cloned());
        let Some(filename) = filename else { return };

        let filename = decode_filename(&filename);
        if !is_resume_filename(&filename) {
            return;
        }
        match part.get_body_raw() {
            Ok(bytes) => out.push(RawAttachment {
                filename,
                bytes: Bytes::from(bytes),
                sender: sender.clone(),
                received,
            }),
            Err(e) => debug!("Skipping undecodable attachment {filename}: {e}"),
        }
    });
    out
}

fn visit_parts<'a>(part: &'a ParsedMail<'a>, visit: &mut impl FnMut(&ParsedMail<'a>)) {
    visit(part);
    for sub in &part.subparts {
        visit_parts(sub, visit);
    }
}
