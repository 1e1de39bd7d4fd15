//! Mail file parsing.
//!
//! Turns the raw bytes of one mail file into the metadata the index needs. MIME
//! handling is delegated to `mailparse`; this module only decides which headers
//! matter and how they are normalised.
//!
//! # Threading headers
//!
//! - **message_id**: Message-ID with angle brackets removed, `None` when absent
//! - **parents**: References entries followed by In-Reply-To entries, header
//!   order preserved and duplicates kept
//!
//! # Dates
//!
//! A missing or unparseable Date header yields a timestamp of 0 rather than an
//! error, so such messages still get indexed (they simply sort first).

use mailparse::{MailHeaderMap, ParsedMail, parse_mail};
use thiserror::Error;

use super::references::{append_references, parse_references};

/// Metadata extracted from one mail file.
#[derive(Debug, Clone, Default)]
pub struct ParsedMessage {
    pub message_id: Option<String>,
    /// References then In-Reply-To message ids.
    pub parents: Vec<String>,
    /// Seconds since the epoch.
    pub timestamp: i64,
    pub subject: String,
    pub from: Vec<(String, String)>, // (name, email)
    pub to: Vec<(String, String)>,   // (name, email), To and Cc
    pub body: String,
    pub attachments: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ParseMessageError {
    #[error("failed to parse MIME structure: {0}")]
    MimeParse(#[from] mailparse::MailParseError),
    #[error("no headers found")]
    NoHeaders,
}

/// Strip NUL bytes and surrounding whitespace.
fn sanitize_text(text: &str) -> String {
    text.replace('\0', "").trim().to_string()
}

/// Extract the id from a Message-ID header value.
///
/// The bracketed id is taken the same way References entries are, so trailing
/// comments and folding whitespace are dropped. A value without brackets is
/// used as is, trimmed.
pub fn normalize_message_id(msg_id: Option<String>) -> Option<String> {
    let raw = msg_id?;
    if let Some(id) = parse_references(Some(&raw)).into_iter().next() {
        return Some(sanitize_text(&id));
    }
    let cleaned = raw.trim().trim_matches(&['<', '>'][..]).trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(sanitize_text(cleaned))
    }
}

pub(crate) fn parse_addresses(header_value: &str) -> Vec<(String, String)> {
    let mut addresses = Vec::new();
    let Ok(list) = mailparse::addrparse(header_value) else {
        return addresses;
    };

    for addr in list.iter() {
        match addr {
            mailparse::MailAddr::Single(info) => {
                let name = info.display_name.clone().unwrap_or_default();
                addresses.push((sanitize_text(&name), info.addr.to_lowercase()));
            }
            mailparse::MailAddr::Group(group) => {
                for info in &group.addrs {
                    let name = info.display_name.clone().unwrap_or_default();
                    addresses.push((sanitize_text(&name), info.addr.to_lowercase()));
                }
            }
        }
    }

    addresses
}

/// Parse a Date header into unix seconds, 0 when absent or unparseable.
pub fn parse_timestamp(raw: Option<&str>) -> i64 {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return 0;
    };

    match mailparse::dateparse(raw) {
        Ok(ts) => ts,
        Err(_) => match dateparser::parse(raw) {
            Ok(dt) => dt.timestamp(),
            Err(err) => {
                log::debug!("unparseable date `{}`: {}", raw, err);
                0
            }
        },
    }
}

fn extract_body(parsed: &ParsedMail<'_>) -> String {
    if parsed.subparts.is_empty() {
        if parsed.ctype.mimetype.starts_with("text/") || parsed.ctype.mimetype.is_empty() {
            return parsed.get_body().unwrap_or_default();
        }
        return String::new();
    }

    for part in &parsed.subparts {
        if part.ctype.mimetype == "text/plain" && !is_attachment(part) {
            return part.get_body().unwrap_or_default();
        }
        if part.ctype.mimetype.starts_with("multipart/") {
            let nested = extract_body(part);
            if !nested.is_empty() {
                return nested;
            }
        }
    }
    String::new()
}

fn is_attachment(part: &ParsedMail<'_>) -> bool {
    part.get_content_disposition().disposition == mailparse::DispositionType::Attachment
}

fn collect_attachments(parsed: &ParsedMail<'_>, out: &mut Vec<String>) {
    for part in &parsed.subparts {
        if is_attachment(part) {
            let disposition = part.get_content_disposition();
            let name = disposition
                .params
                .get("filename")
                .or_else(|| part.ctype.params.get("name"))
                .map(|name| sanitize_text(name));
            if let Some(name) = name.filter(|name| !name.is_empty()) {
                out.push(name);
            }
        }
        collect_attachments(part, out);
    }
}

/// Parse raw mail bytes.
///
/// Fails only when the input has no recognisable header block or the MIME
/// structure cannot be decoded at all.
pub fn parse_message(raw: &[u8]) -> Result<ParsedMessage, ParseMessageError> {
    let parsed = parse_mail(raw).map_err(|e| {
        log::debug!("failed to parse MIME: {}", e);
        ParseMessageError::MimeParse(e)
    })?;

    if parsed.headers.is_empty() {
        return Err(ParseMessageError::NoHeaders);
    }

    let headers = &parsed.headers;
    let message_id = normalize_message_id(headers.get_first_value("Message-ID"));

    let mut parents = parse_references(headers.get_first_value("References").as_deref());
    if let Some(in_reply_to) = headers.get_first_value("In-Reply-To") {
        append_references(&mut parents, &in_reply_to);
    }

    let timestamp = parse_timestamp(headers.get_first_value("Date").as_deref());

    let subject = headers
        .get_first_value("Subject")
        .map(|s| sanitize_text(&s))
        .unwrap_or_default();

    let from = headers
        .get_first_value("From")
        .map(|v| parse_addresses(&v))
        .unwrap_or_default();

    let mut to = Vec::new();
    for name in ["To", "Cc"] {
        for value in headers.get_all_values(name) {
            to.extend(parse_addresses(&value));
        }
    }

    let body = sanitize_text(&extract_body(&parsed));
    let mut attachments = Vec::new();
    collect_attachments(&parsed, &mut attachments);

    log::trace!(
        "parsed: {} - {}",
        message_id.as_deref().unwrap_or("(no message-id)"),
        subject
    );

    Ok(ParsedMessage {
        message_id,
        parents,
        timestamp,
        subject,
        from,
        to,
        body,
        attachments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("hello\0world"), "helloworld");
        assert_eq!(sanitize_text("  test  "), "test");
    }

    #[test]
    fn test_normalize_message_id() {
        assert_eq!(
            normalize_message_id(Some("<test@example.com>".to_string())),
            Some("test@example.com".to_string())
        );
        assert_eq!(normalize_message_id(Some("<>".to_string())), None);
        assert_eq!(
            normalize_message_id(Some("bare@example.com".to_string())),
            Some("bare@example.com".to_string())
        );
        assert_eq!(normalize_message_id(None), None);
    }

    #[test]
    fn test_parse_message_threading_headers() {
        let raw = concat!(
            "Message-ID: <child@test>\r\n",
            "References: <root@test> <mid@test>\r\n",
            "In-Reply-To: <mid@test>\r\n",
            "Subject: Re: Hello\r\n",
            "From: Tester <Tester@Example.com>\r\n",
            "To: A <a@example.com>, b@example.com\r\n",
            "Cc: c@example.com\r\n",
            "Date: Tue, 1 Jul 2003 10:52:37 +0200\r\n",
            "\r\n",
            "Body text\r\n"
        );

        let parsed = parse_message(raw.as_bytes()).unwrap();
        assert_eq!(parsed.message_id.as_deref(), Some("child@test"));
        assert_eq!(parsed.parents, vec!["root@test", "mid@test", "mid@test"]);
        assert_eq!(parsed.subject, "Re: Hello");
        assert_eq!(parsed.from, vec![("Tester".to_string(), "tester@example.com".to_string())]);
        assert_eq!(parsed.to.len(), 3);
        assert_eq!(parsed.to[2].1, "c@example.com");
        assert_eq!(parsed.timestamp, 1_057_049_557);
        assert_eq!(parsed.body, "Body text");
    }

    #[test]
    fn test_message_id_with_trailing_comment() {
        assert_eq!(
            normalize_message_id(Some("<a@x> (added by relay)".to_string())),
            Some("a@x".to_string())
        );
        assert_eq!(
            normalize_message_id(Some("(relay) <a@x>".to_string())),
            Some("a@x".to_string())
        );
        assert_eq!(
            normalize_message_id(Some("<long.id\r\n @x>".to_string())),
            Some("long.id@x".to_string())
        );

        let raw = "Message-ID: <a@x> (added by relay)\r\nSubject: hi\r\n\r\nbody\r\n";
        let parsed = parse_message(raw.as_bytes()).unwrap();
        assert_eq!(parsed.message_id.as_deref(), Some("a@x"));
    }

    #[test]
    fn test_parse_message_without_message_id() {
        let raw = "Subject: anonymous\r\n\r\nhi\r\n";
        let parsed = parse_message(raw.as_bytes()).unwrap();
        assert!(parsed.message_id.is_none());
        assert!(parsed.parents.is_empty());
        assert_eq!(parsed.timestamp, 0);
    }

    #[test]
    fn test_parse_timestamp_fallbacks() {
        assert_eq!(parse_timestamp(None), 0);
        assert_eq!(parse_timestamp(Some("   ")), 0);
        assert_eq!(parse_timestamp(Some("Thu, 01 Jan 1970 00:01:40 +0000")), 100);
    }

    #[test]
    fn test_multipart_body_and_attachments() {
        let raw = concat!(
            "Message-ID: <multi@test>\r\n",
            "Subject: files\r\n",
            "Content-Type: multipart/mixed; boundary=\"XX\"\r\n",
            "\r\n",
            "--XX\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "see attached\r\n",
            "--XX\r\n",
            "Content-Type: application/pdf; name=\"report.pdf\"\r\n",
            "Content-Disposition: attachment; filename=\"report.pdf\"\r\n",
            "\r\n",
            "JVBERi0=\r\n",
            "--XX--\r\n"
        );

        let parsed = parse_message(raw.as_bytes()).unwrap();
        assert_eq!(parsed.body, "see attached");
        assert_eq!(parsed.attachments, vec!["report.pdf"]);
    }
}
