//! Hand-rolled multipart/mixed rendering
//!
//! Produces a plain-text part followed by an optional base64 attachment
//! part, with the header block written out literally.

use base64::prelude::*;
use rand::RngCore;

use crate::message::generate_message_id;
use crate::{OutgoingAttachment, OutgoingMessage, RawMessage, SmtpResult};

const CRLF: &str = "\r\n";
const BASE64_LINE_LEN: usize = 76;
/// Longest payload whose encoded-word stays within 75 characters
const ENCODED_WORD_BYTES: usize = 45;

/// Random boundary: 30 bytes, hex encoded
pub fn generate_boundary() -> String {
    let mut bytes = [0u8; 30];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Replace literal `\n` escape sequences with CRLF line breaks
pub fn expand_line_breaks(body: &str) -> String {
    body.replace("\\n", CRLF)
}

/// Render `msg` as multipart/mixed; `host` names the Message-ID domain
pub fn build_multipart(msg: &OutgoingMessage, host: &str) -> SmtpResult<RawMessage> {
    let envelope = msg.envelope()?;
    let boundary = generate_boundary();
    let message_id = generate_message_id(host);

    let mut out = Vec::with_capacity(msg.body.len() + 1024);

    let headers = [
        ("From", header_value(&msg.from)),
        ("To", header_value(&msg.to)),
        ("Subject", encode_subject(&msg.subject)),
        ("MIME-Version", "1.0".to_string()),
        (
            "Content-Type",
            format!("multipart/mixed; boundary={}", boundary),
        ),
        ("Return-Path", header_value(&msg.account)),
        ("Message-ID", message_id.clone()),
        ("X-Mailer", header_value(&msg.mailer)),
        ("X-Priority", "1 (Highest)".to_string()),
    ];
    for (name, value) in &headers {
        out.extend_from_slice(format!("{}: {}{}", name, value, CRLF).as_bytes());
    }
    out.extend_from_slice(CRLF.as_bytes());

    // Text part
    write_part_header(
        &mut out,
        &boundary,
        &[("Content-Type", "text/plain; charset=utf-8".to_string())],
    );
    out.extend_from_slice(expand_line_breaks(&msg.body).as_bytes());
    out.extend_from_slice(CRLF.as_bytes());

    if let Some(attachment) = &msg.attachment {
        write_attachment_part(&mut out, &boundary, attachment);
    }

    out.extend_from_slice(format!("--{}--{}", boundary, CRLF).as_bytes());

    Ok(RawMessage::new(envelope, message_id, out))
}

fn write_part_header(out: &mut Vec<u8>, boundary: &str, headers: &[(&str, String)]) {
    out.extend_from_slice(format!("--{}{}", boundary, CRLF).as_bytes());
    for (name, value) in headers {
        out.extend_from_slice(format!("{}: {}{}", name, value, CRLF).as_bytes());
    }
    out.extend_from_slice(CRLF.as_bytes());
}

fn write_attachment_part(out: &mut Vec<u8>, boundary: &str, attachment: &OutgoingAttachment) {
    let filename = header_value(&attachment.filename).replace('"', "'");
    write_part_header(
        out,
        boundary,
        &[
            (
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", filename),
            ),
            ("Content-Transfer-Encoding", "base64".to_string()),
            ("Content-Type", attachment.mime_type.clone()),
        ],
    );

    let encoded = BASE64_STANDARD.encode(&attachment.data);
    for line in encoded.as_bytes().chunks(BASE64_LINE_LEN) {
        out.extend_from_slice(line);
        out.extend_from_slice(CRLF.as_bytes());
    }
}

/// Header values must stay on one line
fn header_value(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// RFC 2047 encoded-words for non-ASCII subjects, folded one word per line
fn encode_subject(subject: &str) -> String {
    let subject = header_value(subject);
    if subject.is_ascii() {
        return subject;
    }

    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in subject.chars() {
        // never split a character across words
        if chunk.len() + c.len_utf8() > ENCODED_WORD_BYTES {
            words.push(encoded_word(&chunk));
            chunk.clear();
        }
        chunk.push(c);
    }
    if !chunk.is_empty() {
        words.push(encoded_word(&chunk));
    }
    words.join("\r\n ")
}

fn encoded_word(text: &str) -> String {
    format!("=?UTF-8?B?{}?=", BASE64_STANDARD.encode(text.as_bytes()))
}
