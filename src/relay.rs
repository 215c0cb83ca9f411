//! Turning upstream results into responses for the browser.

use std::sync::LazyLock;

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use serde::Serialize;

use crate::ojs::FilePayload;

pub const FILE_CACHE_CONTROL: &str = "public, max-age=86400";
pub const JSON_CACHE_CONTROL: &str = "public, max-age=3600";
const DEFAULT_CONTENT_TYPE: &str = "application/pdf";

/// `filename=` and `filename*=` parameters, quoted or bare.
static FILENAME_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename(\*)?\s*=\s*(?:"([^"]*)"|'([^']*)'|([^;\r\n]*))"#)
        .expect("filename pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Attachment,
    Inline,
}

/// A successful JSON document, cacheable for an hour.
pub fn json<T: Serialize>(body: &T) -> Response {
    (
        [(header::CACHE_CONTROL, JSON_CACHE_CONTROL)],
        Json(body),
    )
        .into_response()
}

/// A relayed file with forwarded type and a computed disposition.
pub fn file(payload: FilePayload, disposition: Disposition, article_id: u64, file_id: u64) -> Response {
    let content_type = payload
        .content_type
        .filter(|ct| !ct.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    let disposition_value = match disposition {
        Disposition::Attachment => {
            let name = payload
                .content_disposition
                .as_deref()
                .and_then(filename_from_disposition)
                .unwrap_or_else(|| fallback_filename(article_id, file_id, &content_type));
            format!("attachment; filename=\"{}\"", name)
        }
        Disposition::Inline => "inline".to_string(),
    };

    let mut response = Response::new(Body::from(payload.bytes));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE)),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition_value)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(FILE_CACHE_CONTROL));
    response
}

/// Extract a usable filename from an upstream `Content-Disposition` value.
///
/// A plain `filename=` wins over `filename*=`; for the latter the
/// `charset'lang'` prefix is dropped and the value percent-decoded.
pub fn filename_from_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;
    for caps in FILENAME_PARAM.captures_iter(value) {
        let raw = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().trim())
            .unwrap_or("");
        if raw.is_empty() {
            continue;
        }
        if caps.get(1).is_some() {
            let name = raw.rsplit("''").next().unwrap_or(raw);
            extended.get_or_insert_with(|| {
                urlencoding::decode(name)
                    .map(|n| n.into_owned())
                    .unwrap_or_else(|_| name.to_string())
            });
        } else {
            plain.get_or_insert_with(|| raw.to_string());
        }
    }
    plain
        .or(extended)
        .map(|name| sanitize_filename(&name))
        .filter(|name| !name.is_empty())
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' | '/' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect::<String>()
        .trim()
        .to_string()
}

pub fn fallback_filename(article_id: u64, file_id: u64, content_type: &str) -> String {
    format!("article-{}-{}.{}", article_id, file_id, extension_for(content_type))
}

fn extension_for(content_type: &str) -> &'static str {
    let essence = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    match essence.as_str() {
        "application/pdf" => "pdf",
        "text/html" => "html",
        "application/xml" | "text/xml" => "xml",
        "application/epub+zip" => "epub",
        "application/zip" => "zip",
        "text/plain" => "txt",
        _ => "bin",
    }
}
