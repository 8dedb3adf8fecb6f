//! Stylesheet fetching for dusk.
//!
//! Provides a blocking HTTP GET wrapper and a `data:` URL decoder, used by
//! the command line front end when its input is not a local file.

use std::str::FromStr;
use std::time::Duration;

use base64::Engine;
use thiserror::Error;

/// User-Agent header sent with all requests.
const USER_AGENT: &str = concat!("dusk/", env!("CARGO_PKG_VERSION"));

/// Default request timeout.
const TIMEOUT: Duration = Duration::from_secs(30);

/// Errors produced while fetching or decoding stylesheet input.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be built or the request failed in transit.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP error: {0}")]
    Status(reqwest::StatusCode),

    /// The `data:` URL has no `,` separating metadata from payload.
    #[error("invalid data URL: missing comma")]
    MissingComma,

    /// The input does not start with `data:`.
    #[error("not a data URL: {0}")]
    NotDataUrl(String),

    /// The base64 payload is malformed.
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A `%` escape is not followed by two hex digits.
    #[error("invalid percent escape at byte {0}")]
    PercentEscape(usize),

    /// The decoded payload is not UTF-8 text.
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// A parsed `data:` URL that can be decoded into raw bytes.
///
/// [RFC 2397](https://www.rfc-editor.org/rfc/rfc2397): `data:[<mediatype>][;base64],<data>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// The media type, e.g. `text/css`. Empty when the URL omits it.
    pub media_type: String,
    /// Whether the payload is base64 encoded (otherwise percent encoded).
    pub base64: bool,
    /// The raw payload after the first `,`.
    pub payload: String,
}

impl FromStr for DataUrl {
    type Err = FetchError;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| FetchError::NotDataUrl(url.to_string()))?;
        let (metadata, payload) = rest.split_once(',').ok_or(FetchError::MissingComma)?;
        let (media_type, base64) = metadata
            .strip_suffix(";base64")
            .map_or((metadata, false), |m| (m, true));
        Ok(Self {
            media_type: media_type.to_string(),
            base64,
            payload: payload.to_string(),
        })
    }
}

impl DataUrl {
    /// Decode the payload into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Base64`] or [`FetchError::PercentEscape`] if the
    /// payload is malformed for its encoding.
    pub fn decode(&self) -> Result<Vec<u8>, FetchError> {
        if self.base64 {
            Ok(base64::engine::general_purpose::STANDARD.decode(&self.payload)?)
        } else {
            percent_decode(&self.payload)
        }
    }

    /// Decode the payload as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails or the bytes are not UTF-8.
    pub fn decode_text(&self) -> Result<String, FetchError> {
        Ok(String::from_utf8(self.decode()?)?)
    }
}

fn percent_decode(input: &str) -> Result<Vec<u8>, FetchError> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or(FetchError::PercentEscape(i))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Whether `input` names something [`fetch_text`] can retrieve.
#[must_use]
pub fn is_remote_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Fetch a URL and return its body as text.
///
/// `data:` URLs are decoded locally; everything else goes over HTTP.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be created, the request
/// fails, the response has a non-success status, or the body cannot be decoded.
pub fn fetch_text(url: &str) -> Result<String, FetchError> {
    if url.starts_with("data:") {
        return url.parse::<DataUrl>()?.decode_text();
    }

    let client = reqwest::blocking::Client::builder()
        .timeout(TIMEOUT)
        .build()?;

    let response = client.get(url).header("User-Agent", USER_AGENT).send()?;

    if !response.status().is_success() {
        return Err(FetchError::Status(response.status()));
    }

    Ok(response.text()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base64_data_url() {
        let url: DataUrl = "data:text/css;base64,LmF7fQ==".parse().unwrap();
        assert_eq!(url.media_type, "text/css");
        assert!(url.base64);
        assert_eq!(url.decode_text().unwrap(), ".a{}");
    }

    #[test]
    fn test_parse_percent_encoded_data_url() {
        let url: DataUrl = "data:text/css,.a%2C.b%7Bcolor:red%7D".parse().unwrap();
        assert!(!url.base64);
        assert_eq!(url.decode_text().unwrap(), ".a,.b{color:red}");
    }

    #[test]
    fn test_data_url_without_media_type() {
        let url: DataUrl = "data:,hello".parse().unwrap();
        assert_eq!(url.media_type, "");
        assert_eq!(url.decode_text().unwrap(), "hello");
    }

    #[test]
    fn test_data_url_errors() {
        assert!(matches!(
            "data:text/css".parse::<DataUrl>(),
            Err(FetchError::MissingComma)
        ));
        assert!(matches!(
            "text/css,a".parse::<DataUrl>(),
            Err(FetchError::NotDataUrl(_))
        ));
        let bad = "data:,a%zz".parse::<DataUrl>().unwrap();
        assert!(matches!(bad.decode(), Err(FetchError::PercentEscape(1))));
    }

    #[test]
    fn test_fetch_text_decodes_data_urls_locally() {
        assert_eq!(fetch_text("data:text/css,a%20b").unwrap(), "a b");
    }

    #[test]
    fn test_is_remote_url() {
        assert!(is_remote_url("https://example.com/site.css"));
        assert!(is_remote_url("http://example.com/site.css"));
        assert!(!is_remote_url("site.css"));
        assert!(!is_remote_url("data:text/css,a"));
    }
}
