//! RFC 2047 header decoding
//!
//! Header values arrive exactly as they sit in the message: possibly folded
//! over several lines and possibly made of `=?charset?B|Q?text?=` encoded
//! words. Decoding never fails. A word in an unknown charset falls back to
//! lossy UTF-8, and a word whose transfer encoding is broken is kept verbatim.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use encoding_rs::Encoding;
use mailparse::MailHeader;
use regex::Regex;
use std::borrow::Cow;

static ENCODED_WORD: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"=\?([^?\s]+)\?([bBqQ])\?([^?\s]*)\?=").unwrap()
});

// Mailers disagree about padding inside encoded words.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a raw header value into display text.
///
/// Absent input yields an empty string. Encoded words are replaced by their
/// decoded text in original order; whitespace separating two adjacent encoded
/// words is dropped, all other text is kept as-is.
#[must_use]
pub fn decode_header(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    let value = unfold(raw);

    let mut decoded = String::with_capacity(value.len());
    let mut last_end = 0;
    let mut after_word = false;

    for caps in ENCODED_WORD.captures_iter(&value) {
        let Some(word) = caps.get(0) else { continue };

        let gap = &value[last_end..word.start()];
        if !(after_word && gap.trim().is_empty()) {
            decoded.push_str(gap);
        }

        match decode_word(&caps[1], &caps[2], &caps[3]) {
            Some(text) => decoded.push_str(&text),
            None => decoded.push_str(word.as_str()),
        }

        after_word = true;
        last_end = word.end();
    }

    decoded.push_str(&value[last_end..]);
    decoded
}

/// First value of header `name`, undecoded, with folding removed.
#[must_use]
pub fn raw_value(headers: &[MailHeader], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|h| h.get_key().eq_ignore_ascii_case(name))
        .map(|h| unfold(&String::from_utf8_lossy(h.get_value_raw())).trim().to_string())
}

fn unfold(value: &str) -> Cow<'_, str> {
    if value.contains(['\r', '\n']) {
        Cow::Owned(value.replace("\r\n", "").replace(['\r', '\n'], ""))
    } else {
        Cow::Borrowed(value)
    }
}

fn decode_word(charset: &str, transfer: &str, text: &str) -> Option<String> {
    let bytes = match transfer {
        "b" | "B" => LENIENT_BASE64.decode(text).ok()?,
        _ => decode_q(text),
    };

    // RFC 2231 allows a language tag: `=?utf-8*en?Q?...?=`
    let label = charset.split('*').next().unwrap_or(charset);

    Some(Encoding::for_label_no_replacement(label.as_bytes()).map_or_else(
        || String::from_utf8_lossy(&bytes).into_owned(),
        |encoding| encoding.decode_without_bom_handling(&bytes).0.into_owned(),
    ))
}

fn decode_q(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'_' => out.push(b' '),
            b'=' if i + 2 < bytes.len() => match (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                (Some(hi), Some(lo)) => {
                    out.push((hi << 4) | lo);
                    i += 2;
                }
                _ => out.push(b'='),
            },
            other => out.push(other),
        }
        i += 1;
    }

    out
}

fn hex_digit(b: u8) -> Option<u8> {
    char::from(b).to_digit(16).and_then(|d| u8::try_from(d).ok())
}
