//! Content-type gating.
//!
//! Declared types must be on the supported list and must agree with what
//! the bytes actually look like. Archives are refused outright.

const PDF: &str = "application/pdf";
const JPEG: &str = "image/jpeg";
const PNG: &str = "image/png";
const JSON: &str = "application/json";
const XML: &str = "application/xml";
const PLAIN_TEXT: &str = "text/plain";

const ARCHIVE_TYPES: &[&str] = &[
    "application/zip",
    "application/x-zip-compressed",
    "application/gzip",
    "application/x-gzip",
    "application/x-tar",
    "application/x-rar-compressed",
    "application/vnd.rar",
    "application/x-7z-compressed",
];

/// Accepts or rejects a declared MIME type for some content.
pub trait ContentTypeValidator: Send + Sync {
    fn validate(&self, declared: &str, content: &[u8]) -> bool;
}

/// Formats recognised from leading magic bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sniffed {
    Pdf,
    Jpeg,
    Png,
    Archive,
    Unknown,
}

/// Identifies content by its signature.
pub fn sniff(content: &[u8]) -> Sniffed {
    const ZIP: &[u8] = b"PK\x03\x04";
    const ZIP_EMPTY: &[u8] = b"PK\x05\x06";
    const GZIP: &[u8] = &[0x1F, 0x8B];
    const RAR: &[u8] = b"Rar!\x1A\x07";
    const SEVEN_ZIP: &[u8] = &[0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C];
    const PNG_SIG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    const JPEG_SIG: &[u8] = &[0xFF, 0xD8, 0xFF];

    if content.starts_with(b"%PDF-") {
        Sniffed::Pdf
    } else if content.starts_with(JPEG_SIG) {
        Sniffed::Jpeg
    } else if content.starts_with(PNG_SIG) {
        Sniffed::Png
    } else if [ZIP, ZIP_EMPTY, GZIP, RAR, SEVEN_ZIP]
        .iter()
        .any(|sig| content.starts_with(sig))
        || is_tar(content)
    {
        Sniffed::Archive
    } else {
        Sniffed::Unknown
    }
}

fn is_tar(content: &[u8]) -> bool {
    content.len() > 262 && &content[257..262] == b"ustar"
}

/// Lower-cased MIME type with parameters stripped.
pub fn normalize(declared: &str) -> String {
    declared
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// The default validator: PDF, JPEG, PNG, JSON, XML, and plain text.
#[derive(Clone, Copy, Debug, Default)]
pub struct SupportedContentTypes;

impl SupportedContentTypes {
    pub fn is_supported(content_type: &str) -> bool {
        matches!(
            normalize(content_type).as_str(),
            PDF | JPEG | PNG | JSON | XML | PLAIN_TEXT
        )
    }
}

impl ContentTypeValidator for SupportedContentTypes {
    fn validate(&self, declared: &str, content: &[u8]) -> bool {
        let declared = normalize(declared);
        if ARCHIVE_TYPES.contains(&declared.as_str()) {
            return false;
        }

        let sniffed = sniff(content);
        if sniffed == Sniffed::Archive {
            return false;
        }

        match declared.as_str() {
            PDF => sniffed == Sniffed::Pdf,
            JPEG => sniffed == Sniffed::Jpeg,
            PNG => sniffed == Sniffed::Png,
            JSON => serde_json::from_slice::<serde_json::Value>(content).is_ok(),
            XML => looks_like_xml(content),
            PLAIN_TEXT => sniffed == Sniffed::Unknown && std::str::from_utf8(content).is_ok(),
            _ => false,
        }
    }
}

fn looks_like_xml(content: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(content) else {
        return false;
    };
    text.trim_start_matches('\u{FEFF}').trim_start().starts_with('<')
}
