//! Deterministic `multipart/form-data` encoding.
//!
//! The boundary is derived from a SHA-256 digest of the parts, so encoding
//! the same parts twice yields identical bytes.

use bytes::{BufMut, Bytes, BytesMut};
use sha2::{Digest, Sha256};

const BOUNDARY_PREFIX: &str = "----PagesBundleBoundary";

/// One part of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: String,
    pub body: Bytes,
}

/// An ordered list of parts.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    parts: Vec<Part>,
}

/// Encoded form body and its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedForm {
    pub boundary: String,
    pub body: Bytes,
}

impl EncodedForm {
    /// `Content-Type` header value for the body.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a part; parts are encoded in insertion order.
    pub fn part(
        &mut self,
        name: impl Into<String>,
        filename: Option<String>,
        content_type: impl Into<String>,
        body: impl Into<Bytes>,
    ) -> &mut Self {
        self.parts.push(Part {
            name: name.into(),
            filename,
            content_type: content_type.into(),
            body: body.into(),
        });
        self
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Boundary that does not occur in any part body.
    fn boundary(&self) -> String {
        let mut attempt: u32 = 0;
        loop {
            let mut hasher = Sha256::new();
            hasher.update(attempt.to_be_bytes());
            for part in &self.parts {
                for field in [
                    part.name.as_bytes(),
                    part.filename.as_deref().unwrap_or_default().as_bytes(),
                    part.content_type.as_bytes(),
                    &part.body[..],
                ] {
                    hasher.update((field.len() as u64).to_be_bytes());
                    hasher.update(field);
                }
            }
            let digest = hex::encode(hasher.finalize());
            let boundary = format!("{}{}", BOUNDARY_PREFIX, &digest[..32]);

            let delimiter = format!("--{}", boundary);
            if !self
                .parts
                .iter()
                .any(|p| contains(&p.body, delimiter.as_bytes()))
            {
                return boundary;
            }
            attempt += 1;
        }
    }

    /// Encodes the form.
    pub fn encode(&self) -> EncodedForm {
        let boundary = self.boundary();
        let mut body = BytesMut::new();

        for part in &self.parts {
            body.put_slice(format!("--{}\r\n", boundary).as_bytes());
            let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", escape(&part.name));
            if let Some(filename) = &part.filename {
                disposition.push_str(&format!("; filename=\"{}\"", escape(filename)));
            }
            body.put_slice(disposition.as_bytes());
            body.put_slice(b"\r\n");
            body.put_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
            body.put_slice(&part.body);
            body.put_slice(b"\r\n");
        }
        body.put_slice(format!("--{}--\r\n", boundary).as_bytes());

        EncodedForm {
            boundary,
            body: body.freeze(),
        }
    }
}

/// Percent-escapes the characters that cannot appear in a quoted
/// disposition parameter.
fn escape(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_parts_in_order() {
        let mut form = MultipartForm::new();
        form.part("metadata", None, "application/json", Bytes::from_static(b"{}"))
            .part("a.mjs", Some("a.mjs".into()), "application/javascript+module", "export {}");
        let encoded = form.encode();
        let text = String::from_utf8(encoded.body.to_vec()).unwrap();

        let expected = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"metadata\"\r\n\
             Content-Type: application/json\r\n\r\n{{}}\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"a.mjs\"; filename=\"a.mjs\"\r\n\
             Content-Type: application/javascript+module\r\n\r\nexport {{}}\r\n--{b}--\r\n",
            b = encoded.boundary
        );
        assert_eq!(text, expected);
        assert!(encoded.content_type().starts_with("multipart/form-data; boundary=----PagesBundle"));
    }

    #[test]
    fn boundary_depends_on_content() {
        let mut a = MultipartForm::new();
        a.part("x", None, "text/plain", "one");
        let mut b = MultipartForm::new();
        b.part("x", None, "text/plain", "two");
        assert_ne!(a.encode().boundary, b.encode().boundary);
        assert_eq!(a.encode(), a.encode());
    }

    #[test]
    fn escapes_quotes_in_names() {
        assert_eq!(escape("a\"b\nc"), "a%22b%0Ac");
    }
}
