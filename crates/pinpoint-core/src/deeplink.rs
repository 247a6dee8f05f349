//! Deep-link sink.
//!
//! Formats prompts and file locations as editor URIs. The editor scheme
//! is an opaque output collaborator: we only build the URL, the embedder
//! decides how to open it.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// `encodeURIComponent`-compatible set: spaces become `%20`, never `+`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Deep-link target for prompt hand-off.
#[derive(Debug, Clone)]
pub struct DeepLinkSink {
    scheme: String,
    authority: String,
}

impl Default for DeepLinkSink {
    fn default() -> Self {
        Self::cursor()
    }
}

impl DeepLinkSink {
    /// Cursor's prompt deep link.
    pub fn cursor() -> Self {
        Self {
            scheme: "cursor".to_string(),
            authority: "anysphere.cursor-deeplink".to_string(),
        }
    }

    /// A custom scheme/authority pair.
    pub fn new(scheme: impl Into<String>, authority: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            authority: authority.into(),
        }
    }

    /// Format a prompt as `<scheme>://<authority>/prompt?text=<encoded>`.
    ///
    /// Callers must not pass an empty prompt; the URL would open an empty
    /// chat.
    pub fn prompt_url(&self, prompt_text: &str) -> String {
        let encoded = utf8_percent_encode(prompt_text, COMPONENT);
        format!("{}://{}/prompt?text={}", self.scheme, self.authority, encoded)
    }
}

/// Format a file-open URI: `<scheme>://file<absolute-path>:<line>`.
pub fn file_open_url(scheme: &str, absolute_path: &str, line: u32) -> String {
    format!("{scheme}://file{absolute_path}:{line}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percent_decode(input: &str) -> String {
        percent_encoding::percent_decode_str(input)
            .decode_utf8()
            .unwrap()
            .into_owned()
    }

    #[test]
    fn spaces_encode_as_percent_20() {
        let url = DeepLinkSink::cursor().prompt_url("make it blue");
        assert!(url.starts_with("cursor://anysphere.cursor-deeplink/prompt?text="));
        assert!(url.contains("make%20it%20blue"));
        assert!(!url.contains('+'));
    }

    #[test]
    fn round_trips_through_decoding() {
        let prompt = "Fix this.\n\n{\n  \"component\": \"p\",\n  \"file\": \"b/src/App.jsx:10\"\n}";
        let url = DeepLinkSink::cursor().prompt_url(prompt);
        let query = url.split("text=").nth(1).unwrap();
        assert_eq!(percent_decode(query), prompt);
    }

    #[test]
    fn file_open_url_format() {
        assert_eq!(
            file_open_url("vscode", "/home/u/proj/src/App.jsx", 10),
            "vscode://file/home/u/proj/src/App.jsx:10"
        );
    }
}
