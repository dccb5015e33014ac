use serde::{Deserialize, Serialize};

/// Client software descriptor parsed from a `User-Agent` string.
///
/// This is request-scoped: it is attached to every response and never stored
/// in the result cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAgent {
    /// Product token, e.g. `curl`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub product: String,

    /// Product version, e.g. `7.26.0`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// Everything after the product/version
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,

    /// The unparsed header value
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw_value: String,
}

impl UserAgent {
    /// Parse a `User-Agent` value.
    ///
    /// `product/version comment` splits into three parts when the text after
    /// the slash starts with a digit; otherwise everything after the slash is
    /// the comment. Without a slash, the first space separates product from
    /// comment.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let (product, version, comment) = match raw.split_once('/') {
            Some((product, rest)) if rest.starts_with(|c: char| c.is_ascii_digit()) => {
                let (version, comment) = rest.split_once(' ').unwrap_or((rest, ""));
                (product, version, comment)
            }
            Some((product, rest)) => (product, "", rest),
            None => {
                let (product, comment) = raw.split_once(' ').unwrap_or((raw, ""));
                (product, "", comment)
            }
        };

        Self {
            product: product.to_string(),
            version: version.to_string(),
            comment: comment.to_string(),
            raw_value: raw.to_string(),
        }
    }

    /// Parse an optional header value; empty or missing yields `None`
    #[must_use]
    pub fn from_header(value: Option<&str>) -> Option<Self> {
        value.filter(|v| !v.is_empty()).map(Self::parse)
    }
}
