//! Query parameters and URL path encoding.

use std::borrow::Cow;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left as-is in form-style encoding.
const FORM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b' ');

/// Path arguments additionally keep `/` and `:` readable.
const PATH_ARG: &AsciiSet = &FORM.remove(b'/').remove(b':');

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamValue {
    /// Rendered as `true` / `false`.
    Bool(bool),
    /// Rendered verbatim (then encoded).
    Str(String),
    /// Rendered in decimal.
    Int(i64),
}

impl ParamValue {
    /// Textual form sent on the wire, before encoding.
    #[must_use]
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Self::Bool(true) => Cow::Borrowed("true"),
            Self::Bool(false) => Cow::Borrowed("false"),
            Self::Str(s) => Cow::Borrowed(s),
            Self::Int(i) => Cow::Owned(i.to_string()),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

/// Ordered query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(&'static str, ParamValue)>,
}

impl Params {
    /// No parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter.
    #[must_use]
    pub fn set(mut self, key: &'static str, value: impl Into<ParamValue>) -> Self {
        self.pairs.push((key, value.into()));
        self
    }

    /// Add a parameter if `value` is `Some`; `None` is left out entirely.
    #[must_use]
    pub fn set_opt<V: Into<ParamValue>>(self, key: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    /// Whether no parameters were set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Encode as `k=v&k=v` (no leading `?`).
    #[must_use]
    pub fn to_query(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", encode_form(k), encode_form(&v.render())))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn encode_form(s: &str) -> String {
    utf8_percent_encode(s, FORM).to_string().replace(' ', "+")
}

/// Encode a value interpolated into a URL path (`/` and `:` are kept).
#[must_use]
pub fn quote_path_arg(arg: &str) -> String {
    utf8_percent_encode(arg, PATH_ARG)
        .to_string()
        .replace(' ', "+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_render_per_variant() {
        assert_eq!(ParamValue::from(true).render(), "true");
        assert_eq!(ParamValue::from(false).render(), "false");
        assert_eq!(ParamValue::from(-3i64).render(), "-3");
        assert_eq!(ParamValue::from("all").render(), "all");
    }

    #[test]
    fn none_values_are_dropped() {
        let params = Params::new()
            .set("stdout", true)
            .set_opt("since", None::<i64>)
            .set_opt("tail", Some("10"));
        assert_eq!(params.to_query(), "stdout=true&tail=10");
    }

    #[test]
    fn query_values_are_form_encoded() {
        let params = Params::new().set("filters", r#"{"reference":["a b/c"]}"#);
        assert_eq!(
            params.to_query(),
            "filters=%7B%22reference%22%3A%5B%22a+b%2Fc%22%5D%7D"
        );
    }

    #[test]
    fn path_args_keep_slash_and_colon() {
        assert_eq!(quote_path_arg("library/busybox:latest"), "library/busybox:latest");
        assert_eq!(quote_path_arg("a b?c"), "a+b%3Fc");
    }
}
