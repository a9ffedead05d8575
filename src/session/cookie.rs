use crate::CookieError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Cookie attribute the platform requires on every authenticated request
pub const IDENTITY_ATTRIBUTE: &str = "a1";

/// Splits a raw cookie string into attribute name/value pairs
///
/// Pairs are separated by `"; "` when the string contains it, otherwise by `";"`.
/// Each pair is split on its first `=` only, so values may themselves contain `=`.
/// Fails when the identity attribute (`a1`) is absent.
///
/// # Examples
///
/// ```
/// use xhs_harvest::session::trans_cookies;
///
/// let cookies = trans_cookies("a1=abc; b=c=d").unwrap();
/// assert_eq!(cookies["a1"], "abc");
/// assert_eq!(cookies["b"], "c=d");
/// ```
pub fn trans_cookies(raw: &str) -> Result<BTreeMap<String, String>, CookieError> {
    let delimiter = if raw.contains("; ") { "; " } else { ";" };

    let attributes: BTreeMap<String, String> = raw
        .split(delimiter)
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (name.to_string(), value.to_string())
        })
        .collect();

    if !attributes.contains_key(IDENTITY_ATTRIBUTE) {
        return Err(CookieError::MissingIdentity(IDENTITY_ATTRIBUTE));
    }

    Ok(attributes)
}

/// Parsed session cookie bundle
///
/// Constructed once per task invocation and never persisted. `Debug` output
/// redacts attribute values.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    attributes: BTreeMap<String, String>,
}

impl Credential {
    /// Parses a raw cookie string, see [`trans_cookies`]
    pub fn parse(raw: &str) -> Result<Self, CookieError> {
        Ok(Self {
            attributes: trans_cookies(raw)?,
        })
    }

    /// Looks up a single attribute
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The identity attribute value (always present)
    pub fn identity(&self) -> &str {
        self.get(IDENTITY_ATTRIBUTE).unwrap_or_default()
    }

    /// All attributes in name order
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Renders the bundle as a `Cookie` header value
    pub fn to_header(&self) -> String {
        self.attributes
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl FromStr for Credential {
    type Err = CookieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .finish()
    }
}
