use super::{NoteRef, UserRef};
use crate::{UrlError, UrlResult};
use url::Url;

/// Path prefixes that precede a note id in web links
const NOTE_PATH_PREFIXES: [&str; 3] = ["explore", "discovery/item", "user/profile"];

/// Parses a note reference from a share link or a bare note id
///
/// Accepted forms:
/// - `https://www.xiaohongshu.com/explore/<id>?xsec_token=...&xsec_source=...`
/// - `https://www.xiaohongshu.com/discovery/item/<id>?...`
/// - `https://www.xiaohongshu.com/user/profile/<user_id>/<id>?...`
/// - `<id>`
///
/// # Examples
///
/// ```
/// use xhs_harvest::url::parse_note_ref;
///
/// let note = parse_note_ref("https://www.xiaohongshu.com/explore/64f1a2b3000000001f03a1c2?xsec_token=AB1&xsec_source=pc_search").unwrap();
/// assert_eq!(note.note_id, "64f1a2b3000000001f03a1c2");
/// assert_eq!(note.xsec_token.as_deref(), Some("AB1"));
/// ```
pub fn parse_note_ref(raw: &str) -> UrlResult<NoteRef> {
    let raw = raw.trim();
    if is_bare_id(raw) {
        return Ok(NoteRef::new(raw));
    }

    let url = parse_web_url(raw)?;
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let note_id = match segments.as_slice() {
        ["explore", id] | ["discovery", "item", id] | ["user", "profile", _, id] => *id,
        _ => {
            return Err(UrlError::Unsupported(format!(
                "{} (expected a path under one of {:?})",
                raw, NOTE_PATH_PREFIXES
            )))
        }
    };

    if !is_bare_id(note_id) {
        return Err(UrlError::MissingId(raw.to_string()));
    }

    let (xsec_token, xsec_source) = token_params(&url);
    Ok(NoteRef {
        note_id: note_id.to_string(),
        xsec_token,
        xsec_source,
    })
}

/// Parses a user reference from a profile link or a bare user id
///
/// # Examples
///
/// ```
/// use xhs_harvest::url::parse_user_ref;
///
/// let user = parse_user_ref("https://www.xiaohongshu.com/user/profile/5ff0e6410000000001008400?xsec_token=XY").unwrap();
/// assert_eq!(user.user_id, "5ff0e6410000000001008400");
/// ```
pub fn parse_user_ref(raw: &str) -> UrlResult<UserRef> {
    let raw = raw.trim();
    if is_bare_id(raw) {
        return Ok(UserRef::new(raw));
    }

    let url = parse_web_url(raw)?;
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let user_id = match segments.as_slice() {
        ["user", "profile", id, ..] if is_bare_id(id) => *id,
        _ => return Err(UrlError::MissingId(raw.to_string())),
    };

    let (xsec_token, xsec_source) = token_params(&url);
    Ok(UserRef {
        user_id: user_id.to_string(),
        xsec_token,
        xsec_source,
    })
}

fn parse_web_url(raw: &str) -> UrlResult<Url> {
    let url = Url::parse(raw).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(UrlError::Unsupported(format!("scheme '{}' in {}", other, raw))),
    }
}

fn token_params(url: &Url) -> (Option<String>, Option<String>) {
    let mut token = None;
    let mut source = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "xsec_token" if !value.is_empty() => token = Some(value.into_owned()),
            "xsec_source" if !value.is_empty() => source = Some(value.into_owned()),
            _ => {}
        }
    }
    (token, source)
}

fn is_bare_id(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}
