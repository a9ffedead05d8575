use url::Url;

/// Public web origin used for canonical links and request headers
pub const WEB_ORIGIN: &str = "https://www.xiaohongshu.com";

/// Builds the canonical web link for a note, carrying its access token when known
///
/// # Examples
///
/// ```
/// use xhs_harvest::url::note_url;
///
/// assert_eq!(note_url("abc", None), "https://www.xiaohongshu.com/explore/abc");
/// assert_eq!(
///     note_url("abc", Some("T=")),
///     "https://www.xiaohongshu.com/explore/abc?xsec_token=T%3D&xsec_source=pc_search"
/// );
/// ```
pub fn note_url(note_id: &str, xsec_token: Option<&str>) -> String {
    build(&["explore", note_id], xsec_token)
}

/// Builds the canonical web link for a user profile
pub fn user_profile_url(user_id: &str, xsec_token: Option<&str>) -> String {
    build(&["user", "profile", user_id], xsec_token)
}

fn build(segments: &[&str], xsec_token: Option<&str>) -> String {
    let mut url = match Url::parse(WEB_ORIGIN) {
        Ok(url) => url,
        Err(_) => return format!("{}/{}", WEB_ORIGIN, segments.join("/")),
    };

    if let Ok(mut path) = url.path_segments_mut() {
        path.clear().extend(segments);
    }

    if let Some(token) = xsec_token {
        url.query_pairs_mut()
            .append_pair("xsec_token", token)
            .append_pair("xsec_source", "pc_search");
    }

    url.to_string()
}
