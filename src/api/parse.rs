//! Mapping of platform JSON payloads onto [`Item`] and [`Page`]
//!
//! Only the fields the engine and sinks use are extracted; the untouched payload
//! travels along in `Item::raw`.

use crate::api::types::{AuthorRef, Cursor, Interactions, Item, MediaKind, MediaRef, NoteKind, Page};
use serde_json::Value;

/// Maps a `note_card` object onto an [`Item`]
///
/// Works for both list cards (search results, user timeline) and full note
/// details; list cards simply leave the detail-only fields empty.
pub fn parse_note_card(id: &str, xsec_token: Option<String>, card: &Value, raw: Value) -> Item {
    let kind = NoteKind::from_api(text(card, &["type"]).as_deref().unwrap_or("normal"));
    let user = &card["user"];
    let interact = &card["interact_info"];

    Item {
        id: id.to_string(),
        xsec_token,
        title: text(card, &["title", "display_title"]).unwrap_or_default(),
        description: text(card, &["desc"]).unwrap_or_default(),
        kind,
        author: AuthorRef {
            user_id: text(user, &["user_id", "userId"]).unwrap_or_default(),
            nickname: text(user, &["nickname", "nick_name"]).unwrap_or_default(),
        },
        interactions: Interactions {
            liked: text(interact, &["liked_count"]).unwrap_or_default(),
            collected: text(interact, &["collected_count"]).unwrap_or_default(),
            comments: text(interact, &["comment_count"]).unwrap_or_default(),
            shares: text(interact, &["share_count", "shared_count"]).unwrap_or_default(),
        },
        published_at: card["time"].as_i64(),
        ip_location: text(card, &["ip_location"]),
        tags: card["tag_list"]
            .as_array()
            .map(|tags| tags.iter().filter_map(|t| text(t, &["name"])).collect())
            .unwrap_or_default(),
        media: media_refs(kind, card),
        raw,
    }
}

/// Parses the `data` object of a search response
///
/// Search pages are numbered; the returned cursor addresses `requested_page + 1`.
pub fn parse_search_page(data: &Value, requested_page: u32) -> Result<Page, String> {
    let items = match &data["items"] {
        Value::Null => Vec::new(),
        Value::Array(entries) => entries
            .iter()
            .filter(|entry| entry["model_type"].as_str().unwrap_or("note") == "note")
            .filter_map(|entry| {
                let id = text(entry, &["id", "note_id"])?;
                let token = text(entry, &["xsec_token"]);
                Some(parse_note_card(&id, token, &entry["note_card"], entry.clone()))
            })
            .collect(),
        other => return Err(format!("search items is not an array: {}", type_name(other))),
    };

    Ok(Page {
        items,
        next_cursor: Cursor::new((requested_page + 1).to_string()),
        has_more: data["has_more"].as_bool().unwrap_or(false),
    })
}

/// Parses the `data` object of a user timeline response
pub fn parse_user_page(data: &Value) -> Result<Page, String> {
    let items = match &data["notes"] {
        Value::Null => Vec::new(),
        Value::Array(notes) => notes
            .iter()
            .filter_map(|note| {
                let id = text(note, &["note_id", "id"])?;
                let token = text(note, &["xsec_token"]);
                Some(parse_note_card(&id, token, note, note.clone()))
            })
            .collect(),
        other => return Err(format!("user notes is not an array: {}", type_name(other))),
    };

    let next_cursor = match text(data, &["cursor"]) {
        Some(token) if !token.is_empty() => Cursor::new(token),
        _ => Cursor::start(),
    };

    Ok(Page {
        items,
        next_cursor,
        has_more: data["has_more"].as_bool().unwrap_or(false),
    })
}

/// Parses the `data` object of a note detail response
pub fn parse_detail_response(data: &Value, xsec_token: Option<String>) -> Option<Item> {
    let entry = data["items"].as_array()?.first()?;
    let card = &entry["note_card"];
    let id = text(entry, &["id"]).or_else(|| text(card, &["note_id"]))?;
    Some(parse_note_card(&id, xsec_token, card, entry.clone()))
}

fn media_refs(kind: NoteKind, card: &Value) -> Vec<MediaRef> {
    let mut media: Vec<MediaRef> = card["image_list"]
        .as_array()
        .map(|images| images.iter().filter_map(image_url).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .map(|url| MediaRef {
            kind: MediaKind::Image,
            url,
        })
        .collect();

    if media.is_empty() {
        if let Some(url) = text(&card["cover"], &["url_default", "url"]) {
            media.push(MediaRef {
                kind: MediaKind::Image,
                url,
            });
        }
    }

    if kind == NoteKind::Video {
        let stream = &card["video"]["media"]["stream"];
        let video_url = ["h264", "h265", "av1"]
            .iter()
            .find_map(|codec| text(&stream[*codec][0], &["master_url"]));
        if let Some(url) = video_url {
            media.push(MediaRef {
                kind: MediaKind::Video,
                url,
            });
        }
    }

    media
}

fn image_url(image: &Value) -> Option<String> {
    text(image, &["url_default", "url"]).or_else(|| {
        image["info_list"]
            .as_array()?
            .iter()
            .rev()
            .find_map(|info| text(info, &["url"]))
    })
}

/// First non-null field among `keys`, numbers rendered as text
fn text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match &value[*key] {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
