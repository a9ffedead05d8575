//! Platform API capability
//!
//! The crawl engine only talks to the platform through the [`NoteApi`] trait:
//! - `probe`: one search page used to check a credential
//! - `fetch_page`: one page of a user timeline or keyword search
//! - `fetch_single`: one note by id
//!
//! [`HttpNoteApi`] is the production implementation over `reqwest`.

mod http;
mod parse;
#[cfg(test)]
pub(crate) mod testing;
mod traits;
mod types;

pub use http::{build_http_client, HttpNoteApi, SEARCH_PAGE_SIZE, USER_PAGE_SIZE};
pub use parse::{parse_detail_response, parse_note_card, parse_search_page, parse_user_page};
pub use traits::{ApiError, NoteApi};
pub use types::{ApiResponse, AuthorRef, Cursor, Interactions, Item, MediaKind, MediaRef, NoteKind, Page, TaskContext};
