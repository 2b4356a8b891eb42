//! Data models: the captured message document and search selectors.

mod message;
mod search_kind;

pub use message::{Content, Message, Messages, MimeBody, Path, SmtpMessage};
pub use search_kind::{search_pattern, search_regex, SearchKind};
