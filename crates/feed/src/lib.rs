//! RSS feed mutation.
//!
//! A [`FeedItem`] is rendered from recording [`Metadata`](podfeed_extract::models::Metadata)
//! by an [`ItemTemplate`], then inserted into an existing feed document with
//! [`splice`]. The feed document itself is never re-serialized: the channel
//! element is located with an XML pull parser and the new item is written
//! into the original text, so every other byte of the document survives.

pub mod error;
mod item;
mod splice;
mod template;

pub use crate::item::FeedItem;
pub use crate::splice::splice;
pub use crate::template::{DEFAULT_DESCRIPTION_TEMPLATE, DEFAULT_TITLE_TEMPLATE, ItemTemplate};
