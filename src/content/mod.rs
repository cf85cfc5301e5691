//! Content module - CMS documents, rich text and derived display records

mod post;
pub mod richtext;

pub use post::{
    to_display_posts, Banner, ContentSection, DisplayPost, PostData, PostPage, RawPost,
};
pub use richtext::{RichText, RichTextBlock};
