//! Post models: raw CMS documents and the display records derived from them

use serde::{Deserialize, Deserializer, Serialize};

use super::richtext::RichText;
use crate::error::Result;
use crate::helpers::DateFormatter;

/// A post document as returned by the content source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPost {
    /// Unique, URL-safe identifier of the document
    pub uid: String,

    /// First publication timestamp, absent for never-published documents
    #[serde(default)]
    pub first_publication_date: Option<String>,

    pub data: PostData,
}

/// Custom fields of a post document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostData {
    pub title: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub subtitle: String,

    pub author: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub banner: Banner,

    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<ContentSection>,
}

/// Banner image of a post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

/// One section of a post body: a heading and the rich text beneath it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub heading: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub body: RichText,
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostPage {
    pub results: Vec<RawPost>,

    /// Continuation URL of the next page, `None` on the last page
    #[serde(default)]
    pub next_page: Option<String>,
}

/// The listing view of a post
///
/// Fields are private: a display post is computed once from its raw
/// document and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayPost {
    uid: String,
    title: String,
    subtitle: String,
    author: String,
    formatted_date: Option<String>,
}

impl DisplayPost {
    /// Derive the listing view of a raw post
    ///
    /// Fails with a malformed-response error when the publication date is
    /// present but cannot be parsed.
    pub fn from_raw(post: &RawPost, formatter: &DateFormatter) -> Result<Self> {
        let formatted_date = post
            .first_publication_date
            .as_deref()
            .map(|date| formatter.format_timestamp(date))
            .transpose()?;

        Ok(Self {
            uid: post.uid.clone(),
            title: post.data.title.clone(),
            subtitle: post.data.subtitle.clone(),
            author: post.data.author.clone(),
            formatted_date,
        })
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn formatted_date(&self) -> Option<&str> {
        self.formatted_date.as_deref()
    }
}

/// Derive display posts for a whole page, failing on the first bad record
pub fn to_display_posts(posts: &[RawPost], formatter: &DateFormatter) -> Result<Vec<DisplayPost>> {
    posts
        .iter()
        .map(|post| DisplayPost::from_raw(post, formatter))
        .collect()
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlogError;

    const PRISMIC_DOCUMENT: &str = r#"{
        "id": "YF3sXhIAACQAiL7j",
        "uid": "como-utilizar-hooks",
        "type": "posts",
        "first_publication_date": "2021-03-15T19:25:28+0000",
        "last_publication_date": "2021-03-25T19:25:28+0000",
        "data": {
            "title": "Como utilizar Hooks",
            "subtitle": "Pensando em sincronização em vez de ciclos de vida",
            "author": "Joseph Oliveira",
            "banner": {"url": "https://images.prismic.io/banner.png", "alt": null},
            "content": [
                {"heading": "Proin et varius", "body": [
                    {"type": "paragraph", "text": "Lorem ipsum dolor sit amet", "spans": []}
                ]},
                {"heading": null, "body": null}
            ]
        }
    }"#;

    #[test]
    fn test_deserialize_document() {
        let post: RawPost = serde_json::from_str(PRISMIC_DOCUMENT).unwrap();
        assert_eq!(post.uid, "como-utilizar-hooks");
        assert_eq!(post.data.author, "Joseph Oliveira");
        assert_eq!(
            post.data.banner.url.as_deref(),
            Some("https://images.prismic.io/banner.png")
        );
        assert_eq!(post.data.content.len(), 2);
        assert_eq!(post.data.content[1].heading, "");
        assert!(post.data.content[1].body.is_empty());
    }

    #[test]
    fn test_missing_title_is_rejected() {
        let json = r#"{"uid": "x", "first_publication_date": null, "data": {"author": "A"}}"#;
        assert!(serde_json::from_str::<RawPost>(json).is_err());
    }

    #[test]
    fn test_display_post_from_raw() {
        let post: RawPost = serde_json::from_str(PRISMIC_DOCUMENT).unwrap();
        let display = DisplayPost::from_raw(&post, &DateFormatter::default()).unwrap();
        assert_eq!(display.uid(), "como-utilizar-hooks");
        assert_eq!(display.title(), "Como utilizar Hooks");
        assert_eq!(display.formatted_date(), Some("15 mar 2021"));
    }

    #[test]
    fn test_display_post_without_date() {
        let mut post: RawPost = serde_json::from_str(PRISMIC_DOCUMENT).unwrap();
        post.first_publication_date = None;
        let display = DisplayPost::from_raw(&post, &DateFormatter::default()).unwrap();
        assert_eq!(display.formatted_date(), None);
    }

    #[test]
    fn test_display_post_with_bad_date() {
        let mut post: RawPost = serde_json::from_str(PRISMIC_DOCUMENT).unwrap();
        post.first_publication_date = Some("soon".to_string());
        assert!(matches!(
            DisplayPost::from_raw(&post, &DateFormatter::default()),
            Err(BlogError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_page_without_next() {
        let page: PostPage = serde_json::from_str(r#"{"results": [], "next_page": null}"#).unwrap();
        assert!(page.next_page.is_none());
    }
}
