use serde::{Deserialize, Serialize};

/// One entry in the organization activity stream.
///
/// `happened_at` is kept as the upstream ISO string and forwarded verbatim
/// to the host attribute mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamEntry {
    #[serde(rename = "happenedAt", default)]
    pub happened_at: String,
    pub item: FeedItem,
}

/// A single feed item, discriminated by the GraphQL `__typename`.
///
/// The activity stream query only selects fields for `News` and `Post`;
/// any other typename parses as `Other` and carries no fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "__typename")]
pub enum FeedItem {
    News {
        #[serde(default)]
        slug: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        ingress: Option<String>,
        #[serde(default)]
        pinned: bool,
        #[serde(default)]
        topics: Vec<Topic>,
        #[serde(rename = "commentsCount", default)]
        comments_count: i64,
        #[serde(rename = "thumbsUpCount", default)]
        thumbs_up_count: i64,
    },
    Post {
        #[serde(default)]
        slug: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        body: Option<String>,
        #[serde(default)]
        category: Option<PostCategory>,
        #[serde(rename = "updatedBy", default)]
        updated_by: Option<PostAuthor>,
        #[serde(rename = "commentsCount", default)]
        comments_count: i64,
        #[serde(rename = "thumbsUpCount", default)]
        thumbs_up_count: i64,
    },
    #[serde(other)]
    Other,
}

impl FeedItem {
    /// Title of the item, if the variant carries one.
    pub fn title(&self) -> Option<&str> {
        match self {
            FeedItem::News { title, .. } | FeedItem::Post { title, .. } => {
                if title.is_empty() {
                    None
                } else {
                    Some(title)
                }
            }
            FeedItem::Other => None,
        }
    }

    pub fn slug(&self) -> Option<&str> {
        match self {
            FeedItem::News { slug, .. } | FeedItem::Post { slug, .. } => Some(slug),
            FeedItem::Other => None,
        }
    }
}

/// News topic tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    #[serde(default)]
    pub title: String,
}

/// Post category label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostCategory {
    #[serde(default)]
    pub label: String,
}

/// Author of the last edit on a post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostAuthor {
    #[serde(rename = "firstName", default)]
    pub first_name: Option<String>,
}
