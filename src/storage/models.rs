use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Release classification shown as a colored badge on every entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Bugfix,
    Enhancement,
    Feature,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Bugfix => "bugfix",
            Category::Enhancement => "enhancement",
            Category::Feature => "feature",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bugfix" => Some(Category::Bugfix),
            "enhancement" => Some(Category::Enhancement),
            "feature" => Some(Category::Feature),
            _ => None,
        }
    }
}

/// Kind of media attached to a release, derived from the upload's MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    /// Only `image/*` and `video/*` are accepted as release media.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        match mime_type.split('/').next().unwrap_or("") {
            "image" => Some(MediaType::Image),
            "video" => Some(MediaType::Video),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub url: String,
}

/// A color-coded classifier shared across releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// Labels share the tag shape but live in their own vocabulary.
pub type Label = Tag;

/// Tag or label as submitted with a release. The id is only a hint; entries are
/// matched by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagInput {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub color: String,
}

/// A release row stored in redb. Joined data lives in the index tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub datetime: DateTime<Utc>,
    pub category: Category,
    #[serde(default)]
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A release assembled with its tags, labels and media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseNote {
    pub id: String,
    pub title: String,
    pub description: String,
    pub datetime: DateTime<Utc>,
    pub category: Category,
    pub tags: Vec<Tag>,
    pub labels: Vec<Label>,
    pub slug: String,
    pub media: Vec<MediaItem>,
}

/// Input to `save_release`. Collections left as `None` keep their stored value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub datetime: DateTime<Utc>,
    pub category: Category,
    #[serde(default)]
    pub tags: Option<Vec<TagInput>>,
    #[serde(default)]
    pub labels: Option<Vec<TagInput>>,
    #[serde(default)]
    pub media: Option<Vec<MediaItem>>,
}

/// Client-side forms hand out `new-<n>` ids before anything is persisted.
pub fn is_placeholder_id(id: &str) -> bool {
    id.is_empty() || id.starts_with("new-")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    /// PBKDF2 output, base64
    pub password_hash: String,
    /// base64
    pub password_salt: String,
    pub password_iterations: u32,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
