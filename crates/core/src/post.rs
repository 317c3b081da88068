//! Post model - a published item and the engagement it collected.

use serde::{Deserialize, Serialize};

use crate::id::PostId;
use crate::{CoreError, Time};

/// Content category used for adaptive selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Observation or opinion
    Insight,
    /// How-to content
    Tutorial,
    /// Release or project news
    Announcement,
    /// Question to the audience
    Question,
    /// Multi-part thread
    Thread,
    /// Light-hearted content
    Meme,
}

impl ContentType {
    /// All content types.
    pub const ALL: [ContentType; 6] = [
        ContentType::Insight,
        ContentType::Tutorial,
        ContentType::Announcement,
        ContentType::Question,
        ContentType::Thread,
        ContentType::Meme,
    ];

    /// Stable storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Insight => "insight",
            ContentType::Tutorial => "tutorial",
            ContentType::Announcement => "announcement",
            ContentType::Question => "question",
            ContentType::Thread => "thread",
            ContentType::Meme => "meme",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Parse(format!("unknown content type: {}", s)))
    }
}

/// Platform a post was published on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// X / Twitter
    Twitter,
    /// Bluesky
    Bluesky,
    /// LinkedIn
    Linkedin,
    /// Mastodon
    Mastodon,
}

impl Platform {
    /// All platforms.
    pub const ALL: [Platform; 4] = [
        Platform::Twitter,
        Platform::Bluesky,
        Platform::Linkedin,
        Platform::Mastodon,
    ];

    /// Stable storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Bluesky => "bluesky",
            Platform::Linkedin => "linkedin",
            Platform::Mastodon => "mastodon",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| CoreError::Parse(format!("unknown platform: {}", s)))
    }
}

/// A published post.
///
/// Metrics start unset and are filled in as they arrive. The performance
/// score is written once by the scorer and is final from then on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Unique identifier
    pub id: PostId,

    /// Content category
    pub content_type: ContentType,

    /// Where it was posted
    pub platform: Platform,

    /// Voice used for the post
    pub tone: String,

    /// Subject of the post
    pub topic: String,

    /// Publish timestamp
    pub posted_at: Time,

    /// Likes / favourites
    pub reactions: Option<u32>,

    /// Replies received
    pub replies: Option<u32>,

    /// Link clicks
    pub link_clicks: Option<u32>,

    /// 0-100 composite score, set once
    pub performance_score: Option<u8>,
}

impl PostRecord {
    /// Create a post with no metrics.
    pub fn new(
        content_type: ContentType,
        platform: Platform,
        tone: impl Into<String>,
        topic: impl Into<String>,
        posted_at: Time,
    ) -> Self {
        Self {
            id: PostId::new(),
            content_type,
            platform,
            tone: tone.into(),
            topic: topic.into(),
            posted_at,
            reactions: None,
            replies: None,
            link_clicks: None,
            performance_score: None,
        }
    }

    /// Whether the scorer has already run on this post.
    pub fn is_scored(&self) -> bool {
        self.performance_score.is_some()
    }

    /// Whether the post collected neither reactions nor replies.
    pub fn has_no_engagement(&self) -> bool {
        self.reactions.unwrap_or(0) == 0 && self.replies.unwrap_or(0) == 0
    }

    /// Apply a partial metrics update; absent fields are left untouched.
    pub fn apply_metrics(&mut self, update: &MetricsUpdate) {
        if let Some(reactions) = update.reactions {
            self.reactions = Some(reactions);
        }
        if let Some(replies) = update.replies {
            self.replies = Some(replies);
        }
        if let Some(link_clicks) = update.link_clicks {
            self.link_clicks = Some(link_clicks);
        }
    }
}

/// Partial engagement update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsUpdate {
    /// New reaction count
    pub reactions: Option<u32>,
    /// New reply count
    pub replies: Option<u32>,
    /// New link-click count
    pub link_clicks: Option<u32>,
}

impl MetricsUpdate {
    /// Whether the update carries no fields.
    pub fn is_empty(&self) -> bool {
        self.reactions.is_none() && self.replies.is_none() && self.link_clicks.is_none()
    }
}

/// Filter for listing posts.
///
/// Bounds are inclusive, matching the store's `gte` / `lte` semantics.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Only scored (`Some(true)`) or unscored (`Some(false)`) posts
    pub scored: Option<bool>,
    /// posted_at >= this
    pub posted_from: Option<Time>,
    /// posted_at <= this
    pub posted_until: Option<Time>,
    /// Only this content type
    pub content_type: Option<ContentType>,
    /// Maximum number of rows
    pub limit: Option<usize>,
}

impl PostFilter {
    /// Whether a post satisfies every set condition (the limit aside).
    pub fn matches(&self, post: &PostRecord) -> bool {
        if let Some(scored) = self.scored {
            if post.is_scored() != scored {
                return false;
            }
        }
        if let Some(from) = self.posted_from {
            if post.posted_at < from {
                return false;
            }
        }
        if let Some(until) = self.posted_until {
            if post.posted_at > until {
                return false;
            }
        }
        if let Some(content_type) = self.content_type {
            if post.content_type != content_type {
                return false;
            }
        }
        true
    }
}
