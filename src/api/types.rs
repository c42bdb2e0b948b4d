//! API payload type definitions.
//!
//! One struct per provider response shape, validated at the deserialization
//! boundary. Every payload also serializes, so fetched pages round-trip
//! through the snapshot store unchanged.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Generic provider response envelope.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: String,
    pub response: EnvelopeBody<T>,
}

/// Inner provider response carrying the upstream status and the payload.
#[derive(Debug, Deserialize)]
pub struct EnvelopeBody<T> {
    #[serde(default)]
    pub status_code: Option<u16>,
    pub body: T,
}

/// A page of results that may be followed by another page.
///
/// The two paged resource families terminate differently and keep their own
/// predicates: media pages carry an explicit more-available flag, follower
/// and following pages signal the end by omitting the next cursor.
pub trait Paged {
    type Item;

    /// Whether the remote reports further pages after this one.
    fn more_available(&self) -> bool;

    /// Cursor to request the next page with.
    fn next_cursor(&self) -> Option<&str>;

    fn into_items(self) -> Vec<Self::Item>;
}

/// Username lookup payload (web profile endpoint).
#[derive(Debug, Serialize, Deserialize)]
pub struct UserLookupPayload {
    pub data: LookupData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LookupData {
    pub user: LookupUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LookupUser {
    pub id: String,
}

/// Full profile payload keyed by numeric user id.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfilePayload {
    pub user: ProfileUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUser {
    pub pk: u64,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub biography: String,
    #[serde(default)]
    pub follower_count: u64,
    #[serde(default)]
    pub following_count: u64,
    #[serde(default)]
    pub media_count: u64,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub hd_profile_pic_url_info: Option<PicInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PicInfo {
    pub url: String,
}

/// One page of an account's posts.
#[derive(Debug, Serialize, Deserialize)]
pub struct MediaPagePayload {
    #[serde(default)]
    pub items: Vec<PostItem>,
    #[serde(default)]
    pub more_available: bool,
    #[serde(default)]
    pub next_max_id: Option<String>,
}

impl Paged for MediaPagePayload {
    type Item = PostItem;

    fn more_available(&self) -> bool {
        self.more_available
    }

    fn next_cursor(&self) -> Option<&str> {
        self.next_max_id.as_deref()
    }

    fn into_items(self) -> Vec<PostItem> {
        self.items
    }
}

/// A single post, possibly a carousel of several media.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostItem {
    #[serde(flatten)]
    pub media: MediaVersions,
    pub taken_at: i64,
    #[serde(default)]
    pub caption: Option<Caption>,
    #[serde(default)]
    pub carousel_media: Option<Vec<MediaVersions>>,
}

impl PostItem {
    /// Carousel children, or the post itself as a single-element carousel.
    pub fn carousel(&self) -> Vec<&MediaVersions> {
        match &self.carousel_media {
            Some(children) => children.iter().collect(),
            None => vec![&self.media],
        }
    }

    pub fn caption_text(&self) -> Option<&str> {
        self.caption
            .as_ref()
            .map(|c| c.text.as_str())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caption {
    #[serde(default)]
    pub text: String,
}

/// Media fragment shared by posts, carousel children and stories: candidate
/// source URLs ordered by preference, video variants taking precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaVersions {
    pub id: String,
    #[serde(default)]
    pub video_versions: Option<Vec<VideoVersion>>,
    #[serde(default, rename = "image_versions2")]
    pub image_versions: Option<ImageVersions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoVersion {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageVersions {
    #[serde(default)]
    pub candidates: Vec<ImageCandidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageCandidate {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Story reels payload, keyed by reel id (`<user_id>` for the active story
/// tray, `highlight:<id>` for highlight reels).
#[derive(Debug, Serialize, Deserialize)]
pub struct StoriesPayload {
    #[serde(default)]
    pub reels: HashMap<String, Reel>,
}

impl StoriesPayload {
    /// Items of one reel; a missing reel means the account has none live.
    pub fn reel_items(&self, reel_id: &str) -> &[StoryItem] {
        self.reels
            .get(reel_id)
            .map(|r| r.items.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reel {
    #[serde(default)]
    pub items: Vec<StoryItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryItem {
    #[serde(flatten)]
    pub media: MediaVersions,
    pub taken_at: i64,
}

/// Highlight index payload (web graph endpoint).
#[derive(Debug, Serialize, Deserialize)]
pub struct HighlightIndexPayload {
    pub data: HighlightData,
}

impl HighlightIndexPayload {
    pub fn nodes(&self) -> impl Iterator<Item = &HighlightNode> {
        self.data
            .user
            .edge_highlight_reels
            .edges
            .iter()
            .map(|edge| &edge.node)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HighlightData {
    pub user: HighlightUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HighlightUser {
    pub edge_highlight_reels: HighlightEdges,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HighlightEdges {
    #[serde(default)]
    pub edges: Vec<HighlightEdge>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HighlightEdge {
    pub node: HighlightNode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightNode {
    pub id: String,
    pub title: String,
}

/// One page of an account's followers or following.
#[derive(Debug, Serialize, Deserialize)]
pub struct FollowPagePayload {
    #[serde(default)]
    pub users: Vec<UserSummary>,
    #[serde(default)]
    pub next_max_id: Option<String>,
}

impl Paged for FollowPagePayload {
    type Item = UserSummary;

    fn more_available(&self) -> bool {
        self.next_max_id.is_some()
    }

    fn next_cursor(&self) -> Option<&str> {
        self.next_max_id.as_deref()
    }

    fn into_items(self) -> Vec<UserSummary> {
        self.users
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub pk: u64,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
}

/// Derived export of a fetched user list.
#[derive(Debug, Serialize)]
pub struct UserListExport<'a> {
    pub users: &'a [UserSummary],
}

/// Derived export reduced to username/id pairs.
#[derive(Debug, Serialize)]
pub struct UserRefExport {
    pub users: Vec<UserRef>,
}

#[derive(Debug, Serialize)]
pub struct UserRef {
    pub username: String,
    pub id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_page_parses_carousel_and_flag() {
        let raw = r#"{
            "items": [{
                "id": "111_1",
                "taken_at": 1700000000,
                "caption": {"text": "three shots"},
                "carousel_media": [
                    {"id": "a", "image_versions2": {"candidates": [{"url": "http://x/a.jpg"}]}},
                    {"id": "b", "video_versions": [{"url": "http://x/b.mp4"}]},
                    {"id": "c", "image_versions2": {"candidates": [{"url": "http://x/c.jpg"}]}}
                ]
            }],
            "more_available": true,
            "next_max_id": "cursor_1"
        }"#;

        let page: MediaPagePayload = serde_json::from_str(raw).unwrap();
        assert!(page.more_available());
        assert_eq!(page.next_cursor(), Some("cursor_1"));

        let post = &page.items[0];
        assert_eq!(post.carousel().len(), 3);
        assert_eq!(post.caption_text(), Some("three shots"));
    }

    #[test]
    fn test_post_without_carousel_is_single_element() {
        let raw = r#"{
            "id": "222_1",
            "taken_at": 1700000000,
            "image_versions2": {"candidates": [{"url": "http://x/single.jpg"}]}
        }"#;

        let post: PostItem = serde_json::from_str(raw).unwrap();
        let media = post.carousel();
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].id, "222_1");
        assert_eq!(post.caption_text(), None);
    }

    #[test]
    fn test_media_page_termination_uses_flag() {
        let raw = r#"{"items": [], "more_available": false, "next_max_id": "still_here"}"#;
        let page: MediaPagePayload = serde_json::from_str(raw).unwrap();
        // An explicit false flag ends pagination even with a cursor present.
        assert!(!page.more_available());
    }

    #[test]
    fn test_follow_page_termination_uses_cursor_presence() {
        let with_cursor: FollowPagePayload =
            serde_json::from_str(r#"{"users": [], "next_max_id": "abc"}"#).unwrap();
        assert!(with_cursor.more_available());

        let without_cursor: FollowPagePayload = serde_json::from_str(r#"{"users": []}"#).unwrap();
        assert!(!without_cursor.more_available());
    }

    #[test]
    fn test_stories_payload_reel_lookup() {
        let raw = r#"{
            "reels": {
                "12345": {"items": [
                    {"id": "s1", "taken_at": 1700000100,
                     "video_versions": [{"url": "http://x/s1.mp4"}]}
                ]}
            }
        }"#;

        let stories: StoriesPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(stories.reel_items("12345").len(), 1);
        assert!(stories.reel_items("99999").is_empty());
    }

    #[test]
    fn test_highlight_index_nodes() {
        let raw = r#"{
            "data": {"user": {"edge_highlight_reels": {"edges": [
                {"node": {"id": "17900001", "title": "travel"}},
                {"node": {"id": "17900002", "title": "food"}}
            ]}}}
        }"#;

        let index: HighlightIndexPayload = serde_json::from_str(raw).unwrap();
        let titles: Vec<&str> = index.nodes().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["travel", "food"]);
    }

    #[test]
    fn test_envelope_carries_upstream_status() {
        let raw = r#"{
            "status": "done",
            "response": {"status_code": 200, "body": {"users": []}}
        }"#;

        let envelope: ApiEnvelope<FollowPagePayload> = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.status, "done");
        assert_eq!(envelope.response.status_code, Some(200));
    }
}
