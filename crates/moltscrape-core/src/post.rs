//! Post data model and the validity predicate gating acceptance

use serde::{Deserialize, Serialize};

/// One harvested Moltbook post.
///
/// `title` and `content` are nullable at the source; everything else is
/// defaulted so a sparse record deserializes instead of failing the whole
/// batch. Fields the typed model does not name are kept in `extra` so the
/// output snapshot stays lossless for downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Author,
    #[serde(default)]
    pub submolt: Submolt,
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub downvotes: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub created_at: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Submolt {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Post {
    /// A post is kept only if both title and content are present.
    /// This is the single content-quality gate; no other field matters.
    pub fn is_complete(&self) -> bool {
        self.title.is_some() && self.content.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Post {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn complete_post_is_valid() {
        let p = parse(r#"{"id": "p1", "title": "hello", "content": "world"}"#);
        assert!(p.is_complete());
    }

    #[test]
    fn null_title_is_invalid() {
        let p = parse(r#"{"id": "p1", "title": null, "content": "world"}"#);
        assert!(!p.is_complete());
    }

    #[test]
    fn null_content_is_invalid() {
        let p = parse(r#"{"id": "p1", "title": "hello", "content": null}"#);
        assert!(!p.is_complete());
    }

    #[test]
    fn missing_title_and_content_is_invalid() {
        let p = parse(r#"{"id": "p1"}"#);
        assert!(!p.is_complete());
    }

    #[test]
    fn other_fields_do_not_affect_validity() {
        // No author, submolt, counters, or created_at
        let p = parse(r#"{"id": "p1", "title": "t", "content": "c"}"#);
        assert!(p.is_complete());
        assert_eq!(p.upvotes, 0);
        assert_eq!(p.author, Author::default());
    }

    #[test]
    fn full_record_parses() {
        let p = parse(
            r#"{
                "id": "abc",
                "title": "A post",
                "content": "Body",
                "author": {"id": "u1", "name": "agent-7"},
                "submolt": {"id": "s1", "name": "general", "display_name": "General"},
                "upvotes": 12,
                "downvotes": 3,
                "comment_count": 4,
                "created_at": "2025-11-02T10:00:00Z"
            }"#,
        );
        assert!(p.is_complete());
        assert_eq!(p.author.name, "agent-7");
        assert_eq!(p.submolt.display_name, "General");
        assert_eq!(p.comment_count, 4);
    }

    #[test]
    fn unknown_fields_survive_roundtrip() {
        let p = parse(r#"{"id": "p1", "title": "t", "content": "c", "flair": "meta"}"#);
        assert_eq!(p.extra["flair"], "meta");

        let json = serde_json::to_string(&p).unwrap();
        let back: Post = serde_json::from_str(&json).unwrap();
        assert_eq!(back.extra["flair"], "meta");
    }
}
