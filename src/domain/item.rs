use chrono::{DateTime, TimeZone, Utc};
use html_escape::decode_html_entities;
use serde::Deserialize;

/// An item record as the API returns it. Every field except `id` is
/// optional; absent fields degrade to placeholders at render time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawItem {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub by: Option<String>,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub descendants: Option<u32>,
    #[serde(default)]
    pub kids: Vec<u64>,
    #[serde(default)]
    pub parts: Vec<u64>,
}

/// Explicit item kind. A set `deleted` (or `dead`) flag wins over every
/// other field; otherwise the API `type` string is authoritative, with a
/// field-presence fallback for records that omit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Story {
        url: Option<String>,
        score: i64,
        descendants: u32,
    },
    Job {
        url: Option<String>,
    },
    Comment,
    Poll {
        parts: Vec<u64>,
        score: i64,
    },
    PollOption {
        score: i64,
    },
    Deleted,
}

#[derive(Debug, Clone)]
pub struct Item {
    pub id: u64,
    pub by: Option<String>,
    pub time: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub kids: Vec<u64>,
    pub kind: ItemKind,
}

impl From<RawItem> for Item {
    fn from(raw: RawItem) -> Self {
        let kind = if raw.deleted || raw.dead {
            ItemKind::Deleted
        } else {
            match raw.kind.as_deref() {
                Some("story") => ItemKind::Story {
                    url: raw.url.clone(),
                    score: raw.score.unwrap_or(0),
                    descendants: raw.descendants.unwrap_or(0),
                },
                Some("job") => ItemKind::Job {
                    url: raw.url.clone(),
                },
                Some("comment") => ItemKind::Comment,
                Some("poll") => ItemKind::Poll {
                    parts: raw.parts.clone(),
                    score: raw.score.unwrap_or(0),
                },
                Some("pollopt") => ItemKind::PollOption {
                    score: raw.score.unwrap_or(0),
                },
                _ if !raw.parts.is_empty() => ItemKind::Poll {
                    parts: raw.parts.clone(),
                    score: raw.score.unwrap_or(0),
                },
                _ if raw.title.is_none() => ItemKind::Comment,
                _ => ItemKind::Story {
                    url: raw.url.clone(),
                    score: raw.score.unwrap_or(0),
                    descendants: raw.descendants.unwrap_or(0),
                },
            }
        };

        let time = raw
            .time
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

        Item {
            id: raw.id,
            by: raw.by,
            time,
            title: raw.title,
            text: raw.text,
            kids: raw.kids,
            kind,
        }
    }
}

impl Item {
    pub fn is_deleted(&self) -> bool {
        self.kind == ItemKind::Deleted
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("No Title")
    }

    pub fn display_author(&self) -> &str {
        self.by.as_deref().unwrap_or("Anonymous")
    }

    /// Body text cleaned up for terminal display, or the fixed
    /// no-content placeholder.
    pub fn display_text(&self) -> String {
        match self.text.as_deref() {
            Some(text) => clean_html(text),
            None => "NO CONTENT".to_string(),
        }
    }

    pub fn url(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Story { url, .. } | ItemKind::Job { url } => url.as_deref(),
            _ => None,
        }
    }

    pub fn score(&self) -> i64 {
        match &self.kind {
            ItemKind::Story { score, .. }
            | ItemKind::Poll { score, .. }
            | ItemKind::PollOption { score } => *score,
            _ => 0,
        }
    }

    pub fn poll_parts(&self) -> &[u64] {
        match &self.kind {
            ItemKind::Poll { parts, .. } => parts,
            _ => &[],
        }
    }
}

/// Decode HTML entities and strip tags, turning `<p>` boundaries into
/// newlines so paragraphs survive the trip to the terminal.
pub fn clean_html(html: &str) -> String {
    let decoded = decode_html_entities(html);

    let mut result = String::with_capacity(decoded.len());
    let mut rest = decoded.as_ref();

    while let Some(open) = rest.find('<') {
        result.push_str(&rest[..open]);
        rest = &rest[open..];
        match rest.find('>') {
            Some(close) => {
                let tag = rest[1..close].trim().to_ascii_lowercase();
                if tag == "p" || tag.starts_with("p ") {
                    result.push('\n');
                }
                rest = &rest[close + 1..];
            }
            None => {
                // Unterminated tag, keep the rest verbatim.
                result.push_str(rest);
                rest = "";
            }
        }
    }
    result.push_str(rest);

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(kind: Option<&str>) -> RawItem {
        RawItem {
            id: 1,
            kind: kind.map(String::from),
            ..RawItem::default()
        }
    }

    #[test]
    fn test_typed_story() {
        let mut r = raw(Some("story"));
        r.title = Some("A title".into());
        r.url = Some("https://example.com".into());
        r.score = Some(42);
        let item = Item::from(r);
        assert_eq!(
            item.kind,
            ItemKind::Story {
                url: Some("https://example.com".into()),
                score: 42,
                descendants: 0
            }
        );
        assert_eq!(item.url(), Some("https://example.com"));
        assert_eq!(item.score(), 42);
    }

    #[test]
    fn test_deleted_flag_wins_over_fields() {
        let mut r = raw(Some("story"));
        r.deleted = true;
        r.title = Some("Still here".into());
        r.by = Some("ghost".into());
        let item = Item::from(r);
        assert!(item.is_deleted());
        assert_eq!(item.kind, ItemKind::Deleted);
    }

    #[test]
    fn test_dead_counts_as_deleted() {
        let mut r = raw(Some("comment"));
        r.dead = true;
        assert!(Item::from(r).is_deleted());
    }

    #[test]
    fn test_untyped_poll_inferred_from_parts() {
        let mut r = raw(None);
        r.parts = vec![10, 11, 12];
        let item = Item::from(r);
        assert_eq!(item.poll_parts(), &[10, 11, 12]);
    }

    #[test]
    fn test_untyped_untitled_is_comment() {
        let mut r = raw(None);
        r.text = Some("a reply".into());
        assert_eq!(Item::from(r).kind, ItemKind::Comment);
    }

    #[test]
    fn test_display_placeholders() {
        let item = Item::from(raw(Some("story")));
        assert_eq!(item.display_title(), "No Title");
        assert_eq!(item.display_author(), "Anonymous");
        assert_eq!(item.display_text(), "NO CONTENT");
    }

    #[test]
    fn test_epoch_time_conversion() {
        let mut r = raw(Some("comment"));
        r.time = Some(1_700_000_000);
        let item = Item::from(r);
        assert_eq!(item.time.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_clean_html_strips_tags_and_entities() {
        let cleaned = clean_html("I &quot;think&quot; <i>so</i>.<p>New paragraph");
        assert_eq!(cleaned, "I \"think\" so.\nNew paragraph");
    }

    #[test]
    fn test_clean_html_keeps_unterminated_tail() {
        assert_eq!(clean_html("tail <unclosed"), "tail <unclosed");
    }

    #[test]
    fn test_raw_item_decodes_from_api_json() {
        let body = r#"{
            "by": "norvig",
            "id": 2921983,
            "kids": [2922097, 2922429],
            "parent": 2921506,
            "text": "Aw shucks&#33;",
            "time": 1314211127,
            "type": "comment"
        }"#;
        let raw: RawItem = serde_json::from_str(body).unwrap();
        assert_eq!(raw.id, 2921983);
        assert_eq!(raw.kids, vec![2922097, 2922429]);
        let item = Item::from(raw);
        assert_eq!(item.kind, ItemKind::Comment);
        assert_eq!(item.display_text(), "Aw shucks!");
    }
}
