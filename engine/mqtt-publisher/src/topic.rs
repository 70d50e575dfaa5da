//! Hierarchical topic paths

use std::fmt;

/// `{root}/{segment}[/{segment}...]`; the full path doubles as the publish cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicPath(String);

impl TopicPath {
    /// Root topic as configured; may itself contain levels such as `home/avanza`
    pub fn root(root: &str) -> Self {
        TopicPath(root.trim().trim_end_matches('/').to_string())
    }

    /// Append one level; wildcard and separator characters in the segment are replaced
    pub fn join(&self, segment: &str) -> Self {
        TopicPath(format!("{}/{}", self.0, sanitize_segment(segment)))
    }

    pub fn join_all<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Self {
        segments.into_iter().fold(self.clone(), |path, segment| path.join(segment))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '+' | '#' => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}
