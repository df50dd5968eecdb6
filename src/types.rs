use std::path::PathBuf;

/// One top-level story discovered on the front page.
#[derive(Debug, Clone)]
pub struct StoryRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    pub has_comments: bool,
    /// `<out_root>/<id> <sanitized_title>` — the leading `<id> ` prefix is
    /// mandatory; [`crate::registry::IdRegistry::load`] parses it back out.
    pub dir_path: PathBuf,
}

/// One outbound hyperlink extracted from a story's comment thread.
#[derive(Debug, Clone)]
pub struct CommentLink {
    pub story_id: String,
    pub comment_id: String,
    pub url: String,
    /// `<story_dir>/comment_<comment_id>`
    pub dir_path: PathBuf,
}

/// Counters for a single discovery pass, surfaced as a summary log line once
/// the pass's task tree has drained.
#[derive(Debug, Default)]
pub struct PassStats {
    pub stories_seen: u32,
    pub stories_new: u32,
    pub story_pages_fetched: u32,
    pub story_pages_failed: u32,
    pub comment_pages_fetched: u32,
    pub comment_pages_failed: u32,
    pub outbound_links_found: u32,
    pub outbound_pages_fetched: u32,
    pub outbound_pages_failed: u32,
}

impl std::fmt::Display for PassStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== pass complete ===")?;
        writeln!(f, "stories seen:        {}", self.stories_seen)?;
        writeln!(f, "stories new:         {}", self.stories_new)?;
        writeln!(
            f,
            "story pages:         {} ok, {} failed",
            self.story_pages_fetched, self.story_pages_failed
        )?;
        writeln!(
            f,
            "comment pages:       {} ok, {} failed",
            self.comment_pages_fetched, self.comment_pages_failed
        )?;
        write!(
            f,
            "outbound links:      {} found, {} ok, {} failed",
            self.outbound_links_found, self.outbound_pages_fetched, self.outbound_pages_failed
        )
    }
}
