//! Document Extractor (C5): pure functions over an HTML body. Built on the
//! `scraper` crate's CSS-selector engine, the same idiom
//! `rootsignal-domains::scraping::link_extractor` uses for outbound-link
//! extraction. Malformed or missing fields produce an empty result for that
//! row; they never abort extraction.

use scraper::{ElementRef, Html, Selector};

use crate::types::StoryRecord;

/// Locate the story rows on the front page. The upstream layout pairs each
/// story over two adjacent rows: a `tr.athing` title row followed by its
/// immediate sibling metadata row.
pub fn extract_stories(page_html: &str, out_root: &std::path::Path) -> Vec<StoryRecord> {
    let document = Html::parse_document(page_html);
    let athing = Selector::parse("tr.athing").expect("valid selector");
    let anchor = Selector::parse("a").expect("valid selector");

    let mut records = Vec::new();

    for title_row in document.select(&athing) {
        let Some(id) = title_row.value().attr("id") else { continue };

        let Some(meta_row) = next_sibling_element(title_row) else { continue };

        let anchors: Vec<_> = title_row.select(&anchor).collect();
        let Some(title_anchor) = anchors.get(1) else { continue };

        let title = title_anchor.text().collect::<String>();
        let Some(url) = title_anchor.value().attr("href") else { continue };

        let has_comments = meta_row
            .select(&anchor)
            .any(|a| a.text().collect::<String>().contains("comments"));

        let dir_name = format!("{id} {}", crate::sanitize::sanitize_title_default(&title));

        records.push(StoryRecord {
            id: id.to_string(),
            title,
            url: url.to_string(),
            has_comments,
            dir_path: out_root.join(dir_name),
        });
    }

    records
}

/// Locate every outbound hyperlink in a comments page: an anchor carrying
/// `rel="nofollow"` nested inside an ancestor comment row (`tr.athing.comtr`).
/// Returns `(comment_id, href)` pairs.
pub fn extract_comment_links(page_html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(page_html);
    let nofollow = match Selector::parse(r#"a[rel="nofollow"]"#) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let comment_row = Selector::parse("tr.athing.comtr").expect("valid selector");

    let mut links = Vec::new();

    for a in document.select(&nofollow) {
        let Some(href) = a.value().attr("href") else { continue };
        let Some(comment_id) = ancestor_comment_id(a, &comment_row) else { continue };
        links.push((comment_id, href.to_string()));
    }

    links
}

fn next_sibling_element(el: ElementRef) -> Option<ElementRef> {
    let mut sibling = el.next_sibling();
    while let Some(node) = sibling {
        if let Some(element) = ElementRef::wrap(node) {
            return Some(element);
        }
        sibling = node.next_sibling();
    }
    None
}

fn ancestor_comment_id(el: ElementRef, comment_row: &Selector) -> Option<String> {
    let mut current = el.parent();
    while let Some(node) = current {
        if let Some(candidate) = ElementRef::wrap(node) {
            if comment_row.matches(&candidate) {
                return candidate.value().attr("id").map(|s| s.to_string());
            }
        }
        current = node.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRONT_PAGE: &str = r#"
        <html><body><table>
          <tr class="athing" id="42">
            <td><span class="rank">1.</span></td>
            <td><a href="vote">up</a></td>
            <td class="title"><a href="https://ex.com/story">A Great Story</a></td>
          </tr>
          <tr>
            <td></td>
            <td class="subtext">
              <a href="user?id=bob">bob</a>
              <a href="item?id=42">42 comments</a>
            </td>
          </tr>
          <tr class="athing" id="43">
            <td><a href="vote">up</a></td>
            <td class="title"><a href="https://ex.com/other">No Comments Story</a></td>
          </tr>
          <tr>
            <td class="subtext">
              <a href="user?id=bob">bob</a>
              <a href="item?id=43">discuss</a>
            </td>
          </tr>
        </table></body></html>
    "#;

    #[test]
    fn extract_stories_reads_id_title_url_and_comment_flag() {
        let out_root = std::path::Path::new("/tmp/out");
        let stories = extract_stories(FRONT_PAGE, out_root);

        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].id, "42");
        assert_eq!(stories[0].title, "A Great Story");
        assert_eq!(stories[0].url, "https://ex.com/story");
        assert!(stories[0].has_comments);
        assert_eq!(stories[0].dir_path, out_root.join("42 A Great Story"));

        assert_eq!(stories[1].id, "43");
        assert!(!stories[1].has_comments);
    }

    #[test]
    fn extract_stories_on_empty_input_returns_empty_and_does_not_throw() {
        assert!(extract_stories("", std::path::Path::new("/tmp/out")).is_empty());
        assert!(extract_stories("<html></html>", std::path::Path::new("/tmp/out")).is_empty());
    }

    const COMMENTS_PAGE: &str = r#"
        <html><body><table class="comment-tree">
          <tr class="athing comtr" id="901">
            <td><div class="comment">See <a href="https://outbound.example/a" rel="nofollow">this link</a></div></td>
          </tr>
          <tr class="athing comtr" id="902">
            <td><div class="comment">
              <a href="https://outbound.example/b" rel="nofollow">one</a>
              <a href="https://outbound.example/c" rel="nofollow">two</a>
            </div></td>
          </tr>
          <tr><td><a href="https://not-a-comment.example" rel="nofollow">stray</a></td></tr>
        </table></body></html>
    "#;

    #[test]
    fn extract_comment_links_finds_nofollow_anchors_under_comment_rows() {
        let links = extract_comment_links(COMMENTS_PAGE);

        assert_eq!(
            links,
            vec![
                ("901".to_string(), "https://outbound.example/a".to_string()),
                ("902".to_string(), "https://outbound.example/b".to_string()),
                ("902".to_string(), "https://outbound.example/c".to_string()),
            ]
        );
    }

    #[test]
    fn extract_comment_links_on_non_html_input_returns_empty() {
        assert!(extract_comment_links("not html at all").is_empty());
    }
}
