//! Task Scheduler (C6): the concurrent engine. A pass is a dynamically
//! growing DAG of tasks registered on a shared `TaskTracker` — the concrete
//! instance of the spec's "task group that permits children to spawn
//! further children" design note. `TaskTracker::spawn` lets a running task
//! register further children; `TaskTracker::wait()` resolves only once the
//! transitive closure of spawned tasks has finished and the tracker has
//! been closed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::extractor;
use crate::fetcher::Fetcher;
use crate::registry::IdRegistry;
use crate::sanitize::{derive_file_name, DEFAULT_ALLOWED_SUFFIXES};
use crate::store;
use crate::types::{CommentLink, PassStats, StoryRecord};

const DEFAULT_PAGE_NAME: &str = "page.html";
const MAIN_PAGE_NAME: &str = "main.html";
const COMMENTS_PAGE_NAME: &str = "comments.html";
const COMMENT_DIR_PREFIX: &str = "comment_";

#[derive(Default)]
struct Counters {
    story_pages_fetched: AtomicU32,
    story_pages_failed: AtomicU32,
    comment_pages_fetched: AtomicU32,
    comment_pages_failed: AtomicU32,
    outbound_links_found: AtomicU32,
    outbound_pages_fetched: AtomicU32,
    outbound_pages_failed: AtomicU32,
}

pub struct Scheduler {
    fetcher: Arc<Fetcher>,
    registry: Arc<IdRegistry>,
    out_root: PathBuf,
}

impl Scheduler {
    pub fn new(fetcher: Arc<Fetcher>, registry: Arc<IdRegistry>, out_root: PathBuf) -> Self {
        Self { fetcher, registry, out_root }
    }

    /// Run one discovery pass to completion: fetch the front page, parse it,
    /// dispatch per-story expansion, and wait for the transitive closure of
    /// every spawned task before returning.
    pub async fn run_pass(&self, seed_url: &str, cancel: &CancellationToken) -> PassStats {
        info!(seed_url, "pass starting");

        let mut stats = PassStats::default();

        let body = match self.fetcher.fetch(seed_url, cancel).await {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, "front page fetch failed, skipping this pass");
                return stats;
            }
        };

        let html = String::from_utf8_lossy(&body).into_owned();
        store::persist_or_log(&self.out_root.join(MAIN_PAGE_NAME), body.as_ref()).await;

        let stories = extractor::extract_stories(&html, &self.out_root);
        stats.stories_seen = stories.len() as u32;

        let tracker = TaskTracker::new();
        let counters = Arc::new(Counters::default());

        for story in stories {
            if self.registry.contains(&story.id) {
                continue;
            }
            self.registry.insert(&story.id);
            stats.stories_new += 1;

            if is_external(&story.url) {
                let fetcher = Arc::clone(&self.fetcher);
                let counters = Arc::clone(&counters);
                let cancel = cancel.clone();
                let dir_path = story.dir_path.clone();
                let url = story.url.clone();
                tracker.spawn(async move {
                    fetch_and_persist(&fetcher, &url, &dir_path, DEFAULT_PAGE_NAME, &cancel, |ok| {
                        if ok {
                            counters.story_pages_fetched.fetch_add(1, Ordering::Relaxed);
                        } else {
                            counters.story_pages_failed.fetch_add(1, Ordering::Relaxed);
                        }
                    })
                    .await;
                });
            }

            if story.has_comments {
                let fetcher = Arc::clone(&self.fetcher);
                let counters = Arc::clone(&counters);
                let cancel = cancel.clone();
                let tracker_clone = tracker.clone();
                let story = story.clone();
                let comments_url = format!("{}/item?id={}", seed_url.trim_end_matches('/'), story.id);
                tracker.spawn(async move {
                    expand_comments(fetcher, &story, &comments_url, &cancel, &counters, &tracker_clone).await;
                });
            }
        }

        tracker.close();
        tracker.wait().await;

        stats.story_pages_fetched = counters.story_pages_fetched.load(Ordering::Relaxed);
        stats.story_pages_failed = counters.story_pages_failed.load(Ordering::Relaxed);
        stats.comment_pages_fetched = counters.comment_pages_fetched.load(Ordering::Relaxed);
        stats.comment_pages_failed = counters.comment_pages_failed.load(Ordering::Relaxed);
        stats.outbound_links_found = counters.outbound_links_found.load(Ordering::Relaxed);
        stats.outbound_pages_fetched = counters.outbound_pages_fetched.load(Ordering::Relaxed);
        stats.outbound_pages_failed = counters.outbound_pages_failed.load(Ordering::Relaxed);

        info!(%stats, "pass complete");
        stats
    }
}

/// A URL counts as "external" when it parses as absolute with a host
/// component — mirrors the source's `bool(urlsplit(url).netloc)` check.
fn is_external(url: &str) -> bool {
    url::Url::parse(url).map(|u| u.host_str().is_some()).unwrap_or(false)
}

async fn fetch_and_persist(
    fetcher: &Fetcher,
    url: &str,
    dir_path: &Path,
    default_name: &str,
    cancel: &CancellationToken,
    mut on_done: impl FnMut(bool),
) {
    match fetcher.fetch(url, cancel).await {
        Ok(body) => {
            let name = derive_file_name(url, default_name, DEFAULT_ALLOWED_SUFFIXES);
            store::persist_or_log(&dir_path.join(name), body.as_ref()).await;
            on_done(true);
        }
        Err(err) => {
            warn!(url = err.url(), error = %err, "fetch failed, skipping artifact");
            on_done(false);
        }
    }
}

async fn expand_comments(
    fetcher: Arc<Fetcher>,
    story: &StoryRecord,
    comments_url: &str,
    cancel: &CancellationToken,
    counters: &Arc<Counters>,
    tracker: &TaskTracker,
) {
    let body = match fetcher.fetch(comments_url, cancel).await {
        Ok(body) => body,
        Err(err) => {
            warn!(story_id = %story.id, error = %err, "comments fetch failed");
            counters.comment_pages_failed.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };
    counters.comment_pages_fetched.fetch_add(1, Ordering::Relaxed);

    let html = String::from_utf8_lossy(&body).into_owned();
    store::persist_or_log(&story.dir_path.join(COMMENTS_PAGE_NAME), body.as_ref()).await;

    let links: Vec<CommentLink> = extractor::extract_comment_links(&html)
        .into_iter()
        .map(|(comment_id, url)| {
            let dir_path = story.dir_path.join(format!("{COMMENT_DIR_PREFIX}{comment_id}"));
            CommentLink { story_id: story.id.clone(), comment_id, url, dir_path }
        })
        .collect();
    counters.outbound_links_found.fetch_add(links.len() as u32, Ordering::Relaxed);

    for link in links {
        let fetcher = Arc::clone(&fetcher);
        let counters = Arc::clone(counters);
        let cancel = cancel.clone();

        tracker.spawn(async move {
            fetch_and_persist(&fetcher, &link.url, &link.dir_path, DEFAULT_PAGE_NAME, &cancel, |ok| {
                if ok {
                    counters.outbound_pages_fetched.fetch_add(1, Ordering::Relaxed);
                } else {
                    counters.outbound_pages_failed.fetch_add(1, Ordering::Relaxed);
                }
            })
            .await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn front_page(server_uri: &str) -> String {
        format!(
            r#"<html><body><table>
                <tr class="athing" id="100">
                    <td><a href="vote">up</a></td>
                    <td class="title"><a href="{server_uri}/story/100">Story One Hundred</a></td>
                </tr>
                <tr><td class="subtext"><a href="item?id=100">discuss</a></td></tr>
                <tr class="athing" id="101">
                    <td><a href="vote">up</a></td>
                    <td class="title"><a href="{server_uri}/story/101">Story One Oh One</a></td>
                </tr>
                <tr><td class="subtext"><a href="item?id=101">5&nbsp;comments</a></td></tr>
            </table></body></html>"#
        )
    }

    #[tokio::test]
    async fn dedups_against_seeded_registry_and_only_creates_new_story_directories() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex("^/$"))
            .respond_with(ResponseTemplate::new(200).set_body_string(front_page(&server.uri())))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex("^/story/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>story body</html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex("^/item"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(Fetcher::new(crate::fetcher::FetcherConfig::default()));
        let registry = Arc::new(IdRegistry::new(HashSet::from(["100".to_string()])));
        let scheduler = Scheduler::new(fetcher, registry.clone(), dir.path().to_path_buf());

        let cancel = CancellationToken::new();
        let stats = scheduler.run_pass(&server.uri(), &cancel).await;

        assert_eq!(stats.stories_seen, 2);
        assert_eq!(stats.stories_new, 1);
        assert!(registry.contains("100"));
        assert!(registry.contains("101"));

        assert!(!dir.path().join("100 Story One Hundred").exists());
        assert!(dir.path().join("101 Story One Oh One").join("page.html").exists());
        assert!(dir.path().join("main.html").exists());
    }
}
