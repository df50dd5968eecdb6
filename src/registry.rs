//! Id Registry (C3): the filesystem is the source of truth for idempotency.
//! There is no separate ledger — re-running after a crash skips any story
//! whose directory already exists.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use regex::Regex;

/// `^(\d+) .+$` — the leading `<id> ` prefix every story directory carries.
fn dir_name_regex() -> Regex {
    Regex::new(r"^(\d+) .+$").expect("valid regex")
}

/// Enumerate previously-downloaded story ids from `out_root`'s direct
/// children. Non-matching entries (including plain files) are ignored
/// silently.
pub fn load(out_root: &Path) -> std::io::Result<HashSet<String>> {
    let re = dir_name_regex();
    let mut ids = HashSet::new();

    for entry in std::fs::read_dir(out_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(caps) = re.captures(name) {
            ids.insert(caps[1].to_string());
        }
    }

    Ok(ids)
}

/// Concurrent "have I seen this story id?" set, guarded by a mutex since the
/// scheduler dispatches stories from many concurrently-running tasks.
pub struct IdRegistry {
    seen: Mutex<HashSet<String>>,
}

impl IdRegistry {
    pub fn new(seen: HashSet<String>) -> Self {
        Self { seen: Mutex::new(seen) }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.lock().expect("id registry mutex poisoned").contains(id)
    }

    pub fn insert(&self, id: &str) {
        self.seen.lock().expect("id registry mutex poisoned").insert(id.to_string());
    }

    pub fn len(&self) -> usize {
        self.seen.lock().expect("id registry mutex poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_recovers_ids_and_ignores_non_matching_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("42 Hello")).unwrap();
        std::fs::create_dir(dir.path().join("not_a_story")).unwrap();
        std::fs::create_dir(dir.path().join("13 Foo bar")).unwrap();
        std::fs::write(dir.path().join("main.html"), b"x").unwrap();

        let ids = load(dir.path()).unwrap();

        assert_eq!(ids, HashSet::from(["42".to_string(), "13".to_string()]));
    }

    #[test]
    fn registry_contains_reflects_inserts() {
        let registry = IdRegistry::new(HashSet::from(["100".to_string()]));
        assert!(registry.contains("100"));
        assert!(!registry.contains("101"));

        registry.insert("101");
        assert!(registry.contains("101"));
        assert_eq!(registry.len(), 2);
    }
}
