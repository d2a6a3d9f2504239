//! Single-expansion accordion over the result list / 结果列表手风琴状态

use serde::Serialize;

use crate::models::DirectoryEntry;

/// At most one expanded entry, keyed by `url` / 最多一个展开项
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccordionState {
    expanded: Option<String>,
}

impl AccordionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collapse `url` if expanded, otherwise expand it alone / 切换展开状态
    ///
    /// A blank `url` identifies nothing and is ignored.
    pub fn toggle(&mut self, url: &str) {
        if url.trim().is_empty() {
            return;
        }
        if self.is_expanded(url) {
            self.expanded = None;
        } else {
            self.expanded = Some(url.to_string());
        }
    }

    pub fn is_expanded(&self, url: &str) -> bool {
        self.expanded.as_deref() == Some(url)
    }

    pub fn expanded(&self) -> Option<&str> {
        self.expanded.as_deref()
    }

    /// Collapse when the expanded entry left the result set / 展开项消失时收起
    ///
    /// Returns true if something was collapsed.
    pub fn retain_visible(&mut self, results: &[DirectoryEntry]) -> bool {
        let vanished = match self.expanded.as_deref() {
            Some(url) => !results.iter().any(|e| e.url == url),
            None => false,
        };
        if vanished {
            self.expanded = None;
        }
        vanished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::dataset::seed_entries;

    #[test]
    fn test_toggle_same_twice_collapses() {
        let mut state = AccordionState::new();
        state.toggle("a");
        assert!(state.is_expanded("a"));
        state.toggle("a");
        assert_eq!(state.expanded(), None);
    }

    #[test]
    fn test_toggle_other_replaces() {
        let mut state = AccordionState::new();
        state.toggle("a");
        state.toggle("b");
        assert!(state.is_expanded("b"));
        assert!(!state.is_expanded("a"));
    }

    #[test]
    fn test_toggle_blank_url_ignored() {
        let mut state = AccordionState::new();
        state.toggle("");
        assert_eq!(state.expanded(), None);
        assert!(!state.is_expanded(""));
    }

    #[test]
    fn test_retain_visible() {
        let seed = seed_entries();
        let mut state = AccordionState::new();
        state.toggle(&seed[2].url);

        assert!(!state.retain_visible(&seed));
        assert!(state.is_expanded(&seed[2].url));

        assert!(state.retain_visible(&seed[..2]));
        assert_eq!(state.expanded(), None);
    }
}
