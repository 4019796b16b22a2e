//! URL Frontier (C4): bounded priority queue of pending URLs per session
//! plus its dedup set. Owned exclusively by one [`crate::crawler::session::Crawler`]
//! (spec §3 Ownership).

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use url::Url;

/// Normalizes a URL per spec §4.4: lowercase scheme, default port removed,
/// fragment stripped, query params preserved in source order, percent
/// encoding canonicalised by `url::Url`'s own parser.
pub fn normalize(raw: &str) -> Option<String> {
    let mut parsed = Url::parse(raw).ok()?;
    parsed.set_fragment(None);

    let default_port = match parsed.scheme() {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    };
    if parsed.port() == default_port {
        let _ = parsed.set_port(None);
    }

    Some(parsed.to_string())
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct FrontierEntry {
    url: String,
    depth: u32,
    priority: i32,
    sequence: u64,
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: higher priority pops first, and within
        // equal priority the lower sequence number (earlier insertion)
        // pops first, i.e. FIFO.
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
    visited: HashSet<String>,
    capacity: usize,
    next_sequence: u64,
}

impl Frontier {
    pub fn new(capacity: usize) -> Self {
        Self { heap: BinaryHeap::new(), visited: HashSet::new(), capacity, next_sequence: 0 }
    }

    /// `enqueue(url, depth, priority)` (spec §4.4). Drops the URL if it
    /// fails to normalize, is already visited, or the frontier is full.
    pub fn enqueue(&mut self, url: &str, depth: u32, priority: i32) -> bool {
        let Some(normalized) = normalize(url) else { return false };
        if self.visited.contains(&normalized) {
            return false;
        }
        if self.heap.len() >= self.capacity {
            return false;
        }
        self.visited.insert(normalized.clone());
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(FrontierEntry { url: normalized, depth, priority, sequence });
        true
    }

    /// `dequeue() -> (url, depth)` (spec §4.4): priority then FIFO within priority.
    pub fn dequeue(&mut self) -> Option<(String, u32)> {
        self.heap.pop().map(|entry| (entry.url, entry.depth))
    }

    pub fn size(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn has_visited(&self, url: &str) -> bool {
        normalize(url).is_some_and(|n| self.visited.contains(&n))
    }

    pub fn mark_visited(&mut self, url: &str) {
        if let Some(n) = normalize(url) {
            self.visited.insert(n);
        }
    }

    pub fn reset(&mut self) {
        self.heap.clear();
        self.visited.clear();
        self.next_sequence = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_default_ports_and_fragments() {
        assert_eq!(
            normalize("HTTP://Example.com:80/path#frag").unwrap(),
            "http://example.com/path"
        );
    }

    #[test]
    fn preserves_query_param_order() {
        assert_eq!(
            normalize("http://example.com/p?b=2&a=1").unwrap(),
            "http://example.com/p?b=2&a=1"
        );
    }

    #[test]
    fn dedups_across_enqueues() {
        let mut f = Frontier::new(10);
        assert!(f.enqueue("http://example.com/a", 0, 0));
        assert!(!f.enqueue("http://example.com/a", 0, 0));
        assert_eq!(f.size(), 1);
    }

    #[test]
    fn respects_capacity() {
        let mut f = Frontier::new(1);
        assert!(f.enqueue("http://example.com/a", 0, 0));
        assert!(!f.enqueue("http://example.com/b", 0, 0));
    }

    #[test]
    fn dequeues_highest_priority_first_then_fifo() {
        let mut f = Frontier::new(10);
        f.enqueue("http://example.com/low", 0, 0);
        f.enqueue("http://example.com/high", 0, 5);
        f.enqueue("http://example.com/low2", 0, 0);

        assert_eq!(f.dequeue().unwrap().0, "http://example.com/high");
        assert_eq!(f.dequeue().unwrap().0, "http://example.com/low");
        assert_eq!(f.dequeue().unwrap().0, "http://example.com/low2");
    }
}
