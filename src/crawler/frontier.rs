use std::collections::{HashSet, VecDeque};

use parking_lot::Mutex;
use tokio::sync::Notify;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: Url,
    pub depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Queued,
    Seen,
    CapReached,
}

#[derive(Debug, Default)]
struct FrontierState {
    visited: HashSet<String>,
    queue: VecDeque<CrawlTask>,
    /// Queued plus in-flight tasks. Zero means the crawl is finished.
    pending: usize,
    enqueued: usize,
}

/// Shared crawl frontier. The visited set, the queue and the pending count
/// live under one lock, so "seen before?" and "enqueue" are a single step.
#[derive(Debug)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    changed: Notify,
    max_pages: usize,
}

impl Frontier {
    pub fn new(max_pages: usize) -> Self {
        Self {
            state: Mutex::new(FrontierState::default()),
            changed: Notify::new(),
            max_pages,
        }
    }

    /// Marks `url` visited and queues it, unless it was seen already or the
    /// page cap has been reached.
    pub fn offer(&self, url: Url, depth: usize) -> Offer {
        {
            let mut state = self.state.lock();
            if state.visited.contains(url.as_str()) {
                return Offer::Seen;
            }
            if state.enqueued >= self.max_pages {
                return Offer::CapReached;
            }
            state.visited.insert(url.as_str().to_string());
            state.queue.push_back(CrawlTask { url, depth });
            state.pending += 1;
            state.enqueued += 1;
        }
        self.changed.notify_waiters();
        Offer::Queued
    }

    /// Waits for the next task. Returns `None` once nothing is queued and
    /// nothing is in flight.
    pub async fn next(&self) -> Option<CrawlTask> {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            // Register before inspecting state so a concurrent notify is not lost.
            notified.as_mut().enable();
            {
                let mut state = self.state.lock();
                if let Some(task) = state.queue.pop_front() {
                    return Some(task);
                }
                if state.pending == 0 {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Marks one task returned by [`Frontier::next`] as finished. Must be
    /// called after any links it discovered have been offered.
    pub fn complete(&self) {
        let done = {
            let mut state = self.state.lock();
            state.pending = state.pending.saturating_sub(1);
            state.pending == 0
        };
        if done {
            self.changed.notify_waiters();
        }
    }

    pub fn enqueued(&self) -> usize {
        self.state.lock().enqueued
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }
}

/// Calls [`Frontier::complete`] on drop so a panicking worker cannot leave
/// the pending count stuck above zero.
pub struct Completion<'a>(pub &'a Frontier);

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        self.0.complete();
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;

    fn url(path: &str) -> Url {
        Url::parse("https://example.com/").unwrap().join(path).unwrap()
    }

    #[test]
    fn offer_deduplicates_and_caps() {
        let frontier = Frontier::new(2);
        assert_eq!(frontier.offer(url("/a"), 0), Offer::Queued);
        assert_eq!(frontier.offer(url("/a"), 1), Offer::Seen);
        assert_eq!(frontier.offer(url("/b"), 0), Offer::Queued);
        assert_eq!(frontier.offer(url("/c"), 0), Offer::CapReached);
        assert_eq!(frontier.enqueued(), 2);
    }

    #[tokio::test]
    async fn empty_frontier_is_done_immediately() {
        let frontier = Frontier::new(10);
        assert!(frontier.next().await.is_none());
    }

    #[tokio::test]
    async fn drains_in_fifo_order_then_finishes() {
        let frontier = Frontier::new(10);
        frontier.offer(url("/a"), 0);
        frontier.offer(url("/b"), 1);

        let first = frontier.next().await.unwrap();
        assert_eq!(first.url.path(), "/a");
        let second = frontier.next().await.unwrap();
        assert_eq!((second.url.path(), second.depth), ("/b", 1));

        frontier.complete();
        frontier.complete();
        assert!(frontier.next().await.is_none());
    }

    #[tokio::test]
    async fn idle_worker_waits_for_in_flight_work() {
        let frontier = Arc::new(Frontier::new(10));
        frontier.offer(url("/root"), 0);
        let root = frontier.next().await.unwrap();

        let waiter = {
            let frontier = frontier.clone();
            tokio::spawn(async move { frontier.next().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        frontier.offer(url("/child"), root.depth + 1);
        frontier.complete();
        let child = waiter.await.unwrap().unwrap();
        assert_eq!(child.url.path(), "/child");

        let finisher = {
            let frontier = frontier.clone();
            tokio::spawn(async move { frontier.next().await })
        };
        drop(Completion(&frontier));
        assert!(finisher.await.unwrap().is_none());
    }
}
