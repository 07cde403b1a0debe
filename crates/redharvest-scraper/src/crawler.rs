//! The crawl loop: a FIFO work queue drained by a bounded number of
//! in-flight requests.

use std::collections::{HashSet, VecDeque};

use futures::stream::{FuturesUnordered, StreamExt};

use crate::client::HttpFetcher;
use crate::dispatch::{RecordSink, Task};
use crate::error::ScraperError;
use crate::handlers::Harvester;
use crate::summary::CrawlStats;

/// Drives a [`Harvester`] over the network until its work queue is empty.
///
/// A failed request is logged and counted; it never stops the run. Each URL
/// is requested at most once.
pub struct Crawler<'a, S> {
    fetcher: &'a HttpFetcher,
    harvester: &'a Harvester<S>,
    max_concurrency: usize,
}

impl<'a, S: RecordSink> Crawler<'a, S> {
    #[must_use]
    pub fn new(fetcher: &'a HttpFetcher, harvester: &'a Harvester<S>, max_concurrency: usize) -> Self {
        Self {
            fetcher,
            harvester,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Runs `initial` and everything it leads to.
    pub async fn run(&self, initial: Vec<Task>) -> CrawlStats {
        let mut stats = CrawlStats::default();
        let mut queue = VecDeque::new();
        let mut seen = HashSet::new();
        for task in initial {
            enqueue(&mut queue, &mut seen, task);
        }

        let mut in_flight = FuturesUnordered::new();
        loop {
            if !self.harvester.quota().can_push_more() && !queue.is_empty() {
                tracing::info!(dropped = queue.len(), "maxItems reached, dropping queued requests");
                queue.clear();
            }
            while in_flight.len() < self.max_concurrency {
                let Some(task) = queue.pop_front() else {
                    break;
                };
                in_flight.push(self.process(task));
            }

            let Some((task, outcome)) = in_flight.next().await else {
                break;
            };
            match outcome {
                Ok(follow_ups) => {
                    stats.pages_fetched += 1;
                    for next in follow_ups {
                        enqueue(&mut queue, &mut seen, next);
                    }
                }
                Err(e) => {
                    stats.pages_failed += 1;
                    tracing::error!(
                        url = %task.url,
                        task = %task.label(),
                        error = %e,
                        "request failed, skipping"
                    );
                }
            }
        }

        tracing::info!(
            pages_fetched = stats.pages_fetched,
            pages_failed = stats.pages_failed,
            "crawl finished"
        );
        stats
    }

    async fn process(&self, task: Task) -> (Task, Result<Vec<Task>, ScraperError>) {
        tracing::debug!(url = %task.url, task = %task.label(), "fetching");
        let outcome = match self.fetcher.fetch_json(&task.url).await {
            Ok(body) => Ok(self.harvester.handle(&task, &body)),
            Err(e) => Err(e),
        };
        (task, outcome)
    }
}

fn enqueue(queue: &mut VecDeque<Task>, seen: &mut HashSet<String>, task: Task) {
    if seen.insert(task.url.clone()) {
        queue.push_back(task);
    } else {
        tracing::debug!(url = %task.url, "request already queued");
    }
}
