//! Suppliers of older history pages.

use std::time::Duration;

use aichat_proto::message::Message;

use super::{HistoryPager, LoadOutcome, PageRequest, synthesize_page};

/// Async source of older message pages.
pub trait HistorySource: Send + Sync {
    /// Fetches the page described by `request`, oldest message first.
    fn fetch(
        &self,
        request: &PageRequest,
        page_size: usize,
    ) -> impl std::future::Future<Output = Vec<Message>> + Send;
}

/// Source that waits a fixed latency and then synthesizes the page.
#[derive(Debug, Clone)]
pub struct SimulatedHistory {
    latency: Duration,
}

impl SimulatedHistory {
    /// Creates a source with the given per-page latency.
    #[must_use]
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for SimulatedHistory {
    fn default() -> Self {
        Self::new(super::LOAD_DELAY)
    }
}

impl HistorySource for SimulatedHistory {
    async fn fetch(&self, request: &PageRequest, page_size: usize) -> Vec<Message> {
        tokio::time::sleep(self.latency).await;
        synthesize_page(request, page_size)
    }
}

/// Runs one load cycle against a shared pager.
///
/// The pager lock is released while the page is fetched. Returns `None` if
/// the pager did not accept a load.
pub async fn load_older<H: HistorySource>(
    pager: &parking_lot::Mutex<HistoryPager>,
    source: &H,
) -> Option<LoadOutcome> {
    run_load(pager, source, HistoryPager::request_load).await
}

/// Feeds a scroll position to the pager and runs the load it triggers.
///
/// Only an offset of zero (the top of the transcript) starts a load.
pub async fn load_on_scroll<H: HistorySource>(
    pager: &parking_lot::Mutex<HistoryPager>,
    source: &H,
    offset_from_top: usize,
) -> Option<LoadOutcome> {
    run_load(pager, source, |p| p.on_scroll(offset_from_top)).await
}

async fn run_load<H, F>(
    pager: &parking_lot::Mutex<HistoryPager>,
    source: &H,
    begin: F,
) -> Option<LoadOutcome>
where
    H: HistorySource,
    F: FnOnce(&mut HistoryPager) -> Option<PageRequest>,
{
    let (request, page_size) = {
        let mut guard = pager.lock();
        let request = begin(&mut guard)?;
        (request, guard.config().page_size)
    };
    let page = source.fetch(&request, page_size).await;
    Some(pager.lock().complete(&request, page))
}
