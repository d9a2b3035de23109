use crate::{
    accumulator::page_volume,
    error::FetchError,
    source::{PageRequest, PageSource},
    types::{ChainClass, ChainId, Deadline, Endpoint, EndpointKind, Page, ScanResult},
    VolumeEngine,
};
use futures::stream::{self, Stream, StreamExt};
use rust_decimal::Decimal;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Why an endpoint scan stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Shared wall-clock budget spent before the next fetch
    Deadline,
    /// Page cap reached
    PageCap,
    /// Endpoint/chain/address combination rejected upstream (400, 410, 501)
    Unsupported(FetchError),
    /// Timeout or transport failure; totals so far are kept
    FetchFailure(FetchError),
    /// A page came back with no items
    Exhausted,
    /// Last page had `has_more = false`
    NoMorePages,
    /// Unclassified failure, fatal to the request
    Aborted(String),
}

impl StopReason {
    pub fn is_aborted(&self) -> bool {
        matches!(self, StopReason::Aborted(_))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Deadline => f.write_str("deadline"),
            StopReason::PageCap => f.write_str("page cap"),
            StopReason::Unsupported(e) => write!(f, "unsupported ({})", e),
            StopReason::FetchFailure(e) => write!(f, "fetch failure ({})", e),
            StopReason::Exhausted => f.write_str("exhausted"),
            StopReason::NoMorePages => f.write_str("no more pages"),
            StopReason::Aborted(message) => write!(f, "aborted ({})", message),
        }
    }
}

/// Totals of one endpoint kind scanned against one chain/address
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointScan {
    pub kind: EndpointKind,
    /// Endpoint variant that produced the totals, `None` when none was offered
    pub endpoint: Option<Endpoint>,
    pub volume: Decimal,
    pub tx_count: u64,
    /// Pages that contributed to the totals
    pub pages: u32,
    pub trace: Vec<String>,
    pub stop: StopReason,
}

impl EndpointScan {
    pub fn into_result(self) -> ScanResult {
        match self.stop {
            StopReason::Aborted(message) => ScanResult::failed(message, self.trace),
            _ => ScanResult {
                volume: self.volume,
                tx_count: self.tx_count,
                trace: self.trace,
                error: None,
            },
        }
    }

    fn rejected_outright(&self) -> bool {
        self.pages == 0 && matches!(self.stop, StopReason::Unsupported(_))
    }
}

enum PageStep {
    Fetched(Page),
    Stopped(StopReason),
}

enum Cursor {
    Next(u32),
    /// Last page consumed, the stop still has to be reported
    Drained,
    Closed,
}

/// Running totals threaded through the page stream
struct Tally {
    endpoint: Endpoint,
    class: ChainClass,
    volume: Decimal,
    tx_count: u64,
    pages: u32,
    trace: Vec<String>,
    stop: Option<StopReason>,
}

impl Tally {
    fn new(endpoint: Endpoint, class: ChainClass) -> Self {
        Self {
            endpoint,
            class,
            volume: Decimal::ZERO,
            tx_count: 0,
            pages: 0,
            trace: Vec::new(),
            stop: None,
        }
    }

    fn absorb(mut self, step: PageStep) -> Self {
        match step {
            PageStep::Fetched(page) => {
                let volume = page_volume(&page.items, self.endpoint.kind(), self.class);
                self.volume = self.volume.saturating_add(volume);
                self.tx_count += page.items.len() as u64;
                self.pages += 1;

                debug!(
                    "📄 {} page {}: {} items, ${:.2} (running ${:.2})",
                    self.endpoint,
                    page.number,
                    page.items.len(),
                    volume,
                    self.volume
                );
                self.trace.push(format!(
                    "[{}] page {}: {} items, ${:.2}",
                    self.endpoint,
                    page.number,
                    page.items.len(),
                    volume
                ));
            }
            PageStep::Stopped(reason) => {
                match &reason {
                    StopReason::Unsupported(e) => {
                        warn!("⚠️ Skipping {}: {}", self.endpoint, e)
                    }
                    StopReason::FetchFailure(e) => warn!(
                        "⚠️ {} stopped after {} pages on fetch failure: {}",
                        self.endpoint, self.pages, e
                    ),
                    StopReason::Aborted(message) => {
                        error!("❌ {} aborted: {}", self.endpoint, message)
                    }
                    _ => {}
                }
                self.trace.push(format!(
                    "[{}] stopped after {} pages: {}",
                    self.endpoint, self.pages, reason
                ));
                self.stop = Some(reason);
            }
        }
        self
    }

    fn finish(self) -> EndpointScan {
        EndpointScan {
            kind: self.endpoint.kind(),
            endpoint: Some(self.endpoint),
            volume: self.volume,
            tx_count: self.tx_count,
            pages: self.pages,
            trace: self.trace,
            stop: self.stop.unwrap_or(StopReason::Exhausted),
        }
    }
}

impl<S: PageSource> VolumeEngine<S> {
    /// Scan one endpoint kind for a chain/address until any stop condition holds.
    ///
    /// Endpoint variants from [`EndpointKind::endpoint_plan`] are tried in
    /// order; the next one only when the previous was rejected as unsupported
    /// before contributing a page. Never fails: errors end the scan with the
    /// totals accumulated so far.
    pub async fn scan(
        &self,
        chain: &ChainId,
        address: &str,
        kind: EndpointKind,
        deadline: &Deadline,
        max_pages: u32,
    ) -> EndpointScan {
        let class = chain.class();
        let mut trace = Vec::new();
        let mut endpoints = kind.endpoint_plan(class).iter().copied().peekable();

        while let Some(endpoint) = endpoints.next() {
            let mut scan = self
                .scan_endpoint(chain, address, endpoint, deadline, max_pages)
                .await;
            trace.append(&mut scan.trace);

            if scan.rejected_outright() {
                if let Some(next) = endpoints.peek() {
                    info!("🔁 {} rejected on chain {}, falling back to {}", endpoint, chain, next);
                    trace.push(format!("[{}] falling back to {}", endpoint, next));
                    continue;
                }
            }

            scan.trace = trace;
            return scan;
        }

        debug!("{} not offered on {:?} chain {}", kind, class, chain);
        trace.push(format!("[{}] not offered on this chain, skipped", kind));
        EndpointScan {
            kind,
            endpoint: None,
            volume: Decimal::ZERO,
            tx_count: 0,
            pages: 0,
            trace,
            stop: StopReason::Unsupported(FetchError::NotImplemented),
        }
    }

    /// Fold the page stream of a single endpoint variant into totals
    async fn scan_endpoint(
        &self,
        chain: &ChainId,
        address: &str,
        endpoint: Endpoint,
        deadline: &Deadline,
        max_pages: u32,
    ) -> EndpointScan {
        self.page_steps(chain, address, endpoint, deadline, max_pages)
            .fold(Tally::new(endpoint, chain.class()), |tally, step| async move {
                tally.absorb(step)
            })
            .await
            .finish()
    }

    /// Lazy, finite sequence of page fetches, ending with exactly one stop.
    ///
    /// Pages are requested strictly in order from 0; the next fetch is only
    /// issued after the previous page's continuation flag is known.
    fn page_steps<'a>(
        &'a self,
        chain: &'a ChainId,
        address: &'a str,
        endpoint: Endpoint,
        deadline: &'a Deadline,
        max_pages: u32,
    ) -> impl Stream<Item = PageStep> + Send + 'a {
        let page_size = self.settings.page_size;

        stream::unfold(Cursor::Next(0), move |cursor| async move {
            let page_number = match cursor {
                Cursor::Closed => return None,
                Cursor::Drained => {
                    return Some((PageStep::Stopped(StopReason::NoMorePages), Cursor::Closed))
                }
                Cursor::Next(page_number) => page_number,
            };

            if deadline.is_expired() {
                return Some((PageStep::Stopped(StopReason::Deadline), Cursor::Closed));
            }
            if page_number >= max_pages {
                return Some((PageStep::Stopped(StopReason::PageCap), Cursor::Closed));
            }

            let request = PageRequest {
                chain: chain.clone(),
                address: address.to_string(),
                endpoint,
                page_number,
                page_size,
            };

            let step = match self.source.fetch(&request).await {
                Ok(page) if page.items.is_empty() => {
                    (PageStep::Stopped(StopReason::Exhausted), Cursor::Closed)
                }
                Ok(page) => {
                    let next = if page.has_more {
                        Cursor::Next(page_number + 1)
                    } else {
                        Cursor::Drained
                    };
                    (PageStep::Fetched(page), next)
                }
                Err(e) if e.is_unsupported() => {
                    (PageStep::Stopped(StopReason::Unsupported(e)), Cursor::Closed)
                }
                Err(FetchError::Decode(message)) => {
                    (PageStep::Stopped(StopReason::Aborted(message)), Cursor::Closed)
                }
                Err(e) => (PageStep::Stopped(StopReason::FetchFailure(e)), Cursor::Closed),
            };
            Some(step)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{page, ScriptedSource};
    use crate::types::Item;
    use crate::ScanSettings;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn engine(source: ScriptedSource) -> VolumeEngine<ScriptedSource> {
        VolumeEngine::new(source, ScanSettings::default())
    }

    fn generous() -> Deadline {
        Deadline::start(Duration::from_secs(60))
    }

    fn eth() -> ChainId {
        ChainId::new("1")
    }

    #[tokio::test]
    async fn test_two_page_transfer_scan() {
        let source = ScriptedSource::new()
            .respond(
                &eth(),
                Endpoint::TransfersV2,
                page(
                    vec![
                        Item::with_transfers([dec!(10), dec!(20)]),
                        Item::default(),
                        Item::with_transfers([dec!(5)]),
                    ],
                    true,
                ),
            )
            .respond(
                &eth(),
                Endpoint::TransfersV2,
                page(vec![Item::with_transfers([dec!(7)])], false),
            );
        let engine = engine(source);

        let scan = engine
            .scan(&eth(), "0xabc", EndpointKind::Transfers, &generous(), 5)
            .await;

        assert_eq!(scan.volume, dec!(42));
        assert_eq!(scan.tx_count, 4);
        assert_eq!(scan.pages, 2);
        assert_eq!(scan.stop, StopReason::NoMorePages);
        assert_eq!(scan.endpoint, Some(Endpoint::TransfersV2));
        assert_eq!(engine.source().calls_to(Endpoint::TransfersV2), vec![0, 1]);
        assert_eq!(
            scan.trace,
            vec![
                "[transfers_v2] page 0: 3 items, $35.00".to_string(),
                "[transfers_v2] page 1: 1 items, $7.00".to_string(),
                "[transfers_v2] stopped after 2 pages: no more pages".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_solana_transactions_scan() {
        let solana = ChainId::solana();
        let source = ScriptedSource::new().respond(
            &solana,
            Endpoint::TransactionsV2,
            page(
                vec![
                    Item {
                        value_quote: Some(dec!(100)),
                        fee_quote: Some(dec!(1)),
                        ..Default::default()
                    },
                    Item {
                        value_quote: Some(dec!(50)),
                        fee_quote: Some(dec!(0)),
                        ..Default::default()
                    },
                ],
                false,
            ),
        );
        let engine = engine(source);

        let scan = engine
            .scan(&solana, "So1ana", EndpointKind::Transactions, &generous(), 5)
            .await;

        assert_eq!(scan.volume, dec!(151));
        assert_eq!(scan.tx_count, 2);
        // v3 is never attempted on Solana
        assert!(engine.source().calls_to(Endpoint::TransactionsV3).is_empty());
    }

    #[tokio::test]
    async fn test_not_implemented_first_page_stops_cleanly() {
        let source = ScriptedSource::new().respond(
            &eth(),
            Endpoint::TransfersV2,
            Err(FetchError::NotImplemented),
        );
        let engine = engine(source);

        let scan = engine
            .scan(&eth(), "0xabc", EndpointKind::Transfers, &generous(), 5)
            .await;

        assert_eq!(scan.volume, Decimal::ZERO);
        assert_eq!(scan.tx_count, 0);
        assert_eq!(scan.stop, StopReason::Unsupported(FetchError::NotImplemented));
        assert!(scan.clone().into_result().error.is_none());
        assert_eq!(engine.source().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_page_stops_without_counting() {
        let source = ScriptedSource::new()
            .respond(&eth(), Endpoint::TransfersV2, page(vec![Item::with_transfers([dec!(3)])], true))
            .respond(&eth(), Endpoint::TransfersV2, page(vec![], true));
        let engine = engine(source);

        let scan = engine
            .scan(&eth(), "0xabc", EndpointKind::Transfers, &generous(), 5)
            .await;

        assert_eq!(scan.stop, StopReason::Exhausted);
        assert_eq!(scan.tx_count, 1);
        assert_eq!(scan.pages, 1);
        assert_eq!(engine.source().calls_to(Endpoint::TransfersV2), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_page_cap_is_exact() {
        let source = ScriptedSource::new().repeat(
            &eth(),
            Endpoint::TransfersV2,
            Page {
                number: 0,
                items: vec![Item::with_transfers([dec!(1)]); 100],
                has_more: true,
            },
        );
        let engine = engine(source);

        let scan = engine
            .scan(&eth(), "0xabc", EndpointKind::Transfers, &generous(), 3)
            .await;

        assert_eq!(scan.stop, StopReason::PageCap);
        assert_eq!(scan.pages, 3);
        assert_eq!(scan.tx_count, 300);
        assert_eq!(engine.source().calls_to(Endpoint::TransfersV2), vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_keeps_partial_totals() {
        let source = ScriptedSource::new()
            .repeat(
                &eth(),
                Endpoint::TransfersV2,
                Page {
                    number: 0,
                    items: vec![Item::with_transfers([dec!(2)])],
                    has_more: true,
                },
            )
            .with_latency(Duration::from_secs(1));
        let engine = engine(source);
        let deadline = Deadline::start(Duration::from_millis(2500));
        let started = tokio::time::Instant::now();

        let scan = engine
            .scan(&eth(), "0xabc", EndpointKind::Transfers, &deadline, 100)
            .await;

        // fetches start at 0s, 1s and 2s; the check at 3s sees the budget spent
        assert_eq!(scan.stop, StopReason::Deadline);
        assert_eq!(scan.pages, 3);
        assert_eq!(scan.volume, dec!(6));
        assert!(started.elapsed() <= Duration::from_millis(2500) + Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_partial_totals() {
        let source = ScriptedSource::new()
            .respond(&eth(), Endpoint::TransfersV2, page(vec![Item::with_transfers([dec!(9)])], true))
            .respond(
                &eth(),
                Endpoint::TransfersV2,
                Err(FetchError::Transport("connection reset".into())),
            );
        let engine = engine(source);

        let scan = engine
            .scan(&eth(), "0xabc", EndpointKind::Transfers, &generous(), 5)
            .await;

        assert_eq!(scan.volume, dec!(9));
        assert!(matches!(scan.stop, StopReason::FetchFailure(_)));
        assert!(scan.into_result().error.is_none());
    }

    #[tokio::test]
    async fn test_decode_failure_aborts() {
        let source = ScriptedSource::new()
            .respond(&eth(), Endpoint::TransfersV2, page(vec![Item::with_transfers([dec!(9)])], true))
            .respond(
                &eth(),
                Endpoint::TransfersV2,
                Err(FetchError::Decode("expected value at line 1".into())),
            );
        let engine = engine(source);

        let scan = engine
            .scan(&eth(), "0xabc", EndpointKind::Transfers, &generous(), 5)
            .await;

        assert!(scan.stop.is_aborted());
        let result = scan.into_result();
        assert_eq!(result.volume, Decimal::ZERO);
        assert_eq!(result.error.as_deref(), Some("expected value at line 1"));
    }

    #[tokio::test]
    async fn test_transactions_fall_back_from_v3_to_v2() {
        let source = ScriptedSource::new()
            .respond(&eth(), Endpoint::TransactionsV3, Err(FetchError::Gone))
            .respond(
                &eth(),
                Endpoint::TransactionsV2,
                page(vec![Item::with_value(dec!(120))], false),
            );
        let engine = engine(source);

        let scan = engine
            .scan(&eth(), "0xabc", EndpointKind::Transactions, &generous(), 5)
            .await;

        assert_eq!(scan.endpoint, Some(Endpoint::TransactionsV2));
        assert_eq!(scan.volume, dec!(120));
        assert_eq!(engine.source().calls_to(Endpoint::TransactionsV3), vec![0]);
        assert_eq!(engine.source().calls_to(Endpoint::TransactionsV2), vec![0]);
        assert!(scan
            .trace
            .contains(&"[transactions_v3] falling back to transactions_v2".to_string()));
    }

    #[tokio::test]
    async fn test_no_fallback_after_pages_were_counted() {
        let source = ScriptedSource::new()
            .respond(
                &eth(),
                Endpoint::TransactionsV3,
                page(vec![Item::with_value(dec!(15))], true),
            )
            .respond(&eth(), Endpoint::TransactionsV3, Err(FetchError::BadRequest))
            .respond(
                &eth(),
                Endpoint::TransactionsV2,
                page(vec![Item::with_value(dec!(999))], false),
            );
        let engine = engine(source);

        let scan = engine
            .scan(&eth(), "0xabc", EndpointKind::Transactions, &generous(), 5)
            .await;

        assert_eq!(scan.volume, dec!(15));
        assert!(engine.source().calls_to(Endpoint::TransactionsV2).is_empty());
    }

    #[tokio::test]
    async fn test_solana_transfers_issue_no_request() {
        let engine = engine(ScriptedSource::new());

        let scan = engine
            .scan(&ChainId::solana(), "So1ana", EndpointKind::Transfers, &generous(), 5)
            .await;

        assert_eq!(scan.volume, Decimal::ZERO);
        assert_eq!(scan.endpoint, None);
        assert!(engine.source().calls().is_empty());
    }

    #[test]
    fn test_tally_is_monotonic() {
        let pages = [
            vec![Item::with_transfers([dec!(4)])],
            vec![Item::default(), Item::default()],
            vec![Item::with_transfers([dec!(0.5), dec!(0.5)])],
        ];

        let mut tally = Tally::new(Endpoint::TransfersV2, ChainClass::Evm);
        let mut previous = (Decimal::ZERO, 0u64);
        for (number, items) in pages.into_iter().enumerate() {
            tally = tally.absorb(PageStep::Fetched(Page {
                number: number as u32,
                items,
                has_more: true,
            }));
            assert!(tally.volume >= previous.0);
            assert!(tally.tx_count >= previous.1);
            previous = (tally.volume, tally.tx_count);
        }

        assert_eq!(previous, (dec!(5), 4));
    }

    #[tokio::test]
    async fn test_huge_quotes_saturate_instead_of_panicking() {
        let huge = Decimal::from_i128_with_scale(5 * 10_i128.pow(28), 0);
        let source = ScriptedSource::new()
            .respond(
                &eth(),
                Endpoint::TransfersV2,
                page(vec![Item::with_transfers([huge, huge])], true),
            )
            .respond(
                &eth(),
                Endpoint::TransfersV2,
                page(vec![Item::with_transfers([huge])], false),
            );
        let engine = engine(source);

        let scan = engine
            .scan(&eth(), "0xspam", EndpointKind::Transfers, &generous(), 5)
            .await;

        assert_eq!(scan.volume, Decimal::MAX);
        assert_eq!(scan.tx_count, 2);
        assert_eq!(scan.stop, StopReason::NoMorePages);
    }
}
