use crate::{
    scanner::{EndpointScan, StopReason},
    source::PageSource,
    types::{ChainId, Deadline, EndpointKind, ScanResult},
    VolumeEngine,
};
use tracing::info;

impl<S: PageSource> VolumeEngine<S> {
    /// Scan a (chain, address) pair with the engine's own deadline and page cap
    pub async fn scan_pair(&self, chain: &ChainId, address: &str) -> ScanResult {
        let deadline = Deadline::start(self.settings.deadline);
        info!(
            "🔍 Starting volume scan for chain {} - {} (budget {}ms, {} pages max)",
            chain,
            address,
            deadline.budget().as_millis(),
            self.settings.max_pages
        );

        let result = self
            .reconcile(chain, address, &deadline, self.settings.max_pages)
            .await;

        info!(
            "✅ Scan complete for chain {}: {} transactions, ${:.2} in {}ms",
            chain,
            result.tx_count,
            result.volume,
            deadline.elapsed().as_millis()
        );
        result
    }

    /// Run the transfers and transactions scans concurrently against one
    /// deadline and merge them into a single best-effort result.
    ///
    /// Never fails; an early stop in one branch leaves the other running.
    pub async fn reconcile(
        &self,
        chain: &ChainId,
        address: &str,
        deadline: &Deadline,
        max_pages: u32,
    ) -> ScanResult {
        let (transfers, transactions) = tokio::join!(
            self.scan(chain, address, EndpointKind::Transfers, deadline, max_pages),
            self.scan(chain, address, EndpointKind::Transactions, deadline, max_pages),
        );

        merge(transfers, transactions)
    }
}

/// Combine the two endpoint kinds of one pair.
///
/// Volume and transaction count are each the larger of the two branches,
/// never their sum. This is an approximation: it undercounts wallets whose
/// value is genuinely disjoint across the two endpoints. Transfers trace
/// lines always precede transactions lines.
pub fn merge(transfers: EndpointScan, transactions: EndpointScan) -> ScanResult {
    let aborted = [&transfers.stop, &transactions.stop]
        .into_iter()
        .find_map(|stop| match stop {
            StopReason::Aborted(message) => Some(message.clone()),
            _ => None,
        });

    let volume = transfers.volume.max(transactions.volume);
    let tx_count = transfers.tx_count.max(transactions.tx_count);
    let summary = format!(
        "merged: transfers ${:.2} / {} txs, transactions ${:.2} / {} txs -> ${:.2} / {} txs",
        transfers.volume, transfers.tx_count, transactions.volume, transactions.tx_count, volume, tx_count
    );

    let mut trace = transfers.trace;
    trace.extend(transactions.trace);

    if let Some(message) = aborted {
        return ScanResult::failed(message, trace);
    }

    trace.push(summary);
    ScanResult {
        volume,
        tx_count,
        trace,
        error: None,
    }
}
