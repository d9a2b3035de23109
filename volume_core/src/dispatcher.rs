use crate::{
    accumulator::saturating_sum,
    source::PageSource,
    types::{ChainId, ScanResult},
    VolumeEngine,
};
use futures::future::join_all;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

impl<S: PageSource> VolumeEngine<S> {
    /// Scan one wallet over many chains concurrently.
    ///
    /// Each chain gets its own deadline and contributes exactly one entry,
    /// zeroed on failure. Duplicate chain ids collapse into one scan.
    pub async fn scan_wallet(
        &self,
        address: &str,
        chain_ids: &[ChainId],
    ) -> BTreeMap<ChainId, ScanResult> {
        let chains: BTreeSet<&ChainId> = chain_ids.iter().collect();
        info!(
            "🌐 Scanning wallet {} across {} chains",
            address,
            chains.len()
        );

        let scans = chains.into_iter().map(|chain| async move {
            let result = self.scan_pair(chain, address).await;
            (chain.clone(), result)
        });

        let results: BTreeMap<ChainId, ScanResult> = join_all(scans).await.into_iter().collect();

        info!(
            "📊 Wallet {} total volume ${:.2} across {} chains",
            address,
            total_volume(&results),
            results.len()
        );
        results
    }
}

/// Sum of per-chain volumes, saturating at `Decimal::MAX`
pub fn total_volume(results: &BTreeMap<ChainId, ScanResult>) -> Decimal {
    saturating_sum(results.values().map(|result| result.volume))
}
