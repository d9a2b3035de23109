use crate::types::{ChainClass, EndpointKind, Item};
use rust_decimal::Decimal;

/// USD volume contributed by one page of items.
///
/// Pure and deterministic: calling it twice on the same page yields the same
/// value. Missing quotes count as zero and signed quotes count by magnitude,
/// so the result is never negative. Sums saturate at `Decimal::MAX`.
pub fn page_volume(items: &[Item], kind: EndpointKind, class: ChainClass) -> Decimal {
    saturating_sum(items.iter().map(|item| item_volume(item, kind, class)))
}

/// Volume of a single item under the extraction rule for its endpoint shape
pub fn item_volume(item: &Item, kind: EndpointKind, class: ChainClass) -> Decimal {
    match (class, kind) {
        // Solana items look the same on every endpoint: native value plus fee
        (ChainClass::Solana, _) => {
            quote(item.value_quote).saturating_add(quote(item.fee_quote))
        }
        (ChainClass::Evm, EndpointKind::Transfers) => {
            saturating_sum(item.transfer_quotes.iter().copied().map(quote))
        }
        (ChainClass::Evm, EndpointKind::Transactions) => quote(item.value_quote),
    }
}

/// Sum that pins at `Decimal::MAX` instead of overflowing
pub fn saturating_sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values
        .into_iter()
        .fold(Decimal::ZERO, |total, value| total.saturating_add(value))
}

fn quote(value: Option<Decimal>) -> Decimal {
    value.map(|v| v.abs()).unwrap_or(Decimal::ZERO)
}
