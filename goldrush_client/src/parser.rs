use crate::types::{PageData, TokenTransfer, WalletItem};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;
use volume_core::{Item, Page};

/// Treat an explicit `null` list like a missing one
pub(crate) fn deserialize_nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept a quote as a JSON number, a numeric string or null
pub(crate) fn deserialize_quote<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(quote_from_value(&value))
}

/// Best-effort USD quote from an arbitrary JSON value; anything unusable is `None`
pub fn quote_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => parse_decimal(&number.to_string())
            .or_else(|| number.as_f64().and_then(Decimal::from_f64)),
        Value::String(text) => parse_decimal(text.trim()),
        _ => None,
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// USD fee of a Solana item. Bare amounts are native units, not USD, and count as nothing.
pub fn fee_quote(fees_paid: Option<&Value>) -> Option<Decimal> {
    match fees_paid {
        Some(Value::Object(fields)) => fields.get("quote").and_then(quote_from_value),
        _ => None,
    }
}

/// Quote of one sub-transfer, preferring `quote` over `delta_quote`
pub fn transfer_quote(transfer: &TokenTransfer) -> Option<Decimal> {
    transfer.quote.or(transfer.delta_quote)
}

impl From<&WalletItem> for Item {
    fn from(item: &WalletItem) -> Self {
        Item {
            value_quote: item.value_quote,
            fee_quote: fee_quote(item.fees_paid.as_ref()),
            transfer_quotes: item.transfers.iter().map(transfer_quote).collect(),
        }
    }
}

/// Normalize a decoded `data` object into a page of items
pub fn normalize_page(data: &PageData, page_number: u32) -> Page {
    Page {
        number: page_number,
        items: data.items.iter().map(Item::from).collect(),
        has_more: data.has_more(),
    }
}
