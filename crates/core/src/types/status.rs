//! Order status taxonomy and the upstream status mapping.

use serde::{Deserialize, Serialize};

/// Local order status.
///
/// A closed vocabulary derived from Shopify's fulfillment and financial
/// statuses at ingestion time. The raw upstream strings are stored alongside
/// for audit; this enum is what the rest of the system reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Derive the local status from Shopify's fulfillment and financial
    /// status strings.
    ///
    /// Precedence: fulfillment status wins over financial status, and within
    /// each the first match below applies:
    ///
    /// | fulfillment   | financial  | result      |
    /// |---------------|------------|-------------|
    /// | `fulfilled`   | any        | `Delivered` |
    /// | `partial`     | any        | `Shipped`   |
    /// | `in_transit`  | any        | `Shipped`   |
    /// | other/none    | `paid`     | `Confirmed` |
    /// | other/none    | `pending`  | `Pending`   |
    /// | other/none    | `refunded` | `Cancelled` |
    /// | other/none    | other/none | `Pending`   |
    #[must_use]
    pub fn from_shopify(fulfillment: Option<&str>, financial: Option<&str>) -> Self {
        match fulfillment {
            Some("fulfilled") => Self::Delivered,
            Some("partial" | "in_transit") => Self::Shipped,
            _ => match financial {
                Some("paid") => Self::Confirmed,
                Some("refunded") => Self::Cancelled,
                // "pending" and anything unrecognized both land here
                _ => Self::Pending,
            },
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fulfilled_always_delivered() {
        for financial in [None, Some("paid"), Some("pending"), Some("refunded")] {
            assert_eq!(
                OrderStatus::from_shopify(Some("fulfilled"), financial),
                OrderStatus::Delivered
            );
        }
    }

    #[test]
    fn test_partial_and_in_transit_shipped() {
        for financial in [None, Some("paid"), Some("refunded")] {
            assert_eq!(
                OrderStatus::from_shopify(Some("partial"), financial),
                OrderStatus::Shipped
            );
            assert_eq!(
                OrderStatus::from_shopify(Some("in_transit"), financial),
                OrderStatus::Shipped
            );
        }
    }

    #[test]
    fn test_financial_fallbacks() {
        for fulfillment in [None, Some("restocked"), Some("")] {
            assert_eq!(
                OrderStatus::from_shopify(fulfillment, Some("paid")),
                OrderStatus::Confirmed
            );
            assert_eq!(
                OrderStatus::from_shopify(fulfillment, Some("pending")),
                OrderStatus::Pending
            );
            assert_eq!(
                OrderStatus::from_shopify(fulfillment, Some("refunded")),
                OrderStatus::Cancelled
            );
        }
    }

    #[test]
    fn test_unknown_everything_is_pending() {
        assert_eq!(
            OrderStatus::from_shopify(None, None),
            OrderStatus::Pending
        );
        assert_eq!(
            OrderStatus::from_shopify(Some("scheduled"), Some("voided")),
            OrderStatus::Pending
        );
    }

    #[test]
    fn test_display_from_str_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
        ] {
            let parsed: OrderStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"shipped\"");
    }
}
