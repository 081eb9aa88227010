use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "refunded" => Ok(OrderStatus::Refunded),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }
}

/// Kind of ticket a product grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketType {
    Study,
    Games,
}

impl TicketType {
    /// Ledger deltas `(study, games)` for a pack of `pack_size` tickets
    pub fn ledger_deltas(&self, pack_size: i32) -> (i32, i32) {
        match self {
            TicketType::Study => (pack_size, 0),
            TicketType::Games => (0, pack_size),
        }
    }
}

impl FromStr for TicketType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "study" => Ok(TicketType::Study),
            "games" => Ok(TicketType::Games),
            _ => Err(format!("Invalid ticket type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub ticket_type: String,
    pub pack_size: i32,
    pub price_twd: i32,
    pub title: String,
    pub is_active: bool,
}

/// Ticket pack order paid through ECPay
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub merchant_trade_no: String,
    pub ticket_type_snapshot: String,
    pub pack_size_snapshot: i32,
    pub title_snapshot: String,
    pub price_snapshot_twd: i32,
    pub total_amount: i32,
    pub currency: String,
    pub status: String,
    #[serde(skip_serializing, default)]
    pub checkout_token_hash: Option<String>,
    pub checkout_token_expires_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn status_enum(&self) -> OrderStatus {
        self.status.parse().unwrap_or(OrderStatus::Pending)
    }

    /// A pending order whose checkout token has not expired at `now`
    pub fn is_payable_at(&self, now: DateTime<Utc>) -> bool {
        self.status_enum() == OrderStatus::Pending
            && self.checkout_token_expires_at.map_or(true, |expires| expires >= now)
    }

    /// Merchant trade number derived from an order id: first 20 hex digits
    pub fn merchant_trade_no_for(order_id: Uuid) -> String {
        order_id.simple().to_string().chars().take(20).collect()
    }
}

/// Raw payment notification from ECPay, one per order
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EcpayPayment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub trade_no: Option<String>,
    pub rtn_code: Option<i32>,
    pub rtn_msg: Option<String>,
    pub trade_amt: Option<i32>,
    pub paid_at: Option<DateTime<Utc>>,
    pub check_mac_value: Option<String>,
    pub raw: Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn order(status: &str, expires_at: Option<DateTime<Utc>>) -> Order {
        let id = Uuid::new_v4();
        Order {
            id,
            user_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            merchant_trade_no: Order::merchant_trade_no_for(id),
            ticket_type_snapshot: "study".into(),
            pack_size_snapshot: 3,
            title_snapshot: "Study x3".into(),
            price_snapshot_twd: 300,
            total_amount: 300,
            currency: "TWD".into(),
            status: status.into(),
            checkout_token_hash: None,
            checkout_token_expires_at: expires_at,
            paid_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_merchant_trade_no_is_twenty_hex_chars() {
        let id = Uuid::parse_str("1b4e28ba-2fa1-11d2-883f-0016d3cca427").unwrap();
        let no = Order::merchant_trade_no_for(id);
        assert_eq!(no, "1b4e28ba2fa111d2883f");
        assert_eq!(no.len(), 20);
    }

    #[test]
    fn test_payable_requires_pending_and_unexpired() {
        let now = Utc::now();
        assert!(order("pending", Some(now + Duration::minutes(5))).is_payable_at(now));
        assert!(order("pending", None).is_payable_at(now));
        assert!(!order("pending", Some(now - Duration::seconds(1))).is_payable_at(now));
        assert!(!order("paid", Some(now + Duration::minutes(5))).is_payable_at(now));
    }

    #[test]
    fn test_ledger_deltas_follow_ticket_type() {
        assert_eq!(TicketType::Study.ledger_deltas(5), (5, 0));
        assert_eq!(TicketType::Games.ledger_deltas(2), (0, 2));
    }
}
