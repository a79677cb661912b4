use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Declares a string-backed enum that round-trips through JSON and SQLite
/// using the same text for each variant.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant,)+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("Unknown {} value: {other}", stringify!($name))),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: String| FromSqlError::Other(e.into()))
            }
        }
    };
}

text_enum!(Role {
    User => "user",
    Admin => "admin",
});

text_enum!(
    /// Loyalty tier label, derived from points.
    Badge {
        Bronze => "Bronze",
        Silver => "Silver",
        Gold => "Gold",
    }
);

text_enum!(OrderStatus {
    Pending => "Pending",
    Cooking => "Cooking",
    Ready => "Ready",
    Completed => "Completed",
    Cancelled => "Cancelled",
});

text_enum!(PaymentMethod {
    Wallet => "Wallet",
    PayAtCounter => "PayAtCounter",
    PayLater => "Pay Later",
});

text_enum!(TransactionKind {
    Credit => "Credit",
    Debit => "Debit",
    DebitOnCredit => "Debit (Credit)",
});

text_enum!(AnnouncementKind {
    Info => "info",
    Warning => "warning",
    Offer => "offer",
});

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// The single forward step the kitchen may take from this status.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Cooking),
            OrderStatus::Cooking => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::Cancelled => None,
        }
    }
}

impl PaymentMethod {
    /// Whether placing an order with this method moves money out of the wallet.
    pub fn debits_wallet(&self) -> bool {
        matches!(self, PaymentMethod::Wallet | PaymentMethod::PayLater)
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Wallet
    }
}

impl Default for AnnouncementKind {
    fn default() -> Self {
        AnnouncementKind::Info
    }
}

// ===== USERS =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Preferences {
    pub diet: String,
    pub allergies: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            diet: "None".to_string(),
            allergies: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Loyalty {
    pub points: i64,
    pub total_spent: f64,
    pub badge: Badge,
    pub birthday: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub wallet: f64,
    pub preferences: Preferences,
    pub loyalty: Loyalty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub id: String,
    pub pass: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterUser {
    pub id: String,
    pub name: String,
    pub pass: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BirthdayUpdate {
    pub birthday: Option<String>,
}

// ===== MENU =====

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub dietary: String,
    pub image: String,
    pub description: Option<String>,
    pub calories: Option<i64>,
    pub protein: Option<String>,
    pub allergens: Vec<String>,
    pub tags: Vec<String>,
    pub stock: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewItem {
    /// Only honoured when seeding the menu.
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub dietary: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub calories: Option<i64>,
    #[serde(default)]
    pub protein: Option<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub stock: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub dietary: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub calories: Option<i64>,
    pub protein: Option<String>,
    pub allergens: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub stock: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ItemFilter {
    pub category: Option<String>,
    pub dietary: Option<String>,
    pub q: Option<String>,
}

// ===== ORDERS =====

/// An item as it was priced when the order was placed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrderLine {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub qty: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub user_id: String,
    pub items: Vec<OrderLine>,
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
    pub status: OrderStatus,
    pub otp: String,
    pub payment_method: PaymentMethod,
    pub payment_collected: bool,
    pub pickup_time: String,
    pub is_rated: bool,
    pub date: String,
}

/// A cart line sent by the client. Extra fields (name, price...) are ignored;
/// prices always come from the menu.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CartLine {
    pub id: i64,
    pub qty: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub user_id: String,
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub pickup_time: Option<String>,
    /// Total the client computed, if any. Only used for diagnostics.
    #[serde(default)]
    pub total: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OtpCheck {
    pub otp: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub requested_by: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentUpdate {
    pub collected: bool,
}

/// Who is asking for an order to be cancelled.
#[derive(Debug, Clone, PartialEq)]
pub enum Requester {
    Admin,
    User(String),
}

// ===== WALLET =====

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    #[serde(rename = "desc")]
    pub description: String,
    pub date: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TopUp {
    pub amount: f64,
}

// ===== FEEDBACK =====

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub order_id: i64,
    pub user_id: String,
    pub user_name: Option<String>,
    pub rating: i64,
    pub suggestion: Option<String>,
    pub date: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub user_id: String,
    pub rating: i64,
    #[serde(default)]
    pub suggestion: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Announcement {
    pub id: i64,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AnnouncementKind,
    pub date: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewAnnouncement {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: AnnouncementKind,
}

// ===== REPORTS =====

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ItemSales {
    pub item_id: i64,
    pub name: String,
    pub quantity: i64,
    pub revenue: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: String,
    pub total_revenue: f64,
    pub total_orders: i64,
    pub by_status: Vec<StatusCount>,
    pub top_items: Vec<ItemSales>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alerts {
    pub low_stock: Vec<Item>,
    pub delayed_orders: Vec<Order>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_method_uses_client_spelling() {
        let method: PaymentMethod = serde_json::from_str("\"Pay Later\"").unwrap();
        assert_eq!(method, PaymentMethod::PayLater);
        assert_eq!(
            serde_json::to_string(&PaymentMethod::PayAtCounter).unwrap(),
            "\"PayAtCounter\""
        );
        assert!("Card".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn order_status_steps_forward_only() {
        assert_eq!(OrderStatus::Pending.next(), Some(OrderStatus::Cooking));
        assert_eq!(OrderStatus::Ready.next(), Some(OrderStatus::Completed));
        assert_eq!(OrderStatus::Cancelled.next(), None);
        assert!(OrderStatus::Completed.is_terminal());
        assert!(!OrderStatus::Ready.is_terminal());
    }

    #[test]
    fn cart_line_ignores_client_price() {
        let line: CartLine =
            serde_json::from_str(r#"{"id": 3, "name": "Cold Coffee", "price": 1, "qty": 2}"#)
                .unwrap();
        assert_eq!(line.id, 3);
        assert_eq!(line.qty, 2);
    }

    #[test]
    fn transaction_serializes_with_client_field_names() {
        let tx = Transaction {
            id: 1,
            user_id: "student".to_string(),
            kind: TransactionKind::DebitOnCredit,
            amount: 40.0,
            description: "Order Payment".to_string(),
            date: "2026-01-01 10:00:00".to_string(),
        };
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["type"], "Debit (Credit)");
        assert_eq!(value["desc"], "Order Payment");
        assert_eq!(value["userId"], "student");
    }
}
