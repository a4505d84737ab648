//! # Domain Types
//!
//! Core domain types used throughout Vantage POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Order      │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  lines[]        │◄──│  order_id (FK)  │       │
//! │  │  price_cents    │   │  status         │   │  method/status  │       │
//! │  │  stock_quantity │   │  total_cents    │   │  amount_cents   │       │
//! │  └─────────────────┘   │  version        │   │  refund?        │       │
//! │                        └────────┬────────┘   └─────────────────┘       │
//! │                                 │                                       │
//! │                        ┌────────▼────────┐                              │
//! │                        │    Customer     │                              │
//! │                        │  LoyaltyAccount │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Wire names for enums are SCREAMING_SNAKE_CASE (`"PENDING"`,
//! `"CREDIT_CARD"`) in JSON and in the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;
use crate::DEFAULT_LOW_STOCK_THRESHOLD;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1000 bps = 10%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::from_bps(crate::DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, copied onto order lines at reservation time.
    pub name: String,

    /// Stock Keeping Unit.
    pub sku: Option<String>,

    /// Price in cents.
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock_quantity: i64,

    /// At or below this level the product shows up in low-stock reports.
    pub low_stock_threshold: i64,

    /// Inactive products cannot be reserved.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates an active product with the default low-stock threshold.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Money, stock: i64) -> Self {
        let now = Utc::now();
        Product {
            id: id.into(),
            name: name.into(),
            sku: None,
            price_cents: price.cents(),
            stock_quantity: stock,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Stock is at or below the reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.low_stock_threshold
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// ```text
/// PENDING ──► PROCESSING ──► COMPLETED ──► REFUNDED
///    │             │
///    └─────────────┴──► CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Refunded => "REFUNDED",
        }
    }

    /// No further transitions are possible.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }

    /// The order still accepts new payments.
    pub const fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    /// Parses a wire status name. Case-insensitive, so `"cancelled"` works.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::InvalidStatus(s.to_string()))
    }
}

// =============================================================================
// Discount Kind
// =============================================================================

/// How an order-level discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum DiscountKind {
    /// Value is basis points of the subtotal (1000 = 10%).
    Percentage,
    /// Value is cents off the subtotal.
    Fixed,
    /// Value is loyalty points redeemed at one cent each.
    LoyaltyPoints,
}

// =============================================================================
// Order Line
// =============================================================================

/// A line item on an order.
/// Name and unit price are snapshots taken when stock was reserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product name at reservation time (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at reservation time (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// Line-level discount.
    pub discount_cents: i64,
    /// unit_price × quantity − discount.
    pub subtotal_cents: i64,
    /// Display order on the receipt.
    pub position: i64,
}

impl OrderLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A customer's purchase: lines, derived totals and a status.
///
/// `total_cents` is always derived by the pricing module and is never taken
/// from a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    /// Principal who created the order.
    pub cashier_id: Option<String>,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    pub subtotal_cents: i64,
    pub discount_kind: Option<DiscountKind>,
    /// Raw discount input (bps, cents or points depending on kind).
    pub discount_value: i64,
    /// Discount actually applied, in cents.
    pub discount_cents: i64,
    pub tax_rate_bps: u32,
    pub tax_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
    pub is_online: bool,
    pub shipping_address: Option<String>,
    pub loyalty_points_earned: i64,
    pub loyalty_points_redeemed: i64,
    pub notes: Option<String>,
    /// Optimistic concurrency counter, bumped on every update.
    pub version: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

// =============================================================================
// Payment Method / Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    MobilePayment,
    LoyaltyPoints,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::DebitCard => "DEBIT_CARD",
            PaymentMethod::MobilePayment => "MOBILE_PAYMENT",
            PaymentMethod::LoyaltyPoints => "LOYALTY_POINTS",
        }
    }

    pub const fn is_card(&self) -> bool {
        matches!(self, PaymentMethod::CreditCard | PaymentMethod::DebitCard)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment
// =============================================================================

/// Details carried by a refund record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RefundDetail {
    /// Shared by every record produced by one refund request ("REF-…").
    pub refund_id: String,
    /// The completed payment this portion was taken from.
    pub source_payment_id: String,
    pub refunded_cents: i64,
    pub reason: String,
    #[ts(as = "String")]
    pub refunded_at: DateTime<Utc>,
}

/// A payment or refund record. Records are append-only: a refund never
/// edits the payment it reverses, it adds a REFUNDED record with a negative
/// amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    /// Positive for payments, negative for refund records.
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Authorization code or gateway transaction id.
    pub reference: Option<String>,
    pub card_last4: Option<String>,
    pub card_brand: Option<String>,
    /// For cash: amount the customer handed over.
    pub tendered_cents: Option<i64>,
    /// For cash: change returned.
    pub change_cents: Option<i64>,
    pub refund: Option<RefundDetail>,
    /// Principal who recorded the payment.
    pub recorded_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    #[inline]
    pub fn is_refund(&self) -> bool {
        self.refund.is_some()
    }
}

// =============================================================================
// Customer & Loyalty
// =============================================================================

/// Loyalty tier. Ordered so `Platinum > Gold > Silver > Bronze`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Default for LoyaltyTier {
    fn default() -> Self {
        LoyaltyTier::Bronze
    }
}

/// Points balance and spend history embedded in a customer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoyaltyAccount {
    /// Never negative.
    pub points_balance: i64,
    pub tier: LoyaltyTier,
    pub lifetime_spend_cents: i64,
    pub visit_count: i64,
    #[ts(as = "Option<String>")]
    pub last_visit_at: Option<DateTime<Utc>>,
}

impl LoyaltyAccount {
    #[inline]
    pub fn lifetime_spend(&self) -> Money {
        Money::from_cents(self.lifetime_spend_cents)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub loyalty: LoyaltyAccount,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Creates an active customer with an empty loyalty account.
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Customer {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: None,
            loyalty: LoyaltyAccount::default(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Principal
// =============================================================================

/// Staff role supplied by the auth collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

impl Role {
    /// Admins and managers may refund, fail payments, adjust loyalty and stock.
    pub const fn is_elevated(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "MANAGER" => Ok(Role::Manager),
            "EMPLOYEE" => Ok(Role::Employee),
            _ => Err(crate::ValidationError::InvalidFormat {
                field: "role".to_string(),
                reason: format!("unknown role '{}'", s),
            }
            .into()),
        }
    }
}

/// The authenticated caller. Opaque to the core apart from stamping ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Principal { id: id.into(), role }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_parsing() {
        assert_eq!("PENDING".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert_eq!("cancelled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert_eq!(" Refunded ".parse::<OrderStatus>().unwrap(), OrderStatus::Refunded);

        let err = "SHIPPED".parse::<OrderStatus>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidStatus(s) if s == "SHIPPED"));
    }

    #[test]
    fn test_order_status_flags() {
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Refunded.is_terminal());
        assert!(!OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Processing.is_open());
        assert!(!OrderStatus::Completed.is_open());
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CreditCard).unwrap(),
            "\"CREDIT_CARD\""
        );
        assert_eq!(
            serde_json::from_str::<DiscountKind>("\"LOYALTY_POINTS\"").unwrap(),
            DiscountKind::LoyaltyPoints
        );
        assert_eq!(OrderStatus::Processing.to_string(), "PROCESSING");
    }

    #[test]
    fn test_low_stock() {
        let mut product = Product::new("p-1", "Widget", Money::from_cents(1000), 11);
        assert!(!product.is_low_stock());
        product.stock_quantity = 10;
        assert!(product.is_low_stock());
    }

    #[test]
    fn test_tier_ordering() {
        assert!(LoyaltyTier::Platinum > LoyaltyTier::Gold);
        assert!(LoyaltyTier::Silver > LoyaltyTier::Bronze);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("manager".parse::<Role>().unwrap(), Role::Manager);
        assert!("owner".parse::<Role>().is_err());
        assert!(Role::Admin.is_elevated());
        assert!(!Role::Employee.is_elevated());
    }

    #[test]
    fn test_product_serializes_camel_case() {
        let product = Product::new("p-1", "Widget", Money::from_cents(1000), 5);
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["priceCents"], 1000);
        assert_eq!(json["stockQuantity"], 5);
    }
}
