// Domain and wire types for offers, inventory, email and chat

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Offer lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum OfferStatus {
    #[default]
    Pending,
    Accepted,
    Done,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Pending => "Pending",
            OfferStatus::Accepted => "Accepted",
            OfferStatus::Done => "Done",
        }
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OfferStatus::Pending),
            "Accepted" => Ok(OfferStatus::Accepted),
            "Done" => Ok(OfferStatus::Done),
            other => Err(format!("unknown offer status: {}", other)),
        }
    }
}

/// One line of a bill of materials, as written by the model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Material {
    /// Category, e.g. "Flooring"
    pub category: String,
    /// Material name
    pub material: String,
    /// Price for this line, as text
    pub price: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Unit of measure, e.g. "m2", "pcs"
    #[serde(default)]
    pub unit: String,
    /// Quantity, as text
    pub quantity: String,
}

/// Price breakdown (JSON keys are capitalized)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PriceDetail {
    /// Materials cost
    #[serde(rename = "Materials")]
    pub materials: f64,
    /// Labor cost
    #[serde(rename = "Labor")]
    pub labor: f64,
    /// Materials plus labor
    #[serde(rename = "Total")]
    pub total: f64,
}

// A quotation for one customer project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub customer_name: String,
    pub phone_number: String,
    pub address: String,
    #[serde(default)]
    pub customer_email: String,
    pub task_description: String,
    pub bill_of_materials: Vec<Material>,
    pub time: String,
    // Assigned worker
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub status: OfferStatus,
    pub price: PriceDetail,
    pub project_start: NaiveDate,
    #[serde(default)]
    pub materials_ordered: bool,
}

// A persisted offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferRecord {
    pub id: Uuid,
    pub user_id: String,
    #[serde(flatten)]
    pub offer: Offer,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Offer as returned by read endpoints
#[derive(Debug, Clone, Serialize)]
pub struct OfferView {
    #[serde(flatten)]
    pub record: OfferRecord,
    pub bill_of_materials_string: String,
}

impl From<OfferRecord> for OfferView {
    fn from(record: OfferRecord) -> Self {
        let bill_of_materials_string = bill_of_materials_string(&record.offer.bill_of_materials);
        Self {
            record,
            bill_of_materials_string,
        }
    }
}

/// Render a bill of materials as numbered plain text
///
/// ```text
/// 1. Ceramic tile
///    Category: Flooring
///    Quantity: 12 m2
///    Price: 240
///    Description: White glazed
/// ```
pub fn bill_of_materials_string(materials: &[Material]) -> String {
    let mut out = String::new();
    for (idx, m) in materials.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}\n   Category: {}\n   Quantity: {} {}\n   Price: {}\n   Description: {}\n\n",
            idx + 1,
            m.material,
            m.category,
            m.quantity,
            m.unit,
            m.price,
            m.description
        ));
    }
    out.trim().to_string()
}

// Request Types

#[derive(Debug, Clone, Deserialize)]
pub struct OfferRequest {
    pub customer_name: String,
    pub phone_number: String,
    pub address: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
    pub project_start: NaiveDate,
    pub select_task: String,
    // Wire name keeps the historical spelling
    #[serde(rename = "explaination", alias = "explanation")]
    pub explanation: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveOfferRequest {
    pub offer_id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub offer: Offer,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOfferRequest {
    pub offer_id: String,
    pub user_message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub offer_id: String,
    pub status: OfferStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialsOrderedQuery {
    pub offer_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OffersByUserQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OffersByDateQuery {
    pub user_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfferSearchQuery {
    pub user_id: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

fn default_true() -> bool {
    true
}

// Inventory

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub default_price: f64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInventoryItem {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    pub default_price: f64,
    #[serde(default = "default_true")]
    pub active: bool,
}

// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryItemUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub default_price: Option<f64>,
    pub active: Option<bool>,
}

impl InventoryItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.brand.is_none()
            && self.default_price.is_none()
            && self.active.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryFilter {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub active: Option<bool>,
    pub category: Option<String>,
}

impl Default for InventoryFilter {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
            active: None,
            category: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryCountQuery {
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventorySearchQuery {
    pub query: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

// Supply chain directory

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    pub supplier_name: String,
    pub supplier_email: String,
}

// Email

/// Generated email for a customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EmailContent {
    /// Name of the customer
    pub customer_name: String,
    /// Email subject line
    pub email_subject: String,
    /// Email body content
    pub email_body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailRequest {
    pub offer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

// AI output

/// Offer content produced by the model; customer details are merged in afterwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedOfferContent {
    /// Detailed description of the work to be done
    pub task_description: String,
    /// Every material needed, with price, unit and quantity
    pub bill_of_materials: Vec<Material>,
    /// Estimated completion time, e.g. "3 days"
    pub time: String,
    /// Price breakdown
    pub price: PriceDetail,
    /// Project start date (YYYY-MM-DD)
    #[serde(default)]
    pub project_start: Option<NaiveDate>,
    /// Offer status
    #[serde(default)]
    pub status: Option<OfferStatus>,
    /// Whether materials have been ordered
    #[serde(default)]
    pub materials_ordered: Option<bool>,
}

// Chat

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerInfo {
    pub customer_name: String,
    pub phone_number: String,
    pub address: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    #[serde(default)]
    pub customer_info: Option<CustomerInfo>,
    #[serde(default)]
    pub project_start: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatReply {
    Message { message: String },
    Offer { offer: Offer },
}
