//! Domain models shared across the admin core.
//!
//! - [`CellValue`] - typed spreadsheet cell
//! - [`ImportRecord`] - one ingested spreadsheet row
//! - [`UploadDestination`] - storage folder of an uploaded image
//! - [`Page`] / [`PageMeta`] - paginated listing responses
//! - [`UserRow`] / [`BookRow`] - rows of the two listing screens

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Cell values
// =============================================================================

/// A non-blank spreadsheet cell.
///
/// Serialized untagged, so records go over the wire as plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

// =============================================================================
// Import records
// =============================================================================

/// One data row extracted from a spreadsheet.
///
/// Keys come from the header row of the row's own sheet. Blank cells are
/// absent rather than defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    /// 1-based position of the row in its sheet (the header is row 1).
    pub row_number: u32,
    pub fields: BTreeMap<String, CellValue>,
}

impl ImportRecord {
    pub fn new(row_number: u32) -> Self {
        Self {
            row_number,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style insert, mostly for tests and fixtures.
    pub fn with(mut self, field: &str, value: impl Into<CellValue>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.fields.get(field)
    }

    /// A copy of this record with `field` set to `value`, replacing any existing value.
    pub fn with_field(&self, field: &str, value: CellValue) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(field.to_string(), value);
        Self {
            row_number: self.row_number,
            fields,
        }
    }
}

// =============================================================================
// Upload destination
// =============================================================================

/// Storage folder an uploaded image is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadDestination {
    Book,
    Avatar,
}

impl UploadDestination {
    /// Folder tag sent to the upload endpoint.
    pub fn folder(&self) -> &'static str {
        match self {
            UploadDestination::Book => "book",
            UploadDestination::Avatar => "avatar",
        }
    }

    /// Display URL of a stored file: `<base>/images/<folder>/<name>`.
    pub fn remote_url(&self, base_url: &str, stored_name: &str) -> String {
        format!(
            "{}/images/{}/{}",
            base_url.trim_end_matches('/'),
            self.folder(),
            stored_name
        )
    }
}

impl fmt::Display for UploadDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder())
    }
}

impl std::str::FromStr for UploadDestination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "book" => Ok(UploadDestination::Book),
            "avatar" => Ok(UploadDestination::Avatar),
            other => Err(format!("unknown upload destination '{}'", other)),
        }
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Pagination metadata returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub current: u32,
    pub page_size: u32,
    pub pages: u32,
    pub total: u64,
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub meta: PageMeta,
    #[serde(default = "Vec::new")]
    pub result: Vec<T>,
}

// =============================================================================
// Listing rows
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    #[serde(rename = "_id")]
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRow {
    #[serde(rename = "_id")]
    pub id: String,
    pub main_text: String,
    pub author: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub slider: Vec<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub sold: u64,
    #[serde(default)]
    pub quantity: u64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_url_template() {
        assert_eq!(
            UploadDestination::Book.remote_url("http://localhost:8080/", "cover-1.png"),
            "http://localhost:8080/images/book/cover-1.png"
        );
        assert_eq!(
            UploadDestination::Avatar.remote_url("http://h", "me.jpg"),
            "http://h/images/avatar/me.jpg"
        );
    }

    #[test]
    fn test_destination_from_str() {
        assert_eq!("Book".parse::<UploadDestination>(), Ok(UploadDestination::Book));
        assert!("books".parse::<UploadDestination>().is_err());
    }

    #[test]
    fn test_with_field_produces_new_record() {
        let original = ImportRecord::new(2).with("email", "a@x.com");
        let updated = original.with_field("password", CellValue::from("123456"));

        assert!(original.get("password").is_none());
        assert_eq!(updated.get("password"), Some(&CellValue::from("123456")));
        assert_eq!(updated.row_number, 2);
    }

    #[test]
    fn test_cell_values_serialize_as_scalars() {
        let record = ImportRecord::new(2)
            .with("email", "a@x.com")
            .with("phone", 912345678i64);
        let json = serde_json::to_value(&record.fields).unwrap();
        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["phone"], 912345678);
    }

    #[test]
    fn test_page_deserialization() {
        let json = r#"{
            "meta": { "current": 2, "pageSize": 5, "pages": 3, "total": 12 },
            "result": [
                { "_id": "u1", "fullName": "Alice", "email": "a@x.com", "createdAt": "2024-01-02T00:00:00.000Z" }
            ]
        }"#;
        let page: Page<UserRow> = serde_json::from_str(json).unwrap();
        assert_eq!(page.meta.total, 12);
        assert_eq!(page.result[0].full_name, "Alice");
        assert!(page.result[0].phone.is_none());
    }
}
