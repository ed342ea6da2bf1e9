use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Amount, Deal};

pub const DEAL_TABLE: &str = "deal_c";

pub const DEAL_FIELDS: [&str; 12] = [
    "Id",
    "title_c",
    "company_c",
    "contact_id_c",
    "value_c",
    "expected_close_date_c",
    "status_c",
    "probability_c",
    "description_c",
    "last_status_change_c",
    "CreatedOn",
    "ModifiedOn",
];

#[derive(Debug, Serialize)]
pub struct FieldSpec {
    pub field: FieldName,
}

#[derive(Debug, Serialize)]
pub struct FieldName {
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct OrderBy {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    pub sorttype: String,
}

#[derive(Debug, Serialize)]
pub struct PagingInfo {
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Serialize)]
pub struct Condition {
    #[serde(rename = "FieldName")]
    pub field_name: String,
    #[serde(rename = "Operator")]
    pub operator: String,
    #[serde(rename = "Values")]
    pub values: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct FetchRequest {
    pub fields: Vec<FieldSpec>,
    #[serde(rename = "where", skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(rename = "orderBy")]
    pub order_by: Vec<OrderBy>,
    #[serde(rename = "pagingInfo")]
    pub paging_info: PagingInfo,
}

impl FetchRequest {
    /// Page of records in insertion order.
    pub fn page(fields: &[&str], limit: usize, offset: usize) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|name| FieldSpec {
                    field: FieldName {
                        name: (*name).to_string(),
                    },
                })
                .collect(),
            order_by: vec![OrderBy {
                field_name: "Id".to_string(),
                sorttype: "ASC".to_string(),
            }],
            conditions: Vec::new(),
            paging_info: PagingInfo { limit, offset },
        }
    }

    /// The single record whose `Id` equals `id`.
    pub fn by_id(fields: &[&str], id: i64) -> Self {
        let mut request = Self::page(fields, 1, 0);
        request.conditions.push(Condition {
            field_name: "Id".to_string(),
            operator: "EqualTo".to_string(),
            values: vec![id.into()],
        });
        request
    }
}

#[derive(Debug, Deserialize)]
pub struct FetchResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<Vec<T>>,
}

#[derive(Debug, Serialize)]
pub struct UpdateRequest<T> {
    pub records: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<RecordResult<T>>,
}

#[derive(Debug, Deserialize)]
pub struct RecordResult<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

impl<T> RecordResult<T> {
    /// All messages attached to a failed record, joined for display.
    pub fn failure_message(&self) -> String {
        let mut parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| match (&e.field_label, &e.message) {
                (Some(label), Some(msg)) => format!("{label}: {msg}"),
                (None, Some(msg)) => msg.clone(),
                (Some(label), None) => label.clone(),
                (None, None) => String::new(),
            })
            .filter(|s| !s.is_empty())
            .collect();

        if let Some(message) = &self.message {
            parts.push(message.clone());
        }

        if parts.is_empty() {
            "record was rejected".to_string()
        } else {
            parts.join("; ")
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FieldError {
    #[serde(rename = "fieldLabel", default)]
    pub field_label: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Deal row as the record service names its fields.
#[derive(Debug, Deserialize)]
pub struct DealRecord {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(default)]
    pub title_c: Option<String>,
    #[serde(default)]
    pub company_c: Option<String>,
    /// Either a bare id or a lookup object carrying one.
    #[serde(default)]
    pub contact_id_c: Option<serde_json::Value>,
    #[serde(default)]
    pub value_c: Amount,
    #[serde(default)]
    pub expected_close_date_c: Option<String>,
    #[serde(default)]
    pub status_c: Option<String>,
    #[serde(default)]
    pub probability_c: Option<f64>,
    #[serde(default)]
    pub description_c: Option<String>,
    #[serde(default)]
    pub last_status_change_c: Option<String>,
    #[serde(rename = "CreatedOn", default)]
    pub created_on: Option<String>,
    #[serde(rename = "ModifiedOn", default)]
    pub modified_on: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StageUpdate {
    #[serde(rename = "Id")]
    pub id: i64,
    pub status_c: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_status_change_c: Option<String>,
}

impl StageUpdate {
    /// Patch moving `current` to `stage`.
    ///
    /// The change timestamp is only sent when the stage really changes, and
    /// never earlier than the record's creation.
    pub fn new(current: &Deal, stage: &str, now: DateTime<Utc>) -> Self {
        let mut moved = current.clone();
        moved.set_stage(stage, now);

        let last_status_change_c = (current.stage != stage)
            .then_some(moved.stage_changed_at)
            .flatten()
            .map(|t| t.to_rfc3339());

        Self {
            id: current.id,
            status_c: stage.to_string(),
            last_status_change_c,
        }
    }
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw?.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    raw.get(..10)
        .unwrap_or(raw)
        .parse::<NaiveDate>()
        .ok()
}

fn lookup_id(raw: Option<&serde_json::Value>) -> Option<i64> {
    match raw? {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Object(obj) => obj.get("Id").and_then(serde_json::Value::as_i64),
        _ => None,
    }
}

impl From<DealRecord> for Deal {
    fn from(record: DealRecord) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let probability = record
            .probability_c
            .filter(|p| p.is_finite())
            .map_or(0, |p| p.round().clamp(0.0, 100.0) as u8);

        Deal {
            id: record.id,
            title: record.title_c.unwrap_or_default(),
            company: record.company_c.unwrap_or_default(),
            contact_id: lookup_id(record.contact_id_c.as_ref()),
            value: record.value_c,
            expected_close_date: parse_date(record.expected_close_date_c.as_deref()),
            stage: record.status_c.unwrap_or_default(),
            probability,
            description: record.description_c.unwrap_or_default(),
            created_at: parse_timestamp(record.created_on.as_deref()),
            updated_at: parse_timestamp(record.modified_on.as_deref()),
            stage_changed_at: parse_timestamp(record.last_status_change_c.as_deref()),
        }
    }
}
