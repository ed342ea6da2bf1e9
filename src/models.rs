use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Monetary value as it arrives from a record store.
///
/// Stores are not strict about this field, so anything that is not a finite,
/// non-negative number (or a string holding one) counts as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl Default for Amount {
    fn default() -> Self {
        Self::Other(serde_json::Value::Null)
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl Amount {
    pub fn value(&self) -> f64 {
        let raw = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            Self::Other(_) => 0.0,
        };

        if raw.is_finite() && raw > 0.0 {
            raw
        } else {
            0.0
        }
    }
}

/// One sales opportunity tracked through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub contact_id: Option<i64>,
    #[serde(default)]
    pub value: Amount,
    #[serde(default)]
    pub expected_close_date: Option<NaiveDate>,
    /// Raw stage identifier. Values outside the stage registry are kept but
    /// never shown on the board.
    pub stage: String,
    #[serde(default)]
    pub probability: u8,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stage_changed_at: Option<DateTime<Utc>>,
}

impl Deal {
    /// Timestamp of the deal's last move, falling back to its last update.
    pub fn status_timestamp(&self) -> Option<DateTime<Utc>> {
        self.stage_changed_at.or(self.updated_at)
    }

    /// Move the deal to `stage` as of `now`.
    ///
    /// The stage-change timestamp only moves when the stage does, and is never
    /// placed before the creation time.
    pub fn set_stage(&mut self, stage: &str, now: DateTime<Utc>) {
        if self.stage != stage {
            self.stage = stage.to_string();
            let changed_at = self.created_at.map_or(now, |created| created.max(now));
            self.stage_changed_at = Some(changed_at);
        }
        self.updated_at = Some(now);
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::{Amount, Deal};

    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    pub fn deal(id: i64, stage: &str, value: f64) -> Deal {
        Deal {
            id,
            title: format!("Deal {id}"),
            company: "Acme Corp".to_string(),
            contact_id: Some(1),
            value: Amount::from(value),
            expected_close_date: None,
            stage: stage.to_string(),
            probability: 50,
            description: String::new(),
            created_at: Some(epoch()),
            updated_at: Some(epoch()),
            stage_changed_at: None,
        }
    }

    /// A deal that moved into its current stage `days` days after creation.
    pub fn aged_deal(id: i64, stage: &str, days: i64) -> Deal {
        let mut d = deal(id, stage, 1_000.0);
        d.stage_changed_at = Some(epoch() + Duration::days(days));
        d
    }
}
