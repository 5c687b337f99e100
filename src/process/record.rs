use super::{
    currency::parse_currency,
    date_parser::{parse_date, CanonicalDate},
    fields::{self, FieldAliases},
};
use crate::decode::RawRow;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

/// Service type used when the sheet has none.
pub const DEFAULT_SERVICE_TYPE: &str = "Outros";

/// The columns of one service, normalised from a spreadsheet row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceFields {
    pub date: CanonicalDate,
    /// `None` while the service is still open.
    pub completion_date: Option<CanonicalDate>,
    #[serde(rename = "type")]
    pub service_type: String,
    pub value: f64,
    pub plate: String,
    pub model: String,
    pub owner: String,
    pub client: String,
    pub dispatcher: String,
}

/// A service ready for insertion, owned by the importing user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceRecord {
    #[serde(flatten)]
    pub fields: ServiceFields,
    pub user_id: String,
}

impl ServiceFields {
    pub fn owned_by(self, user_id: impl Into<String>) -> ServiceRecord {
        ServiceRecord {
            fields: self,
            user_id: user_id.into(),
        }
    }
}

/// Map one raw row onto the service columns. `today` stands in for a missing entry date.
pub fn normalize_row(row: &RawRow, today: NaiveDate) -> ServiceFields {
    let date = parse_date(fields::ENTRY_DATE.lookup(row))
        .unwrap_or_else(|| CanonicalDate::from_naive(today));
    let completion_date = parse_date(fields::COMPLETION_DATE.lookup(row));

    let value = parse_currency(fields::VALUE.lookup(row));
    if value < 0.0 {
        warn!(value, "negative service value imported as-is");
    }

    let service_type = text_field(row, &fields::SERVICE_TYPE);
    let service_type = if service_type.is_empty() {
        DEFAULT_SERVICE_TYPE.to_string()
    } else {
        service_type
    };

    ServiceFields {
        date,
        completion_date,
        service_type,
        value,
        plate: text_field(row, &fields::PLATE),
        model: text_field(row, &fields::MODEL),
        owner: text_field(row, &fields::OWNER),
        client: text_field(row, &fields::CLIENT),
        dispatcher: text_field(row, &fields::DISPATCHER),
    }
}

fn text_field(row: &RawRow, field: &FieldAliases) -> String {
    field.lookup(row).map(|c| c.as_text()).unwrap_or_default()
}
