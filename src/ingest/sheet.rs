//! Turns raw sheet cells into typed booking rows.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use regex::Regex;
use sea_orm::prelude::Decimal;
use serde_json::Value;

use crate::google::SheetValues;

/// Sheet column order, index 0 is column A.
pub const COLUMNS: [&str; 35] = [
    "booking_number",
    "status",
    "file_as",
    "first_name",
    "surname",
    "company",
    "region",
    "portal",
    "arrive_date",
    "depart_date",
    "room_number",
    "room_type",
    "deposit_required",
    "received_amount",
    "deposit_due",
    "deposit_by_date",
    "total_amount",
    "balance",
    "agent",
    "agent_ref",
    "email",
    "mobile",
    "car_rego",
    "guest_request",
    "enquiry_status",
    "primary_source",
    "black_list",
    "rate",
    "suburb",
    "post_code",
    "state",
    "room_status",
    "dual_key",
    "pre_auth_amount",
    "total_pre_auths",
];

const HEADER_INDICATORS: [&str; 6] = ["No.", "Status", "Name", "Surname", "Arrive", "Depart"];
const ERROR_CELL: &str = "#ERROR!";

/// A typed cell after normalisation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Date(Option<NaiveDate>),
    Money(Option<Decimal>),
    Flag(bool),
}

impl FieldValue {
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Date(d) => d.is_some(),
            FieldValue::Money(m) => m.is_some(),
            FieldValue::Flag(_) => true,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Date(d) => d.map_or(Value::Null, |d| Value::String(d.to_string())),
            FieldValue::Money(m) => m.map_or(Value::Null, |m| Value::String(m.to_string())),
            FieldValue::Flag(b) => Value::Bool(*b),
        }
    }

    pub fn into_db(self) -> sea_orm::Value {
        match self {
            FieldValue::Text(s) => s.into(),
            FieldValue::Date(d) => d.into(),
            FieldValue::Money(m) => m.into(),
            FieldValue::Flag(b) => b.into(),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Date(Some(d)) => write!(f, "{d}"),
            FieldValue::Money(Some(m)) => write!(f, "{m}"),
            FieldValue::Date(None) | FieldValue::Money(None) => f.write_str("None"),
            FieldValue::Flag(b) => write!(f, "{b}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingRow {
    pub booking_number: String,
    pub status: String,
    pub file_as: String,
    pub first_name: String,
    pub surname: String,
    pub company: String,
    pub region: String,
    pub portal: String,
    pub arrive_date: Option<NaiveDate>,
    pub depart_date: Option<NaiveDate>,
    pub room_number: String,
    pub room_type: String,
    pub deposit_required: Option<Decimal>,
    pub received_amount: Option<Decimal>,
    pub deposit_due: Option<Decimal>,
    pub deposit_by_date: Option<NaiveDate>,
    pub total_amount: Option<Decimal>,
    pub balance: Option<Decimal>,
    pub original_total: Option<Decimal>,
    pub agent: String,
    pub agent_ref: String,
    pub email: String,
    pub mobile: String,
    pub car_rego: String,
    pub guest_request: String,
    pub enquiry_status: String,
    pub primary_source: String,
    pub black_list: bool,
    pub rate: String,
    pub suburb: String,
    pub post_code: String,
    pub state: String,
    pub room_status: String,
    pub dual_key: String,
    pub pre_auth_amount: Option<Decimal>,
    pub total_pre_auths: Option<Decimal>,
}

impl BookingRow {
    /// Maps a raw sheet row by position. Missing trailing cells count as blank.
    pub fn from_cells(cells: &[Value]) -> Self {
        let cell = |i: usize| cells.get(i).unwrap_or(&Value::Null);
        let text = |i: usize| normalize_text(cell(i));

        let email = text(20);
        let email = if email.contains('@') { email.to_lowercase() } else { email };

        let total_amount = parse_decimal(cell(16));

        BookingRow {
            booking_number: text(0),
            status: text(1),
            file_as: text(2),
            first_name: text(3),
            surname: text(4),
            company: text(5),
            region: text(6),
            portal: text(7),
            arrive_date: parse_date(cell(8)),
            depart_date: parse_date(cell(9)),
            room_number: text(10),
            room_type: text(11),
            deposit_required: parse_decimal(cell(12)),
            received_amount: parse_decimal(cell(13)),
            deposit_due: parse_decimal(cell(14)),
            deposit_by_date: parse_date(cell(15)),
            total_amount,
            balance: parse_decimal(cell(17)),
            original_total: total_amount,
            agent: text(18),
            agent_ref: text(19),
            email,
            mobile: clean_mobile(&text(21)),
            car_rego: text(22),
            guest_request: text(23),
            enquiry_status: text(24),
            primary_source: text(25),
            black_list: parse_boolean(cell(26)),
            rate: text(27),
            suburb: text(28),
            post_code: text(29),
            state: text(30),
            room_status: text(31),
            dual_key: text(32),
            pre_auth_amount: parse_decimal(cell(33)),
            total_pre_auths: parse_decimal(cell(34)),
        }
    }

    /// Every stored field by column name, `original_total` included.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        use FieldValue::{Date, Flag, Money, Text};
        vec![
            ("booking_number", Text(self.booking_number.clone())),
            ("status", Text(self.status.clone())),
            ("file_as", Text(self.file_as.clone())),
            ("first_name", Text(self.first_name.clone())),
            ("surname", Text(self.surname.clone())),
            ("company", Text(self.company.clone())),
            ("region", Text(self.region.clone())),
            ("portal", Text(self.portal.clone())),
            ("arrive_date", Date(self.arrive_date)),
            ("depart_date", Date(self.depart_date)),
            ("room_number", Text(self.room_number.clone())),
            ("room_type", Text(self.room_type.clone())),
            ("deposit_required", Money(self.deposit_required)),
            ("received_amount", Money(self.received_amount)),
            ("deposit_due", Money(self.deposit_due)),
            ("deposit_by_date", Date(self.deposit_by_date)),
            ("total_amount", Money(self.total_amount)),
            ("balance", Money(self.balance)),
            ("original_total", Money(self.original_total)),
            ("agent", Text(self.agent.clone())),
            ("agent_ref", Text(self.agent_ref.clone())),
            ("email", Text(self.email.clone())),
            ("mobile", Text(self.mobile.clone())),
            ("car_rego", Text(self.car_rego.clone())),
            ("guest_request", Text(self.guest_request.clone())),
            ("enquiry_status", Text(self.enquiry_status.clone())),
            ("primary_source", Text(self.primary_source.clone())),
            ("black_list", Flag(self.black_list)),
            ("rate", Text(self.rate.clone())),
            ("suburb", Text(self.suburb.clone())),
            ("post_code", Text(self.post_code.clone())),
            ("state", Text(self.state.clone())),
            ("room_status", Text(self.room_status.clone())),
            ("dual_key", Text(self.dual_key.clone())),
            ("pre_auth_amount", Money(self.pre_auth_amount)),
            ("total_pre_auths", Money(self.total_pre_auths)),
        ]
    }

    /// The stored booking seen through the same typed lens as an incoming row.
    pub fn from_model(m: &entity::booking::Model) -> Self {
        BookingRow {
            booking_number: m.booking_number.clone(),
            status: m.status.clone(),
            file_as: m.file_as.clone(),
            first_name: m.first_name.clone(),
            surname: m.surname.clone(),
            company: m.company.clone(),
            region: m.region.clone(),
            portal: m.portal.clone(),
            arrive_date: m.arrive_date,
            depart_date: m.depart_date,
            room_number: m.room_number.clone(),
            room_type: m.room_type.clone(),
            deposit_required: m.deposit_required,
            received_amount: m.received_amount,
            deposit_due: m.deposit_due,
            deposit_by_date: m.deposit_by_date,
            total_amount: m.total_amount,
            balance: m.balance,
            original_total: m.original_total,
            agent: m.agent.clone(),
            agent_ref: m.agent_ref.clone(),
            email: m.email.clone(),
            mobile: m.mobile.clone(),
            car_rego: m.car_rego.clone(),
            guest_request: m.guest_request.clone(),
            enquiry_status: m.enquiry_status.clone(),
            primary_source: m.primary_source.clone(),
            black_list: m.black_list,
            rate: m.rate.clone(),
            suburb: m.suburb.clone(),
            post_code: m.post_code.clone(),
            state: m.state.clone(),
            room_status: m.room_status.clone(),
            dual_key: m.dual_key.clone(),
            pre_auth_amount: m.pre_auth_amount,
            total_pre_auths: m.total_pre_auths,
        }
    }

    /// All fields as one JSON object with keys in sorted order.
    pub fn canonical_json(&self) -> String {
        let map: BTreeMap<&'static str, Value> = self
            .fields()
            .into_iter()
            .map(|(name, v)| (name, v.to_json()))
            .collect();
        serde_json::to_string(&map).unwrap_or_default()
    }

    /// Why the row cannot be stored, if anything.
    pub fn validate(&self) -> Result<(), String> {
        let number = self.booking_number.trim();
        if number.is_empty() {
            return Err("Missing booking number".to_string());
        }
        if !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("Invalid booking number format: {number}"));
        }
        if self.first_name.is_empty() && self.surname.is_empty() {
            return Err("Missing guest name".to_string());
        }
        if self.arrive_date.is_none() {
            return Err("Missing arrival date".to_string());
        }
        Ok(())
    }
}

/// Cell rendered as text: integral numbers lose their `.0`, blanks and
/// non-breaking spaces become empty.
pub fn cell_text(value: &Value) -> String {
    let raw = match value {
        Value::Null => return String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => if *b { "TRUE".into() } else { "FALSE".into() },
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    };
    raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{a0}').to_string()
}

fn normalize_text(value: &Value) -> String {
    cell_text(value)
}

fn clean_mobile(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')') || c.is_whitespace())
        .collect()
}

/// Last serial Excel can represent (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Excel serial days (1900 date system) to a calendar date. Serials past
/// 9999-12-31 are not dates and yield `None`.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1900, 1, 1)?;
    epoch.checked_add_signed(Duration::try_days(serial.trunc() as i64 - 2)?)
}

pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    if let Some(n) = value.as_f64() {
        if n > 10000.0 {
            return excel_serial_to_date(n);
        }
    }

    let text = cell_text(value);
    if text.is_empty() || text == ERROR_CELL {
        return None;
    }
    if let Ok(n) = text.parse::<f64>() {
        return (n > 10000.0).then(|| excel_serial_to_date(n)).flatten();
    }

    let parts: Vec<&str> = text.split('/').collect();
    if parts.len() == 3 {
        let day = parts[0].trim().parse().ok()?;
        let month = parts[1].trim().parse().ok()?;
        let mut year: i32 = parts[2].trim().parse().ok()?;
        if year < 100 {
            year += 2000;
        }
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    parse_day_first(&text)
}

/// Text dates, day before month when ambiguous.
fn parse_day_first(text: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: [&str; 8] = [
        "%Y-%m-%d", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d", "%d %b %Y", "%d %B %Y", "%d-%b-%Y", "%b %d %Y",
    ];
    const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M"];

    let text = text.replace(',', "");
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(&text, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(&text, f).ok())
                .map(|dt| dt.date())
        })
}

/// Money cells: `$1,200.50`, `(810.40)` and `-$810.40` are all accepted.
pub fn parse_decimal(value: &Value) -> Option<Decimal> {
    let text = cell_text(value);
    if text.is_empty() || text == ERROR_CELL {
        return None;
    }
    let mut cleaned: String = text.chars().filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace()).collect();
    if cleaned.starts_with('(') && cleaned.ends_with(')') {
        let inner = cleaned[1..cleaned.len() - 1].trim_start_matches('-').to_string();
        cleaned = format!("-{inner}");
    }
    let cleaned: String = cleaned.chars().filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-')).collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

pub fn parse_boolean(value: &Value) -> bool {
    if let Value::Bool(b) = value {
        return *b;
    }
    matches!(cell_text(value).to_uppercase().as_str(), "TRUE" | "YES" | "1" | "Y" | "T")
}

/// True when at least three cells of the first row look like column titles.
pub fn detect_header(rows: &[Vec<Value>]) -> bool {
    let Some(first) = rows.first() else {
        return false;
    };
    let matches = first
        .iter()
        .map(cell_text)
        .filter(|cell| HEADER_INDICATORS.iter().any(|ind| cell.contains(ind)))
        .count();
    matches >= 3
}

fn is_blank_row(row: &[Value]) -> bool {
    row.iter().all(|cell| match cell {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRow {
    /// Zero-based position in the sheet, header included.
    pub row_index: usize,
    pub raw: Vec<Value>,
    pub booking: BookingRow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// One-based sheet row number.
    pub row: usize,
    pub error: String,
    pub data: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub sheet_name: String,
    pub total_rows: usize,
    pub header_detected: bool,
    pub bookings: Vec<ExtractedRow>,
    pub errors: Vec<RowError>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ExtractError {
    #[error("Sheet is empty")]
    Empty,
}

pub fn extract_bookings(sheet: &SheetValues) -> Result<Extraction, ExtractError> {
    let rows = &sheet.rows;
    if rows.is_empty() {
        return Err(ExtractError::Empty);
    }

    let header_detected = detect_header(rows);
    let start = usize::from(header_detected);
    let mut out = Extraction {
        sheet_name: sheet.title.clone(),
        total_rows: rows.len(),
        header_detected,
        ..Default::default()
    };

    for (row_index, row) in rows.iter().enumerate().skip(start) {
        if is_blank_row(row) {
            continue;
        }
        let booking = BookingRow::from_cells(row);
        match booking.validate() {
            Ok(()) => out.bookings.push(ExtractedRow { row_index, raw: row.clone(), booking }),
            Err(error) => out.errors.push(RowError { row: row_index + 1, error, data: row.clone() }),
        }
    }
    Ok(out)
}

fn filename_date_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (r"(\d{4}-\d{2}-\d{2})", "%Y-%m-%d"),
            (r"(\d{2}-\d{2}-\d{4})", "%d-%m-%Y"),
            (r"(\d{2}/\d{2}/\d{4})", "%d/%m/%Y"),
            (r"(\d{4}/\d{2}/\d{2})", "%Y/%m/%d"),
        ]
        .into_iter()
        .filter_map(|(re, fmt)| Regex::new(re).ok().map(|re| (re, fmt)))
        .collect()
    })
}

/// Date embedded in an export's filename, e.g. `bookings_2025-09-28.xlsx`.
pub fn extract_file_date(filename: &str) -> Option<NaiveDate> {
    filename_date_patterns().iter().find_map(|(re, fmt)| {
        let found = re.captures(filename)?.get(1)?;
        NaiveDate::parse_from_str(found.as_str(), fmt).ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn excel_serial_dates() {
        assert_eq!(parse_date(&json!(45726)), NaiveDate::from_ymd_opt(2025, 3, 10));
        assert_eq!(parse_date(&json!(45726.75)), NaiveDate::from_ymd_opt(2025, 3, 10));
        assert_eq!(parse_date(&json!(500)), None);
        assert_eq!(parse_date(&json!(1e12)), None);
        assert_eq!(parse_date(&json!("1e20")), None);
        assert_eq!(excel_serial_to_date(2_958_465.0), NaiveDate::from_ymd_opt(9999, 12, 31));
    }

    #[test]
    fn out_of_range_arrival_is_quarantined() {
        let mut row = vec![json!("100234"), json!("Confirmed"), json!("Smith, Jane"), json!("Jane"), json!("Smith")];
        row.extend([json!(""), json!("QLD"), json!("Direct"), json!(1e12), json!("05/10/2025")]);
        let sheet = SheetValues { title: "Sheet1".to_string(), rows: vec![row] };

        let extraction = extract_bookings(&sheet).unwrap();
        assert!(extraction.bookings.is_empty());
        assert_eq!(extraction.errors.len(), 1);
        assert_eq!(extraction.errors[0].error, "Missing arrival date");
    }

    #[test]
    fn day_first_text_dates() {
        assert_eq!(parse_date(&json!("05/03/2025")), NaiveDate::from_ymd_opt(2025, 3, 5));
        assert_eq!(parse_date(&json!("2025-03-05")), NaiveDate::from_ymd_opt(2025, 3, 5));
        assert_eq!(parse_date(&json!("#ERROR!")), None);
        assert_eq!(parse_date(&json!("\u{a0}")), None);
    }

    #[test]
    fn money_cells() {
        assert_eq!(parse_decimal(&json!("$1,200.50")), Decimal::from_str("1200.50").ok());
        assert_eq!(parse_decimal(&json!("($810.40)")), Decimal::from_str("-810.40").ok());
        assert_eq!(parse_decimal(&json!(99.5)), Decimal::from_str("99.5").ok());
        assert_eq!(parse_decimal(&json!("")), None);
    }

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(cell_text(&json!(12345.0)), "12345");
        assert_eq!(cell_text(&json!("  abc\u{a0}")), "abc");
    }
}
