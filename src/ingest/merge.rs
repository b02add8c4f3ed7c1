//! Newest-file-wins merging of incoming rows into stored bookings.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use super::sheet::{BookingRow, FieldValue};

/// Facts about a booking that no later export may change.
pub const IMMUTABLE_FIELDS: [&str; 5] = [
    "booking_number",
    "arrive_date",
    "depart_date",
    "original_total",
    "deposit_required",
];

pub fn is_immutable(field: &str) -> bool {
    IMMUTABLE_FIELDS.contains(&field)
}

/// SHA-256 hex of the row's canonical JSON.
pub fn row_hash(row: &BookingRow) -> String {
    let digest = Sha256::digest(row.canonical_json().as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Updated,
    Ignored,
    Conflict,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldConflict {
    pub field: &'static str,
    pub existing: String,
    pub incoming: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergePlan {
    Insert,
    /// Stored data is as new or newer than the incoming file.
    Ignore,
    Update {
        changes: Vec<(&'static str, FieldValue)>,
        conflicts: Vec<FieldConflict>,
    },
}

impl MergePlan {
    pub fn outcome(&self) -> MergeOutcome {
        match self {
            MergePlan::Insert => MergeOutcome::Inserted,
            MergePlan::Ignore => MergeOutcome::Ignored,
            MergePlan::Update { conflicts, .. } if !conflicts.is_empty() => MergeOutcome::Conflict,
            MergePlan::Update { .. } => MergeOutcome::Updated,
        }
    }
}

/// Decides how `incoming`, read from a file whose data dates from `data_time`,
/// lands on the stored booking with the same number.
///
/// Mutable fields take the incoming value whenever it differs. Immutable
/// fields are only filled when nothing is stored yet; a differing value is
/// reported as a conflict and left alone.
pub fn plan_merge(
    existing: Option<&entity::booking::Model>,
    incoming: &BookingRow,
    data_time: DateTime<Utc>,
) -> MergePlan {
    let Some(existing) = existing else {
        return MergePlan::Insert;
    };
    if data_time <= existing.source_file_time {
        return MergePlan::Ignore;
    }

    let stored = BookingRow::from_model(existing).fields();
    let mut changes = Vec::new();
    let mut conflicts = Vec::new();

    for ((field, old), (_, new)) in stored.into_iter().zip(incoming.fields()) {
        if old == new {
            continue;
        }
        if !is_immutable(field) {
            changes.push((field, new));
            continue;
        }
        if !new.is_present() {
            continue;
        }
        if old.is_present() {
            conflicts.push(FieldConflict {
                field,
                existing: old.to_string(),
                incoming: new.to_string(),
            });
        } else {
            changes.push((field, new));
        }
    }

    MergePlan::Update { changes, conflicts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};
    use sea_orm::prelude::Decimal;
    use uuid::Uuid;

    fn stored(time: DateTime<Utc>) -> entity::booking::Model {
        entity::booking::Model {
            id: Uuid::new_v4(),
            booking_number: "1001".into(),
            status: "Confirmed".into(),
            file_as: String::new(),
            first_name: "Ada".into(),
            surname: "Lovelace".into(),
            company: String::new(),
            region: String::new(),
            portal: String::new(),
            arrive_date: NaiveDate::from_ymd_opt(2025, 3, 10),
            depart_date: NaiveDate::from_ymd_opt(2025, 3, 12),
            room_number: "12".into(),
            room_type: String::new(),
            deposit_required: Some(Decimal::new(10000, 2)),
            received_amount: None,
            deposit_due: None,
            deposit_by_date: None,
            total_amount: Some(Decimal::new(50000, 2)),
            balance: None,
            original_total: Some(Decimal::new(50000, 2)),
            agent: String::new(),
            agent_ref: String::new(),
            email: String::new(),
            mobile: String::new(),
            car_rego: String::new(),
            guest_request: String::new(),
            enquiry_status: String::new(),
            primary_source: String::new(),
            black_list: false,
            rate: String::new(),
            suburb: String::new(),
            post_code: String::new(),
            state: String::new(),
            room_status: String::new(),
            dual_key: String::new(),
            pre_auth_amount: None,
            total_pre_auths: None,
            source_file_id: "file-a".into(),
            source_file_time: time,
            source_row_hash: String::new(),
            ingestion_run_id: None,
            folder_id: None,
            created_at: time,
            updated_at: time,
        }
    }

    fn incoming_from(model: &entity::booking::Model) -> BookingRow {
        BookingRow::from_model(model)
    }

    #[test]
    fn older_data_is_ignored() {
        let t = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let existing = stored(t);
        let row = incoming_from(&existing);
        assert_eq!(plan_merge(Some(&existing), &row, t).outcome(), MergeOutcome::Ignored);
        assert_eq!(
            plan_merge(Some(&existing), &row, t - Duration::hours(1)).outcome(),
            MergeOutcome::Ignored
        );
    }

    #[test]
    fn newer_data_updates_mutable_fields() {
        let t = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let existing = stored(t);
        let mut row = incoming_from(&existing);
        row.room_number = "14".into();
        row.status = "Checked In".into();

        let plan = plan_merge(Some(&existing), &row, t + Duration::days(1));
        assert_eq!(plan.outcome(), MergeOutcome::Updated);
        let MergePlan::Update { changes, conflicts } = plan else {
            panic!("expected update");
        };
        assert!(conflicts.is_empty());
        let names: Vec<_> = changes.iter().map(|(f, _)| *f).collect();
        assert_eq!(names, vec!["status", "room_number"]);
    }

    #[test]
    fn immutable_changes_become_conflicts() {
        let t = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let existing = stored(t);
        let mut row = incoming_from(&existing);
        row.arrive_date = NaiveDate::from_ymd_opt(2025, 3, 11);
        // same amount, different scale
        row.deposit_required = Some(Decimal::new(100, 0));

        let plan = plan_merge(Some(&existing), &row, t + Duration::days(1));
        assert_eq!(plan.outcome(), MergeOutcome::Conflict);
        let MergePlan::Update { changes, conflicts } = plan else {
            panic!("expected update");
        };
        assert!(changes.is_empty());
        assert_eq!(
            conflicts,
            vec![FieldConflict {
                field: "arrive_date",
                existing: "2025-03-10".into(),
                incoming: "2025-03-11".into(),
            }]
        );
    }

    #[test]
    fn blank_immutable_fields_are_filled_not_cleared() {
        let t = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let mut existing = stored(t);
        existing.depart_date = None;
        let mut row = incoming_from(&existing);
        row.depart_date = NaiveDate::from_ymd_opt(2025, 3, 13);
        row.deposit_required = None;

        let plan = plan_merge(Some(&existing), &row, t + Duration::days(1));
        assert_eq!(plan.outcome(), MergeOutcome::Updated);
        let MergePlan::Update { changes, conflicts } = plan else {
            panic!("expected update");
        };
        assert!(conflicts.is_empty());
        assert_eq!(changes, vec![("depart_date", FieldValue::Date(NaiveDate::from_ymd_opt(2025, 3, 13)))]);
    }

    #[test]
    fn hash_is_stable_and_field_sensitive() {
        let existing = stored(Utc::now());
        let row = incoming_from(&existing);
        assert_eq!(row_hash(&row), row_hash(&row.clone()));
        assert_eq!(row_hash(&row).len(), 64);

        let mut other = row.clone();
        other.mobile = "0400 000 000".into();
        assert_ne!(row_hash(&row), row_hash(&other));
    }
}
