use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct BookingRes {
    pub id: Uuid,
    pub booking_number: String,
    pub status: String,
    pub first_name: String,
    pub surname: String,
    pub company: String,
    pub arrive_date: Option<NaiveDate>,
    pub depart_date: Option<NaiveDate>,
    pub room_number: String,
    pub room_type: String,
    /// Money values are decimal strings.
    pub deposit_required: Option<String>,
    pub total_amount: Option<String>,
    pub original_total: Option<String>,
    pub balance: Option<String>,
    pub email: String,
    pub mobile: String,
    pub black_list: bool,
    pub source_file_id: String,
    pub source_file_time: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<entity::booking::Model> for BookingRes {
    fn from(b: entity::booking::Model) -> Self {
        let money = |v: Option<sea_orm::prelude::Decimal>| v.map(|d| d.to_string());
        Self {
            id: b.id,
            booking_number: b.booking_number,
            status: b.status,
            first_name: b.first_name,
            surname: b.surname,
            company: b.company,
            arrive_date: b.arrive_date,
            depart_date: b.depart_date,
            room_number: b.room_number,
            room_type: b.room_type,
            deposit_required: money(b.deposit_required),
            total_amount: money(b.total_amount),
            original_total: money(b.original_total),
            balance: money(b.balance),
            email: b.email,
            mobile: b.mobile,
            black_list: b.black_list,
            source_file_id: b.source_file_id,
            source_file_time: b.source_file_time,
            updated_at: b.updated_at,
        }
    }
}
