use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A hotel booking, merged across successive spreadsheet exports.
#[derive(Debug, Clone, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booking")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub booking_number: String,
    pub status: String,
    pub file_as: String,
    pub first_name: String,
    pub surname: String,
    pub company: String,
    pub region: String,
    pub portal: String,
    pub arrive_date: Option<Date>,
    pub depart_date: Option<Date>,
    pub room_number: String,
    pub room_type: String,
    pub deposit_required: Option<Decimal>,
    pub received_amount: Option<Decimal>,
    pub deposit_due: Option<Decimal>,
    pub deposit_by_date: Option<Date>,
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
    pub source_file_id: String,
    pub source_file_time: DateTimeUtc,
    pub source_row_hash: String,
    pub ingestion_run_id: Option<Uuid>,
    pub folder_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
