use chrono::{DateTime, NaiveTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use super::schema::{course_offerings, period_templates, scheduled_events, timetable_versions};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = timetable_versions)]
pub struct VersionRow {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub status: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = timetable_versions)]
pub struct NewVersionRow {
    pub batch_id: Uuid,
    pub status: String,
    pub name: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = scheduled_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // Some fields used only for database operations
pub struct EventRow {
    pub id: Uuid,
    pub version_id: Uuid,
    pub day_of_week: i16,
    pub period_id: Option<String>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub offering_id: Uuid,
    pub room_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = scheduled_events)]
pub struct NewEventRow {
    pub version_id: Uuid,
    pub day_of_week: i16,
    pub period_id: Option<String>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub offering_id: Uuid,
    pub room_id: Option<Uuid>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = period_templates)]
#[allow(dead_code)] // is_active is a query predicate, not domain data
pub struct TemplateRow {
    pub id: Uuid,
    pub name: String,
    pub slots_json: Value,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = period_templates)]
pub struct NewTemplateRow {
    pub name: String,
    pub slots_json: Value,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = course_offerings)]
#[allow(dead_code)] // Some fields used only for database operations
pub struct OfferingRow {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub subject_name: String,
    pub subject_code: Option<String>,
    pub faculty_name: Option<String>,
    pub default_room_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
