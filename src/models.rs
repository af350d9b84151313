use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::session::SessionStore;
use crate::status::{AppointmentDateTime, Expires, StatusBadge};
use crate::store::PortalStore;

pub use crate::status::AppointmentStatus;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PortalStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub clock: Arc<dyn Clock>,
    pub session_ttl_hours: i64,
    pub seed_demo_data: bool,
}

/* -------------------------
   Records
--------------------------*/

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Appointment {
    pub appointment_id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub doctor_name: String,
    pub appointment_date: NaiveDateTime,
    pub reason: String,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Prescription {
    pub prescription_id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub medicine_name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub doctor_name: String,
    pub instructions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expires for Prescription {
    fn end_date(&self) -> NaiveDate {
        self.end_date
    }
}

/* -------------------------
   API DTOs
--------------------------*/

#[derive(Debug, Serialize)]
pub struct ApiOk<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct OkData {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponseData {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct MeResponseData {
    pub user: UserProfile,
    pub session: SessionInfo,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

impl From<&User> for UserProfile {
    fn from(u: &User) -> Self {
        UserProfile {
            user_id: u.user_id,
            email: u.email.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            phone: u.phone.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Appointment plus its render-ready date, time and badge style.
#[derive(Debug, Serialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub display: AppointmentDateTime,
    pub style_key: &'static str,
}

impl From<Appointment> for AppointmentView {
    fn from(appointment: Appointment) -> Self {
        AppointmentView {
            display: AppointmentDateTime::from(appointment.appointment_date),
            style_key: crate::status::appointment_style_key(appointment.status),
            appointment,
        }
    }
}

/// Prescription plus the status derived for the request's `now`.
#[derive(Debug, Serialize)]
pub struct PrescriptionView {
    #[serde(flatten)]
    pub prescription: Prescription,
    pub badge: StatusBadge,
    pub renewal_notice: Option<String>,
}

impl PrescriptionView {
    pub fn at(prescription: Prescription, now: DateTime<Utc>) -> Self {
        PrescriptionView {
            badge: StatusBadge::derive(&prescription, now),
            renewal_notice: crate::status::renewal_notice(&prescription, now),
            prescription,
        }
    }
}
