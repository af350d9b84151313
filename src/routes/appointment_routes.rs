// src/routes/appointment_routes.rs

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, Appointment, AppointmentStatus, AppointmentView, OkData},
    routes::{ListQuery, deserialize_double_option, matches_search, parse_status_filter, required},
    status::parse_appointment_date_time,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list_appointments).post(book_appointment))
        .route(
            "/appointments/{appointment_id}",
            get(get_appointment)
                .patch(update_appointment)
                .delete(delete_appointment),
        )
        .route("/appointments/{appointment_id}/cancel", post(cancel_appointment))
}

/* ============================================================
   Request DTOs
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_name: String,
    // YYYY-MM-DD and HH:MM, as the booking form submits them
    pub appointment_date: String,
    pub appointment_time: String,
    pub reason: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub doctor_name: Option<String>,
    pub appointment_date: Option<String>,
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub notes: Option<Option<String>>,
    pub status: Option<AppointmentStatus>,
}

fn clean_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

/* ============================================================
   GET /appointments
   ============================================================ */

pub async fn list_appointments(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiOk<Vec<AppointmentView>>>, ApiError> {
    let status = parse_status_filter(
        q.status.as_deref(),
        AppointmentStatus::parse,
        "all, scheduled, completed, cancelled",
    )?;

    let rows = state
        .store
        .list_appointments(auth.user_id)
        .await
        .into_iter()
        .filter(|a| status.is_none_or(|s| a.status == s))
        .filter(|a| matches_search(q.search.as_deref(), &[&a.doctor_name, &a.reason]))
        .map(AppointmentView::from)
        .collect();

    Ok(Json(ApiOk { data: rows }))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiOk<AppointmentView>>, ApiError> {
    let row = state.store.get_appointment(auth.user_id, appointment_id).await?;
    Ok(Json(ApiOk { data: row.into() }))
}

/* ============================================================
   POST /appointments
   ============================================================ */

pub async fn book_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<BookAppointmentRequest>,
) -> Result<Json<ApiOk<AppointmentView>>, ApiError> {
    let doctor_name = required("doctor_name", &req.doctor_name)?;
    let reason = required("reason", &req.reason)?;

    let day = NaiveDate::parse_from_str(req.appointment_date.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::validation("appointment_date must be YYYY-MM-DD"))?;
    let appointment_date = parse_appointment_date_time(&format!(
        "{}T{}",
        day.format("%Y-%m-%d"),
        req.appointment_time.trim()
    ))
    .map_err(|_| ApiError::validation("appointment_time must be HH:MM"))?;

    let now = state.clock.now();
    if day < now.date_naive() {
        return Err(ApiError::validation("appointment_date cannot be in the past"));
    }

    let row = state
        .store
        .insert_appointment(Appointment {
            appointment_id: Uuid::new_v4(),
            user_id: auth.user_id,
            doctor_name,
            appointment_date,
            reason,
            notes: clean_notes(req.notes),
            status: AppointmentStatus::Scheduled,
            created_at: now,
            updated_at: now,
        })
        .await;

    tracing::info!("booked appointment {} for user {}", row.appointment_id, auth.user_id);
    Ok(Json(ApiOk { data: row.into() }))
}

/* ============================================================
   PATCH /appointments/{id}
   ============================================================ */

pub async fn update_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
    Json(req): Json<UpdateAppointmentRequest>,
) -> Result<Json<ApiOk<AppointmentView>>, ApiError> {
    let mut row = state.store.get_appointment(auth.user_id, appointment_id).await?;

    if let Some(doctor_name) = req.doctor_name {
        row.doctor_name = required("doctor_name", &doctor_name)?;
    }
    if let Some(reason) = req.reason {
        row.reason = required("reason", &reason)?;
    }
    if let Some(raw) = req.appointment_date {
        row.appointment_date = parse_appointment_date_time(&raw)?;
    }
    if let Some(notes) = req.notes {
        row.notes = clean_notes(notes);
    }
    if let Some(status) = req.status {
        row.status = status;
    }
    row.updated_at = state.clock.now();

    let row = state.store.update_appointment(row).await?;
    Ok(Json(ApiOk { data: row.into() }))
}

/* ============================================================
   POST /appointments/{id}/cancel
   ============================================================ */

pub async fn cancel_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiOk<AppointmentView>>, ApiError> {
    let mut row = state.store.get_appointment(auth.user_id, appointment_id).await?;

    if row.status != AppointmentStatus::Scheduled {
        return Err(ApiError::Conflict(
            "INVALID_STATUS",
            "Only scheduled appointments can be cancelled".into(),
        ));
    }

    row.status = AppointmentStatus::Cancelled;
    row.updated_at = state.clock.now();

    let row = state.store.update_appointment(row).await?;
    tracing::info!("cancelled appointment {appointment_id}");
    Ok(Json(ApiOk { data: row.into() }))
}

pub async fn delete_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiOk<OkData>>, ApiError> {
    state.store.delete_appointment(auth.user_id, appointment_id).await?;
    tracing::info!("deleted appointment {appointment_id}");
    Ok(Json(ApiOk {
        data: OkData { ok: true },
    }))
}
