// src/routes/prescription_routes.rs

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, OkData, Prescription, PrescriptionView},
    routes::{ListQuery, matches_search, parse_status_filter, required},
    status::{PrescriptionStatus, StatusBadge, parse_calendar_date, prescription_status},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/prescriptions", get(list_prescriptions).post(add_prescription))
        .route("/prescriptions/status", get(preview_status))
        .route(
            "/prescriptions/{prescription_id}",
            get(get_prescription)
                .put(replace_prescription)
                .delete(delete_prescription),
        )
}

/// Body for both create and whole-record replace.
#[derive(Debug, Deserialize)]
pub struct PrescriptionRequest {
    pub medicine_name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: String,
    pub end_date: String,
    pub doctor_name: String,
    pub instructions: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub end_date: String,
}

/// Validated fields, ready to be stamped onto a record.
struct PrescriptionFields {
    medicine_name: String,
    dosage: String,
    frequency: String,
    start_date: chrono::NaiveDate,
    end_date: chrono::NaiveDate,
    doctor_name: String,
    instructions: Option<String>,
}

impl TryFrom<PrescriptionRequest> for PrescriptionFields {
    type Error = ApiError;

    fn try_from(req: PrescriptionRequest) -> Result<Self, Self::Error> {
        let start_date = parse_calendar_date(&req.start_date)?;
        let end_date = parse_calendar_date(&req.end_date)?;
        if start_date > end_date {
            return Err(ApiError::validation("start_date must not be after end_date"));
        }

        Ok(PrescriptionFields {
            medicine_name: required("medicine_name", &req.medicine_name)?,
            dosage: required("dosage", &req.dosage)?,
            frequency: required("frequency", &req.frequency)?,
            start_date,
            end_date,
            doctor_name: required("doctor_name", &req.doctor_name)?,
            instructions: req
                .instructions
                .map(|i| i.trim().to_string())
                .filter(|i| !i.is_empty()),
        })
    }
}

pub async fn list_prescriptions(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiOk<Vec<PrescriptionView>>>, ApiError> {
    let status = parse_status_filter(
        q.status.as_deref(),
        PrescriptionStatus::parse,
        "all, active, expiring, expired",
    )?;
    let now = state.clock.now();

    let rows = state
        .store
        .list_prescriptions(auth.user_id)
        .await
        .into_iter()
        .filter(|p| status.is_none_or(|s| prescription_status(p, now) == s))
        .filter(|p| matches_search(q.search.as_deref(), &[&p.medicine_name, &p.doctor_name]))
        .map(|p| PrescriptionView::at(p, now))
        .collect();

    Ok(Json(ApiOk { data: rows }))
}

pub async fn get_prescription(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(prescription_id): Path<Uuid>,
) -> Result<Json<ApiOk<PrescriptionView>>, ApiError> {
    let row = state.store.get_prescription(auth.user_id, prescription_id).await?;
    Ok(Json(ApiOk {
        data: PrescriptionView::at(row, state.clock.now()),
    }))
}

pub async fn add_prescription(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<PrescriptionRequest>,
) -> Result<Json<ApiOk<PrescriptionView>>, ApiError> {
    let f = PrescriptionFields::try_from(req)?;
    let now = state.clock.now();

    let row = state
        .store
        .insert_prescription(Prescription {
            prescription_id: Uuid::new_v4(),
            user_id: auth.user_id,
            medicine_name: f.medicine_name,
            dosage: f.dosage,
            frequency: f.frequency,
            start_date: f.start_date,
            end_date: f.end_date,
            doctor_name: f.doctor_name,
            instructions: f.instructions,
            created_at: now,
            updated_at: now,
        })
        .await;

    tracing::info!("added prescription {} for user {}", row.prescription_id, auth.user_id);
    Ok(Json(ApiOk {
        data: PrescriptionView::at(row, now),
    }))
}

pub async fn replace_prescription(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(prescription_id): Path<Uuid>,
    Json(req): Json<PrescriptionRequest>,
) -> Result<Json<ApiOk<PrescriptionView>>, ApiError> {
    let f = PrescriptionFields::try_from(req)?;
    let existing = state.store.get_prescription(auth.user_id, prescription_id).await?;
    let now = state.clock.now();

    let row = state
        .store
        .replace_prescription(Prescription {
            medicine_name: f.medicine_name,
            dosage: f.dosage,
            frequency: f.frequency,
            start_date: f.start_date,
            end_date: f.end_date,
            doctor_name: f.doctor_name,
            instructions: f.instructions,
            updated_at: now,
            ..existing
        })
        .await?;

    tracing::info!("replaced prescription {prescription_id}");
    Ok(Json(ApiOk {
        data: PrescriptionView::at(row, now),
    }))
}

pub async fn delete_prescription(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(prescription_id): Path<Uuid>,
) -> Result<Json<ApiOk<OkData>>, ApiError> {
    state.store.delete_prescription(auth.user_id, prescription_id).await?;
    tracing::info!("deleted prescription {prescription_id}");
    Ok(Json(ApiOk {
        data: OkData { ok: true },
    }))
}

/// Live badge for the prescription form. Unreadable dates render as `unknown`.
pub async fn preview_status(
    State(state): State<AppState>,
    _auth: AuthContext,
    Query(q): Query<PreviewQuery>,
) -> Result<Json<ApiOk<StatusBadge>>, ApiError> {
    Ok(Json(ApiOk {
        data: StatusBadge::from_raw(&q.end_date, state.clock.now()),
    }))
}
