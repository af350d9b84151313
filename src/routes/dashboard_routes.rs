use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, AppointmentStatus, AppointmentView, PrescriptionView},
    status::{PrescriptionStatus, prescription_status},
};

const PREVIEW_LIMIT: usize = 3;

#[derive(Debug, Serialize)]
pub struct DashboardData {
    pub upcoming_appointments: Vec<AppointmentView>,
    pub active_prescriptions: Vec<PrescriptionView>,
    pub stats: DashboardStats,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_appointments: usize,
    pub completed_appointments: usize,
    pub upcoming_appointments: usize,
    pub active_prescriptions: usize,
    pub expiring_prescriptions: usize,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

pub async fn dashboard(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ApiOk<DashboardData>>, ApiError> {
    let now = state.clock.now();
    let appointments = state.store.list_appointments(auth.user_id).await;
    let prescriptions = state.store.list_prescriptions(auth.user_id).await;

    // Appointment times are naive wall-clock values, compared as UTC.
    let upcoming: Vec<_> = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Scheduled && a.appointment_date > now.naive_utc())
        .cloned()
        .collect();

    let current: Vec<_> = prescriptions
        .into_iter()
        .filter(|p| prescription_status(p, now) != PrescriptionStatus::Expired)
        .collect();

    let stats = DashboardStats {
        total_appointments: appointments.len(),
        completed_appointments: appointments
            .iter()
            .filter(|a| a.status == AppointmentStatus::Completed)
            .count(),
        upcoming_appointments: upcoming.len(),
        active_prescriptions: current.len(),
        expiring_prescriptions: current
            .iter()
            .filter(|p| prescription_status(*p, now) == PrescriptionStatus::Expiring)
            .count(),
    };

    Ok(Json(ApiOk {
        data: DashboardData {
            upcoming_appointments: upcoming
                .into_iter()
                .take(PREVIEW_LIMIT)
                .map(AppointmentView::from)
                .collect(),
            active_prescriptions: current
                .into_iter()
                .take(PREVIEW_LIMIT)
                .map(|p| PrescriptionView::at(p, now))
                .collect(),
            stats,
        },
    }))
}
