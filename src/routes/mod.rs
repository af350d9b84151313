use crate::error::ApiError;
use crate::models::{ApiOk, AppState, OkData};
use axum::{Json, Router, routing::get};
use serde::de::{Deserialize, Deserializer};

pub mod appointment_routes;
pub mod auth_routes;
pub mod dashboard_routes;
pub mod prescription_routes;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1/auth", auth_routes::router())
        .nest(
            "/api/v1",
            appointment_routes::router()
                .merge(prescription_routes::router())
                .merge(dashboard_routes::router()),
        )
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> Json<ApiOk<OkData>> {
    Json(ApiOk {
        data: OkData { ok: true },
    })
}

/// `?search=&status=` as sent by the list pages. `status=all` means no filter.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
}

/// Reads a `status` filter. Missing, blank or `all` means no filter; anything
/// `parse` rejects is a validation error listing `allowed`.
pub(crate) fn parse_status_filter<T>(
    raw: Option<&str>,
    parse: fn(&str) -> Option<T>,
    allowed: &str,
) -> Result<Option<T>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(s) => parse(s)
            .map(Some)
            .ok_or_else(|| ApiError::validation(format!("status must be one of {allowed}"))),
    }
}

/// Case-insensitive substring match against any of `fields`. An empty term matches everything.
pub(crate) fn matches_search(term: Option<&str>, fields: &[&str]) -> bool {
    let term = match term.map(str::trim) {
        None | Some("") => return true,
        Some(t) => t.to_lowercase(),
    };
    fields.iter().any(|f| f.to_lowercase().contains(&term))
}

pub(crate) fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
pub(crate) fn deserialize_double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_is_case_insensitive_over_any_field() {
        assert!(matches_search(Some("sarah"), &["Dr. Sarah Johnson", "Checkup"]));
        assert!(matches_search(Some("CHECK"), &["Dr. Sarah Johnson", "Regular Checkup"]));
        assert!(!matches_search(Some("chen"), &["Dr. Sarah Johnson", "Checkup"]));
        assert!(matches_search(Some("  "), &["anything"]));
        assert!(matches_search(None, &[]));
    }

    #[test]
    fn status_filter_treats_all_as_no_filter() {
        let parse = |s: &str| (s == "open").then_some(1u8);
        assert_eq!(parse_status_filter(None, parse, "all, open").unwrap(), None);
        assert_eq!(parse_status_filter(Some(" all "), parse, "all, open").unwrap(), None);
        assert_eq!(parse_status_filter(Some("open"), parse, "all, open").unwrap(), Some(1));

        let err = parse_status_filter(Some("closed"), parse, "all, open").unwrap_err();
        assert_matches::assert_matches!(
            err,
            ApiError::BadRequest("VALIDATION_ERROR", msg) if msg == "status must be one of all, open"
        );
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("reason", "  Follow-up ").unwrap(), "Follow-up");
        assert!(required("reason", "   ").is_err());
    }
}
