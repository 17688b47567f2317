//! REST API wiring and shared response payloads.

use salvo::{Depot, Request, Response, Router, http::StatusCode, writing::Json};
use serde::Serialize;
use tracing::error;

use crate::config::get_config_from_depot;
use crate::db_handler::get_db_from_depot;
use cadence_db::model::booking::Booking;
use cadence_db::model::instance::CalendarInstance;
use cadence_service::error::ServiceError;

mod calendar_event;
mod healthcheck;
mod specialist;

/// ## Summary
/// Error response payload
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// One materialized calendar instance.
#[derive(Debug, Serialize)]
pub struct InstanceDto {
    pub id: String,
    pub series_id: String,
    pub workplace_id: String,
    pub date: chrono::NaiveDate,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
}

impl From<&CalendarInstance> for InstanceDto {
    fn from(instance: &CalendarInstance) -> Self {
        Self {
            id: instance.id.to_string(),
            series_id: instance.series_id.to_string(),
            workplace_id: instance.workplace_id.to_string(),
            date: instance.date,
            start_time: instance.start_time,
            end_time: instance.end_time,
        }
    }
}

/// A booking as surfaced in warnings; bookings are never mutated here.
#[derive(Debug, Serialize)]
pub struct BookingDto {
    pub id: String,
    pub date: chrono::NaiveDate,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
    pub status: String,
}

impl From<&Booking> for BookingDto {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id.to_string(),
            date: booking.date,
            start_time: booking.start_time,
            end_time: booking.end_time,
            status: booking.status.to_string(),
        }
    }
}

/// Maps a service error onto an HTTP status and error body.
pub(crate) fn render_service_error(res: &mut Response, err: &ServiceError) {
    use cadence_core::error::CoreError;
    use cadence_db::error::DbError;

    let (status, message) = match err {
        ServiceError::ValidationError(msg)
        | ServiceError::CoreError(CoreError::ValidationError(msg)) => {
            (StatusCode::BAD_REQUEST, msg.clone())
        }
        ServiceError::NotFound(msg) | ServiceError::CoreError(CoreError::NotFound(msg)) => {
            (StatusCode::NOT_FOUND, msg.clone())
        }
        ServiceError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        ServiceError::DatabaseError(DbError::PoolError(_)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Database unavailable".to_string(),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    };

    res.status_code(status);
    res.render(Json(ErrorResponse { error: message }));
}

/// Extracts and parses a UUID path parameter, rendering HTTP 400 on failure.
pub(crate) fn parse_uuid_param(
    req: &Request,
    res: &mut Response,
    name: &str,
) -> Option<uuid::Uuid> {
    let Some(raw) = req.param::<String>(name) else {
        res.status_code(StatusCode::BAD_REQUEST);
        res.render(Json(ErrorResponse {
            error: format!("{name} is required"),
        }));
        return None;
    };
    match uuid::Uuid::parse_str(&raw) {
        Ok(id) => Some(id),
        Err(_) => {
            res.status_code(StatusCode::BAD_REQUEST);
            res.render(Json(ErrorResponse {
                error: format!("Invalid {name} format"),
            }));
            None
        }
    }
}

pub(crate) fn obtain_config(
    depot: &Depot,
    res: &mut Response,
) -> Option<std::sync::Arc<crate::config::Settings>> {
    match get_config_from_depot(depot) {
        Ok(s) => Some(s),
        Err(e) => {
            error!(error = ?e, "Failed to get configuration");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
            res.render(Json(ErrorResponse {
                error: "Internal server error".to_string(),
            }));
            None
        }
    }
}

pub(crate) fn obtain_provider(
    depot: &Depot,
    res: &mut Response,
) -> Option<std::sync::Arc<dyn cadence_db::db::DbProvider + Send + Sync + 'static>> {
    match get_db_from_depot(depot) {
        Ok(p) => Some(p),
        Err(e) => {
            error!(error = ?e, "Failed to get database provider");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
            res.render(Json(ErrorResponse {
                error: "Internal server error".to_string(),
            }));
            None
        }
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::new()
        .push(specialist::routes())
        .push(calendar_event::routes())
        .push(Router::with_path("app").push(healthcheck::routes()))
}
