//! Calendar event endpoints: editing or removing one materialized instance,
//! and deleting a whole series.

use salvo::{Depot, Request, Response, Router, handler, http::StatusCode, writing::Json};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::app::api::{
    BookingDto, ErrorResponse, InstanceDto, obtain_provider, parse_uuid_param,
    render_service_error,
};
use cadence_db::db::query::{instance, rule};
use cadence_service::schedule::instance::{
    delete_instance, delete_series, update_instance_time,
};

/// ## Summary
/// Update event request payload. `specialist_id` must match the instance's
/// owner; authorization proper lives upstream.
#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    pub specialist_id: uuid::Uuid,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
}

/// ## Summary
/// Event updated response payload. `uncovered_bookings` lists confirmed
/// bookings the new time range no longer covers; they are not modified.
#[derive(Debug, Serialize)]
pub struct EventUpdatedResponse {
    pub instance: InstanceDto,
    pub uncovered_bookings: Vec<BookingDto>,
}

/// ## Summary
/// Series deleted response payload
#[derive(Debug, Serialize)]
pub struct SeriesDeletedResponse {
    pub deleted_count: usize,
}

/// ## Summary
/// PUT /`calendar-event/{event_id}` - Edit one instance's time range.
///
/// The edit permanently decouples the instance from its series template:
/// re-materialization will never revert it.
///
/// ## Errors
/// Returns HTTP 400 for an inverted time range
/// Returns HTTP 404 if the instance does not exist or belongs to another
/// specialist
/// Returns HTTP 500 if database operations fail
#[handler]
async fn update_event_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    tracing::debug!("Processing update calendar event request");

    let Some(event_id) = parse_uuid_param(req, res, "event_id") else {
        return;
    };

    let update_req: UpdateEventRequest = match req.parse_json().await {
        Ok(r) => r,
        Err(e) => {
            error!(error = ?e, "Failed to parse update event request");
            res.status_code(StatusCode::BAD_REQUEST);
            res.render(Json(ErrorResponse {
                error: "Invalid request body".to_string(),
            }));
            return;
        }
    };

    let Some(provider) = obtain_provider(depot, res) else {
        return;
    };
    let mut conn = match provider.get_connection().await {
        Ok(c) => c,
        Err(e) => {
            error!(error = ?e, "Failed to get database connection");
            res.status_code(StatusCode::SERVICE_UNAVAILABLE);
            res.render(Json(ErrorResponse {
                error: "Database unavailable".to_string(),
            }));
            return;
        }
    };

    // Ownership check before mutating; a foreign instance reads as absent.
    match instance::by_id(&mut conn, event_id).await {
        Ok(Some(existing)) if existing.specialist_id == update_req.specialist_id => {}
        Ok(_) => {
            res.status_code(StatusCode::NOT_FOUND);
            res.render(Json(ErrorResponse {
                error: format!("instance {event_id} not found"),
            }));
            return;
        }
        Err(e) => {
            error!(error = %e, "Failed to look up instance");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
            res.render(Json(ErrorResponse {
                error: "Internal server error".to_string(),
            }));
            return;
        }
    }

    match update_instance_time(&mut conn, event_id, update_req.start_time, update_req.end_time)
        .await
    {
        Ok(updated) => {
            res.status_code(StatusCode::OK);
            res.render(Json(EventUpdatedResponse {
                instance: InstanceDto::from(&updated.instance),
                uncovered_bookings: updated
                    .uncovered_bookings
                    .iter()
                    .map(BookingDto::from)
                    .collect(),
            }));
        }
        Err(err) => {
            error!(error = %err, "Failed to update calendar event");
            render_service_error(res, &err);
        }
    }
}

/// ## Summary
/// DELETE /`calendar-event/{event_id}?specialist_id=` - Remove exactly one
/// instance. Siblings in the same series are unaffected.
///
/// ## Errors
/// Returns HTTP 400 for a missing or malformed `specialist_id`
/// Returns HTTP 404 if the instance does not exist or belongs to another
/// specialist
/// Returns HTTP 500 if database operations fail
#[handler]
async fn delete_event_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    tracing::debug!("Processing delete calendar event request");

    let Some(event_id) = parse_uuid_param(req, res, "event_id") else {
        return;
    };
    let Some(specialist_id) = parse_specialist_query(req, res) else {
        return;
    };

    let Some(provider) = obtain_provider(depot, res) else {
        return;
    };
    let mut conn = match provider.get_connection().await {
        Ok(c) => c,
        Err(e) => {
            error!(error = ?e, "Failed to get database connection");
            res.status_code(StatusCode::SERVICE_UNAVAILABLE);
            res.render(Json(ErrorResponse {
                error: "Database unavailable".to_string(),
            }));
            return;
        }
    };

    match instance::by_id(&mut conn, event_id).await {
        Ok(Some(existing)) if existing.specialist_id == specialist_id => {}
        Ok(_) => {
            res.status_code(StatusCode::NOT_FOUND);
            res.render(Json(ErrorResponse {
                error: format!("instance {event_id} not found"),
            }));
            return;
        }
        Err(e) => {
            error!(error = %e, "Failed to look up instance");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
            res.render(Json(ErrorResponse {
                error: "Internal server error".to_string(),
            }));
            return;
        }
    }

    match delete_instance(&mut conn, event_id).await {
        Ok(()) => {
            res.status_code(StatusCode::NO_CONTENT);
        }
        Err(err) => {
            error!(error = %err, "Failed to delete calendar event");
            render_service_error(res, &err);
        }
    }
}

/// ## Summary
/// DELETE /`calendar-event/series/{series_id}?specialist_id=&confirm=true` -
/// Remove a whole series: every instance, past and future, and the rule.
///
/// This is irreversible and bulk-destructive, so the `confirm=true` query
/// flag is required; without it nothing is deleted.
///
/// ## Errors
/// Returns HTTP 400 when `confirm=true` or `specialist_id` is missing
/// Returns HTTP 404 if the series does not exist or belongs to another
/// specialist
/// Returns HTTP 500 if database operations fail
#[handler]
async fn delete_series_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    tracing::debug!("Processing delete series request");

    let Some(series_id) = parse_uuid_param(req, res, "series_id") else {
        return;
    };
    let Some(specialist_id) = parse_specialist_query(req, res) else {
        return;
    };

    if req.query::<String>("confirm").as_deref() != Some("true") {
        res.status_code(StatusCode::BAD_REQUEST);
        res.render(Json(ErrorResponse {
            error: "Series deletion is irreversible; pass confirm=true to proceed".to_string(),
        }));
        return;
    }

    let Some(provider) = obtain_provider(depot, res) else {
        return;
    };
    let mut conn = match provider.get_connection().await {
        Ok(c) => c,
        Err(e) => {
            error!(error = ?e, "Failed to get database connection");
            res.status_code(StatusCode::SERVICE_UNAVAILABLE);
            res.render(Json(ErrorResponse {
                error: "Database unavailable".to_string(),
            }));
            return;
        }
    };

    match rule::by_id(&mut conn, series_id).await {
        Ok(Some(existing)) if existing.specialist_id == specialist_id => {}
        Ok(_) => {
            res.status_code(StatusCode::NOT_FOUND);
            res.render(Json(ErrorResponse {
                error: format!("series {series_id} not found"),
            }));
            return;
        }
        Err(e) => {
            error!(error = %e, "Failed to look up series");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
            res.render(Json(ErrorResponse {
                error: "Internal server error".to_string(),
            }));
            return;
        }
    }

    match delete_series(&mut conn, series_id).await {
        Ok(deleted) => {
            tracing::info!(
                series_id = %series_id,
                deleted_count = deleted.deleted_count,
                "Series deleted via API"
            );
            res.status_code(StatusCode::OK);
            res.render(Json(SeriesDeletedResponse {
                deleted_count: deleted.deleted_count,
            }));
        }
        Err(err) => {
            error!(error = %err, "Failed to delete series");
            render_service_error(res, &err);
        }
    }
}

fn parse_specialist_query(req: &Request, res: &mut Response) -> Option<uuid::Uuid> {
    let Some(raw) = req.query::<String>("specialist_id") else {
        res.status_code(StatusCode::BAD_REQUEST);
        res.render(Json(ErrorResponse {
            error: "specialist_id query parameter is required".to_string(),
        }));
        return None;
    };
    match uuid::Uuid::parse_str(&raw) {
        Ok(id) => Some(id),
        Err(_) => {
            res.status_code(StatusCode::BAD_REQUEST);
            res.render(Json(ErrorResponse {
                error: "Invalid specialist_id format".to_string(),
            }));
            None
        }
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("calendar-event")
        .push(Router::with_path("series/<series_id>").delete(delete_series_handler))
        .push(
            Router::with_path("<event_id>")
                .put(update_event_handler)
                .delete(delete_event_handler),
        )
}
