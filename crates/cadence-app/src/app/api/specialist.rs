//! Specialist-scoped endpoints: publishing a recurring schedule and reading
//! materialized calendar instances.

use salvo::{Depot, Request, Response, Router, handler, http::StatusCode, writing::Json};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::app::api::{
    ErrorResponse, InstanceDto, obtain_config, obtain_provider, parse_uuid_param,
    render_service_error,
};
use cadence_core::recurrence::{DateWindow, weekday_from_iso};
use cadence_core::types::RecurrenceKind;
use cadence_service::schedule::horizon::extend_horizons_for_specialist;
use cadence_service::schedule::query::query_instances;
use cadence_service::schedule::rule::{CreateRuleParams, create_recurrence_rule};

/// ## Summary
/// Create recurring schedule request payload. Weekdays are ISO numbers
/// (Mon=1 .. Sun=7) and are ignored for daily schedules.
#[derive(Debug, Deserialize)]
pub struct CreateScheduleRequest {
    pub workplace_id: uuid::Uuid,
    pub kind: String,
    #[serde(default)]
    pub weekdays: Vec<i16>,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
    pub start_date: chrono::NaiveDate,
    pub end_date: Option<chrono::NaiveDate>,
    pub lookahead_weeks: Option<u32>,
}

/// A date the initial materialization could not persist.
#[derive(Debug, Serialize)]
pub struct FailedDateDto {
    pub date: chrono::NaiveDate,
    pub reason: String,
}

/// ## Summary
/// Schedule created response payload
#[derive(Debug, Serialize)]
pub struct ScheduleCreatedResponse {
    pub series_id: String,
    pub created_dates: Vec<chrono::NaiveDate>,
    pub already_present: usize,
    pub failed_dates: Vec<FailedDateDto>,
    pub truncated: bool,
}

/// ## Summary
/// Calendar instances response payload. `horizon_stale` signals that the
/// requested window reaches past the materialized horizon; the extension
/// runs in the background and a later read will see the new instances.
#[derive(Debug, Serialize)]
pub struct InstancesResponse {
    pub instances: Vec<InstanceDto>,
    pub horizon_stale: bool,
}

/// ## Summary
/// POST /`specialist/{specialist_id}/recurring-schedule` - Publish a
/// recurring availability rule and materialize its initial window.
///
/// ## Side Effects
/// - Creates a recurrence rule row (a new series id on every call)
/// - Materializes instances over the rule's initial window
///
/// ## Errors
/// Returns HTTP 400 for malformed parameters (time ordering, weekday set,
/// date range, missing horizon)
/// Returns HTTP 500 if database operations fail
#[handler]
async fn create_schedule_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    tracing::debug!("Processing create recurring schedule request");

    let Some(specialist_id) = parse_uuid_param(req, res, "specialist_id") else {
        return;
    };

    let create_req: CreateScheduleRequest = match req.parse_json().await {
        Ok(r) => r,
        Err(e) => {
            error!(error = ?e, "Failed to parse create schedule request");
            res.status_code(StatusCode::BAD_REQUEST);
            res.render(Json(ErrorResponse {
                error: "Invalid request body".to_string(),
            }));
            return;
        }
    };

    let Ok(kind) = create_req.kind.parse::<RecurrenceKind>() else {
        res.status_code(StatusCode::BAD_REQUEST);
        res.render(Json(ErrorResponse {
            error: format!("Unknown recurrence kind: {}", create_req.kind),
        }));
        return;
    };

    let mut weekdays = Vec::with_capacity(create_req.weekdays.len());
    for iso in &create_req.weekdays {
        let Some(day) = weekday_from_iso(*iso) else {
            res.status_code(StatusCode::BAD_REQUEST);
            res.render(Json(ErrorResponse {
                error: format!("Weekday {iso} is outside 1..=7"),
            }));
            return;
        };
        weekdays.push(day);
    }

    let Some(settings) = obtain_config(depot, res) else {
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

    let params = CreateRuleParams {
        specialist_id,
        workplace_id: create_req.workplace_id,
        kind,
        weekdays,
        start_time: create_req.start_time,
        end_time: create_req.end_time,
        start_date: create_req.start_date,
        end_date: create_req.end_date,
        lookahead_weeks: create_req.lookahead_weeks,
    };

    match create_recurrence_rule(&mut conn, params, settings.scheduling.max_instances_per_call)
        .await
    {
        Ok(created) => {
            tracing::info!(
                series_id = %created.rule.id,
                created = created.report.created.len(),
                "Recurring schedule published"
            );
            res.status_code(StatusCode::CREATED);
            res.render(Json(ScheduleCreatedResponse {
                series_id: created.rule.id.to_string(),
                created_dates: created.report.created.clone(),
                already_present: created.report.already_present,
                failed_dates: created
                    .report
                    .failed
                    .iter()
                    .map(|f| FailedDateDto {
                        date: f.date,
                        reason: f.reason.clone(),
                    })
                    .collect(),
                truncated: created.report.truncated,
            }));
        }
        Err(err) => {
            error!(error = %err, "Failed to create recurring schedule");
            render_service_error(res, &err);
        }
    }
}

/// ## Summary
/// GET /`specialist/{specialist_id}/calendar-instances?start=&end=` - Read
/// the materialized instances within an inclusive date window.
///
/// The read returns what is currently materialized; when the window reaches
/// past an open-ended series' horizon, an extension is kicked off in the
/// background rather than blocking the response.
///
/// ## Errors
/// Returns HTTP 400 for missing or malformed window parameters
/// Returns HTTP 500 if database operations fail
#[handler]
async fn list_instances_handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    tracing::debug!("Processing calendar instances request");

    let Some(specialist_id) = parse_uuid_param(req, res, "specialist_id") else {
        return;
    };

    let Some(window) = parse_window(req, res) else {
        return;
    };

    let Some(settings) = obtain_config(depot, res) else {
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

    let page = match query_instances(&mut conn, specialist_id, window).await {
        Ok(p) => p,
        Err(err) => {
            error!(error = %err, "Failed to query calendar instances");
            render_service_error(res, &err);
            return;
        }
    };
    drop(conn);

    if page.horizon_stale {
        let cap = settings.scheduling.max_instances_per_call;
        let weeks = settings.scheduling.default_lookahead_weeks;
        tokio::spawn(async move {
            match provider.get_connection().await {
                Ok(mut conn) => {
                    let today = chrono::Utc::now().date_naive();
                    if let Err(err) = extend_horizons_for_specialist(
                        &mut conn,
                        specialist_id,
                        today,
                        cap,
                        weeks,
                    )
                    .await
                    {
                        tracing::warn!(error = %err, "Deferred horizon extension failed");
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "No connection for deferred horizon extension");
                }
            }
        });
    }

    res.status_code(StatusCode::OK);
    res.render(Json(InstancesResponse {
        instances: page.instances.iter().map(InstanceDto::from).collect(),
        horizon_stale: page.horizon_stale,
    }));
}

fn parse_window(req: &Request, res: &mut Response) -> Option<DateWindow> {
    let (Some(start_raw), Some(end_raw)) =
        (req.query::<String>("start"), req.query::<String>("end"))
    else {
        res.status_code(StatusCode::BAD_REQUEST);
        res.render(Json(ErrorResponse {
            error: "start and end query parameters are required".to_string(),
        }));
        return None;
    };
    let (Ok(start), Ok(end)) = (
        start_raw.parse::<chrono::NaiveDate>(),
        end_raw.parse::<chrono::NaiveDate>(),
    ) else {
        res.status_code(StatusCode::BAD_REQUEST);
        res.render(Json(ErrorResponse {
            error: "start and end must be ISO dates (YYYY-MM-DD)".to_string(),
        }));
        return None;
    };
    match DateWindow::new(start, end) {
        Ok(window) => Some(window),
        Err(err) => {
            res.status_code(StatusCode::BAD_REQUEST);
            res.render(Json(ErrorResponse {
                error: err.to_string(),
            }));
            None
        }
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("specialist/<specialist_id>")
        .push(Router::with_path("recurring-schedule").post(create_schedule_handler))
        .push(Router::with_path("calendar-instances").get(list_instances_handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_schedule_request_parses() {
        let payload = serde_json::json!({
            "workplace_id": "0191b2c4-0000-7000-8000-000000000001",
            "kind": "weekly",
            "weekdays": [1, 3],
            "start_time": "09:00:00",
            "end_time": "17:00:00",
            "start_date": "2024-01-01",
            "lookahead_weeks": 2
        });
        let parsed: CreateScheduleRequest =
            serde_json::from_value(payload).expect("payload parses");
        assert_eq!(parsed.kind, "weekly");
        assert_eq!(parsed.weekdays, vec![1, 3]);
        assert!(parsed.end_date.is_none());
        assert_eq!(parsed.lookahead_weeks, Some(2));
    }
}
