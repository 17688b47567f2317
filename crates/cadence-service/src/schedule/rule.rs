//! Recurrence rule creation and template updates.

use chrono::{NaiveDate, NaiveTime, Weekday};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::schedule::materialize::{MaterializationReport, materialize_window};
use cadence_core::recurrence::{RecurrenceSpec, weekday_to_iso};
use cadence_core::types::RecurrenceKind;
use cadence_db::db::connection::DbConnection;
use cadence_db::db::query::rule;
use cadence_db::model::rule::{NewRecurrenceRule, RecurrenceRuleRow};

/// Parameters for creating a recurrence rule.
#[derive(Debug, Clone)]
pub struct CreateRuleParams {
    pub specialist_id: Uuid,
    pub workplace_id: Uuid,
    pub kind: RecurrenceKind,
    pub weekdays: Vec<Weekday>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub lookahead_weeks: Option<u32>,
}

/// Result of rule creation: the stored rule (whose id is the series id) and
/// the initial materialization report.
#[derive(Debug)]
pub struct RuleCreated {
    pub rule: RecurrenceRuleRow,
    pub report: MaterializationReport,
}

/// ## Summary
/// Validates the parameters, stores the rule, and runs the initial
/// materialization pass over the rule's bounded window.
///
/// Every creation produces a fresh series id; re-creating a rule with
/// identical parameters yields a different series.
///
/// ## Side Effects
/// - Inserts the rule row
/// - Materializes instances for the initial window
/// - Advances the series watermark when the pass had no failures
///
/// ## Errors
/// Returns `ValidationError` for malformed parameters (§ rule invariants),
/// or a database error if persistence fails outright. Partial
/// materialization failures are reported in the result, not as an error.
#[tracing::instrument(skip(conn, params), fields(specialist_id = %params.specialist_id, workplace_id = %params.workplace_id))]
pub async fn create_recurrence_rule(
    conn: &mut DbConnection<'_>,
    params: CreateRuleParams,
    max_instances: u16,
) -> ServiceResult<RuleCreated> {
    let spec = RecurrenceSpec::new(
        params.kind,
        params.weekdays,
        params.start_time,
        params.end_time,
        params.start_date,
        params.end_date,
        params.lookahead_weeks,
    )?;

    let new_rule = NewRecurrenceRule {
        id: Uuid::now_v7(),
        specialist_id: params.specialist_id,
        workplace_id: params.workplace_id,
        kind: params.kind.into(),
        weekdays: spec.weekdays().iter().map(|&d| weekday_to_iso(d)).collect(),
        start_time: spec.start_time(),
        end_time: spec.end_time(),
        start_date: spec.start_date(),
        end_date: spec.end_date(),
        lookahead_weeks: spec.lookahead_weeks().and_then(|w| i32::try_from(w).ok()),
    };

    let stored = rule::insert(conn, &new_rule).await?;
    tracing::info!(series_id = %stored.id, "Recurrence rule created");

    let window = spec.initial_window();
    let report = materialize_window(conn, &stored, window, max_instances).await?;

    if let Some(through) = report.watermark_candidate(window) {
        rule::set_materialized_through(conn, stored.id, through).await?;
    }

    Ok(RuleCreated {
        rule: stored,
        report,
    })
}

/// ## Summary
/// Replaces a rule's template times. Already-materialized instances keep
/// their times; only future materialization uses the new template.
///
/// ## Errors
/// Returns `ValidationError` when `new_end` is not after `new_start`, and
/// `NotFound` when the series does not exist.
#[tracing::instrument(skip(conn))]
pub async fn update_rule_times(
    conn: &mut DbConnection<'_>,
    series_id: Uuid,
    new_start: NaiveTime,
    new_end: NaiveTime,
) -> ServiceResult<RecurrenceRuleRow> {
    if new_end <= new_start {
        return Err(ServiceError::ValidationError(format!(
            "end time {new_end} must be after start time {new_start}"
        )));
    }
    rule::update_times(conn, series_id, new_start, new_end)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("series {series_id} not found")))
}
