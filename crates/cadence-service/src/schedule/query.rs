//! Read path for materialized instances.

use uuid::Uuid;

use crate::error::ServiceResult;
use cadence_core::recurrence::DateWindow;
use cadence_db::db::connection::DbConnection;
use cadence_db::db::query::{instance, rule};
use cadence_db::model::instance::CalendarInstance;

/// One page of instances plus a staleness signal.
///
/// Reads never wait on horizon extension: when `horizon_stale` is set the
/// caller should trigger an asynchronous extension and serve this data
/// as-is.
#[derive(Debug)]
pub struct InstancesPage {
    pub instances: Vec<CalendarInstance>,
    pub horizon_stale: bool,
}

/// ## Summary
/// Returns the specialist's instances within the window, ordered by date
/// then start time, reading only what is currently materialized.
///
/// `horizon_stale` is set when the window reaches past the watermark of any
/// of the specialist's open-ended series.
///
/// ## Errors
/// Returns an error if the database operations fail.
#[tracing::instrument(skip(conn), fields(window_start = %window.start(), window_end = %window.end()))]
pub async fn query_instances(
    conn: &mut DbConnection<'_>,
    specialist_id: Uuid,
    window: DateWindow,
) -> ServiceResult<InstancesPage> {
    let instances = instance::in_range(conn, specialist_id, window.start(), window.end()).await?;

    let open_rules = rule::open_ended_for_specialist(conn, specialist_id).await?;
    let horizon_stale = open_rules
        .iter()
        .any(|r| r.materialized_through.map_or(true, |through| window.end() > through));

    if horizon_stale {
        tracing::debug!("Window reaches past the materialized horizon");
    }

    Ok(InstancesPage {
        instances,
        horizon_stale,
    })
}
