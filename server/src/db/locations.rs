//! Loading the location directory snapshot.

use outpost_engine::{Location, LocationIndex};
use sqlx::{PgExecutor, Row};

/// Read the full location directory into an engine snapshot.
///
/// One snapshot is loaded per sync request so scope membership cannot
/// shift between resolving the scope and fetching records.
pub async fn load_location_index<'e>(
    executor: impl PgExecutor<'e>,
) -> Result<LocationIndex, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, country, cluster
        FROM locations
        "#,
    )
    .fetch_all(executor)
    .await?;

    let mut locations = Vec::with_capacity(rows.len());
    for row in rows {
        let mut location = Location::new(
            row.try_get::<String, _>("id")?,
            row.try_get::<String, _>("country")?,
        );
        if let Some(cluster) = row.try_get::<Option<String>, _>("cluster")? {
            location = location.in_cluster(cluster);
        }
        locations.push(location);
    }

    Ok(LocationIndex::new(locations))
}
