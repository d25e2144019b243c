//! Relation Linker - expands discovery records into customer/restaurant links

use rusqlite::Connection;
use crate::Result;
use crate::record::Discovery;

/// Write one `customers_to_restaurants` row per discovered url.
///
/// Links are not deduplicated: seeing a restaurant again under the same
/// postcode records another sighting. Returns the number of rows written.
pub fn link_restaurants(conn: &Connection, discovery: &Discovery) -> Result<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO customers_to_restaurants (customer_id, restaurant_id) VALUES (?1, ?2)",
    )?;

    let mut written = 0;
    for url in &discovery.urls {
        written += stmt.execute([discovery.postcode.as_str(), url.as_str()])?;
    }

    tracing::debug!("Linked {} restaurants to {}", written, discovery.postcode);
    Ok(written)
}
