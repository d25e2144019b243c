//! Tag Normalizer - shared tag reference data plus per-restaurant links
//!
//! Tag types and tags are accumulated across every record of a run, in no
//! particular order and possibly from concurrent workers. Both are written
//! with `INSERT OR IGNORE`: the first writer of a name wins, later writers
//! are silent no-ops. A tag that already exists keeps its original type.

use std::collections::BTreeSet;
use rusqlite::{Connection, params};
use crate::Result;
use crate::record::TagEntry;

/// What a normalization pass wrote
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct TagSummary {
    /// Tag types that did not exist before this record
    pub new_tag_types: usize,
    /// Tags that did not exist before this record
    pub new_tags: usize,
    /// Rows added to tags_restaurants
    pub links: usize,
}

/// Upsert the record's tag types and tags, then link each distinct tag name
/// to the restaurant. The restaurant row must already exist.
pub fn normalize_tags(conn: &Connection, restaurant_url: &str, tags: &[TagEntry]) -> Result<TagSummary> {
    if tags.is_empty() {
        return Ok(TagSummary::default());
    }

    let tag_types: BTreeSet<&str> = tags.iter().map(|t| t.tag_type.as_str()).collect();
    let new_tag_types = insert_tag_types(conn, &tag_types)?;
    let new_tags = insert_tags(conn, tags)?;

    let names: BTreeSet<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    let links = link_tags(conn, restaurant_url, &names)?;

    Ok(TagSummary { new_tag_types, new_tags, links })
}

fn insert_tag_types(conn: &Connection, tag_types: &BTreeSet<&str>) -> Result<usize> {
    let mut stmt = conn.prepare_cached("INSERT OR IGNORE INTO tag_types (name) VALUES (?1)")?;
    let mut inserted = 0;
    for tag_type in tag_types {
        inserted += stmt.execute([*tag_type])?;
    }
    Ok(inserted)
}

fn insert_tags(conn: &Connection, tags: &[TagEntry]) -> Result<usize> {
    let mut stmt = conn.prepare_cached("INSERT OR IGNORE INTO tags (name, tag_type_id) VALUES (?1, ?2)")?;
    let mut inserted = 0;
    for tag in tags {
        inserted += stmt.execute(params![tag.name, tag.tag_type])?;
    }
    Ok(inserted)
}

fn link_tags(conn: &Connection, restaurant_url: &str, names: &BTreeSet<&str>) -> Result<usize> {
    let mut stmt = conn.prepare_cached("INSERT INTO tags_restaurants (restaurant_id, tag_id) VALUES (?1, ?2)")?;
    let mut written = 0;
    for name in names {
        written += stmt.execute([restaurant_url, *name])?;
    }
    Ok(written)
}
