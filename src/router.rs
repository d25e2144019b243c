//! Item Router - classifies a record and persists it in one transaction

use rusqlite::Connection;
use crate::Result;
use crate::linker::link_restaurants;
use crate::menu::{MenuSummary, decompose_menu};
use crate::record::{Record, RecordKind};
use crate::storage::SqliteStore;
use crate::tags::{TagSummary, normalize_tags};

/// What a committed record wrote to the store
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outcome {
    Discovery {
        postcode: String,
        links: usize,
    },
    Menu {
        menu: MenuSummary,
        tags: TagSummary,
    },
}

impl Outcome {
    pub fn kind(&self) -> RecordKind {
        match self {
            Outcome::Discovery { .. } => RecordKind::Discovery,
            Outcome::Menu { .. } => RecordKind::Menu,
        }
    }
}

/// Routes records to the linker or the menu/tag decomposers.
///
/// Holds no connection of its own: the caller passes the store for each
/// record, so one router can serve any number of worker connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordRouter;

impl RecordRouter {
    pub fn new() -> Self {
        Self
    }

    /// Decode one JSON line and route it.
    /// Unrecognized shapes fail before a transaction is opened.
    pub fn ingest_line(&self, store: &mut SqliteStore, line: &str) -> Result<Outcome> {
        let record = Record::from_json(line)?;
        self.route(store, &record)
    }

    /// Persist one record atomically: commit on success, roll back on any
    /// failure so no partial record is ever visible.
    pub fn route(&self, store: &mut SqliteStore, record: &Record) -> Result<Outcome> {
        let tx = store.transaction()?;
        match Self::dispatch(&tx, record) {
            Ok(outcome) => {
                tx.commit()?;
                tracing::debug!("Committed {} record", outcome.kind());
                Ok(outcome)
            }
            Err(e) => {
                tx.rollback()?;
                tracing::debug!("Rolled back {} record: {}", record.kind(), e);
                Err(e)
            }
        }
    }

    fn dispatch(conn: &Connection, record: &Record) -> Result<Outcome> {
        match record {
            Record::Restaurants(discovery) => {
                let links = link_restaurants(conn, discovery)?;
                Ok(Outcome::Discovery {
                    postcode: discovery.postcode.clone(),
                    links,
                })
            }
            Record::Menu(menu) => {
                // Restaurant row first: tag links reference it
                let summary = decompose_menu(conn, menu)?;
                let tags = normalize_tags(conn, &menu.url, &menu.tags)?;
                Ok(Outcome::Menu { menu: summary, tags })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;

    const SOUP_MENU: &str = r#"{"menu": {"url": "r1", "name": "X", "avg_rating": "4.5", "street_address": "a", "description": "d", "tags": [{"name": "Vegan", "type": "Diet"}], "menu_categories": [{"name": "Mains", "products": [{"name": "Soup", "price": 500, "is_popular": true}]}]}}"#;

    #[test]
    fn test_end_to_end_menu() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let router = RecordRouter::new();

        let outcome = router.ingest_line(&mut store, SOUP_MENU).unwrap();
        assert_eq!(outcome.kind(), RecordKind::Menu);

        let stats = store.stats().unwrap();
        assert_eq!(stats.get("restaurants"), 1);
        assert_eq!(stats.get("tag_types"), 1);
        assert_eq!(stats.get("tags"), 1);
        assert_eq!(stats.get("tags_restaurants"), 1);
        assert_eq!(stats.get("menu_categories"), 1);
        assert_eq!(stats.get("items"), 1);

        let restaurant = store.restaurant("r1").unwrap().unwrap();
        assert_eq!(restaurant.avg_rating, Some(4.5));
        assert_eq!(store.tag_types().unwrap(), vec!["Diet"]);
        assert_eq!(store.tag("Vegan").unwrap().unwrap().tag_type, "Diet");
        assert_eq!(store.tags_for("r1").unwrap(), vec!["Vegan"]);

        let categories = store.categories_for("r1").unwrap();
        assert_eq!(categories[0].name, "Mains");
        let items = store.items_in(&categories[0].id).unwrap();
        assert_eq!(items[0].name, "Soup");
        assert_eq!(items[0].price, 500);
        assert!(items[0].is_popular);
        assert_eq!(items[0].category_id, categories[0].id);
    }

    #[test]
    fn test_discovery_record() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.seed_customers(["NW1 8AB"]).unwrap();
        let router = RecordRouter::new();
        let line = r#"{"restaurants": {"postcode": "NW1 8AB", "urls": ["u1", "u2", "u3"]}}"#;

        let outcome = router.ingest_line(&mut store, line).unwrap();
        assert_eq!(outcome, Outcome::Discovery { postcode: "NW1 8AB".to_string(), links: 3 });

        router.ingest_line(&mut store, line).unwrap();
        assert_eq!(store.links_for("NW1 8AB").unwrap().len(), 6);
    }

    #[test]
    fn test_unparseable_rating_still_commits() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let router = RecordRouter::new();

        let line = json!({"menu": {"url": "r1", "name": "X", "avg_rating": "n/a"}}).to_string();
        router.ingest_line(&mut store, &line).unwrap();
        let line = json!({"menu": {"url": "r2", "name": "Y"}}).to_string();
        router.ingest_line(&mut store, &line).unwrap();

        assert_eq!(store.restaurant("r1").unwrap().unwrap().avg_rating, None);
        assert_eq!(store.restaurant("r2").unwrap().unwrap().avg_rating, None);
    }

    #[test]
    fn test_unrecognized_record_touches_nothing() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let router = RecordRouter::new();

        let err = router.ingest_line(&mut store, r#"{"error": {"url": "r1"}}"#).unwrap_err();
        assert!(matches!(err, Error::Classification(_)));
        assert!(store.stats().unwrap().tables.iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn test_reprocessed_menu_rolls_back_completely() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let router = RecordRouter::new();
        router.ingest_line(&mut store, SOUP_MENU).unwrap();
        let before = store.stats().unwrap();

        let err = router.ingest_line(&mut store, SOUP_MENU).unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));

        let after = store.stats().unwrap();
        assert_eq!(before.tables, after.tables);
    }

    #[test]
    fn test_failure_late_in_record_leaves_no_partial_rows() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let router = RecordRouter::new();

        // Tag links are the last write of a menu record
        let line = json!({"menu": {
            "url": "r9", "name": "Z",
            "tags": [{"name": "Vegan", "type": "Diet"}],
            "menu_categories": [{"name": "Mains", "products": [{"name": "Soup", "price": 500}]}]
        }})
        .to_string();
        store
            .connection()
            .execute_batch(
                "CREATE TRIGGER reject_links BEFORE INSERT ON tags_restaurants
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let err = router.ingest_line(&mut store, &line).unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));

        assert!(store.restaurant("r9").unwrap().is_none());
        assert_eq!(store.count_rows("menu_categories").unwrap(), 0);
        assert_eq!(store.count_rows("items").unwrap(), 0);
        assert_eq!(store.count_rows("tags").unwrap(), 0);
    }

    #[test]
    fn test_shared_tag_across_menus_single_row() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let router = RecordRouter::new();

        for url in ["r1", "r2", "r3"] {
            let line = json!({"menu": {"url": url, "name": "N", "tags": [
                {"name": "Vegan", "type": "Diet"}, {"name": "Thai", "type": "Cuisine"}
            ]}})
            .to_string();
            router.ingest_line(&mut store, &line).unwrap();
        }

        assert_eq!(store.count_rows("tags").unwrap(), 2);
        assert_eq!(store.count_rows("tag_types").unwrap(), 2);
        assert_eq!(store.count_rows("tags_restaurants").unwrap(), 6);
    }
}
