//! SQLite storage implementation

use std::path::Path;
use std::time::Duration;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use crate::{Error, Result};
use super::schema;

/// Connection-level settings applied whenever a store is opened
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// How long a writer waits for the database lock before failing
    pub busy_timeout: Duration,
    /// Use write-ahead logging so readers don't block the single writer
    pub wal: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(5000),
            wal: true,
        }
    }
}

/// SQLite-backed storage for the normalized restaurant schema.
///
/// A store owns exactly one connection. Concurrent workers each open
/// their own store against the same file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates it and its schema if missing)
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, StoreOptions::default())
    }

    /// Open a database file with explicit connection options
    pub fn open_with(path: &Path, options: StoreOptions) -> Result<Self> {
        let store = Self::connect(path, options)?;
        store.initialize_schema()?;
        Ok(store)
    }

    /// Connect to a database whose schema already exists
    pub fn connect(path: &Path, options: StoreOptions) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.configure(options)?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.configure(StoreOptions { wal: false, ..StoreOptions::default() })?;
        store.initialize_schema()?;
        Ok(store)
    }

    fn configure(&self, options: StoreOptions) -> Result<()> {
        // Foreign keys are off by default in SQLite and are per-connection
        self.conn.pragma_update(None, "foreign_keys", true)?;
        self.conn.busy_timeout(options.busy_timeout)?;
        if options.wal {
            let mode: String = self.conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            tracing::debug!("journal_mode = {}", mode);
        }
        Ok(())
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Begin a write transaction for one record.
    ///
    /// The write lock is taken immediately, so a concurrent writer waits on
    /// the busy timeout here rather than failing halfway through a record.
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
    }

    /// Borrow the underlying connection for reads
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ========== Customer Operations ==========

    /// Seed customer postcodes, skipping blanks and ones already present.
    /// Returns the number of rows actually inserted.
    pub fn seed_customers<I, S>(&mut self, postcodes: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tx = self.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached("INSERT OR IGNORE INTO customers (postcode) VALUES (?1)")?;
            for postcode in postcodes {
                let postcode = postcode.as_ref().trim();
                if postcode.is_empty() {
                    continue;
                }
                inserted += stmt.execute([postcode])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    // ========== Read Operations ==========

    /// Get a restaurant by url
    pub fn restaurant(&self, url: &str) -> Result<Option<RestaurantRow>> {
        self.conn
            .query_row(
                "SELECT url, name, avg_rating, address, description FROM restaurants WHERE url = ?1",
                [url],
                |row| {
                    Ok(RestaurantRow {
                        url: row.get(0)?,
                        name: row.get(1)?,
                        avg_rating: row.get(2)?,
                        address: row.get(3)?,
                        description: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Menu categories belonging to a restaurant, in insertion order
    pub fn categories_for(&self, url: &str) -> Result<Vec<CategoryRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, restaurant_id FROM menu_categories WHERE restaurant_id = ?1 ORDER BY rowid",
        )?;

        let categories = stmt
            .query_map([url], |row| {
                Ok(CategoryRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    restaurant_url: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(categories)
    }

    /// Items belonging to a menu category, in insertion order
    pub fn items_in(&self, category_id: &str) -> Result<Vec<ItemRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, price, is_popular, menu_category_id FROM items WHERE menu_category_id = ?1 ORDER BY id",
        )?;

        let items = stmt
            .query_map([category_id], |row| {
                Ok(ItemRow {
                    name: row.get(0)?,
                    price: row.get(1)?,
                    is_popular: row.get(2)?,
                    category_id: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(items)
    }

    /// Get a tag by name
    pub fn tag(&self, name: &str) -> Result<Option<TagRow>> {
        self.conn
            .query_row(
                "SELECT name, tag_type_id FROM tags WHERE name = ?1",
                [name],
                |row| Ok(TagRow { name: row.get(0)?, tag_type: row.get(1)? }),
            )
            .optional()
            .map_err(Into::into)
    }

    /// All tag type names, sorted
    pub fn tag_types(&self) -> Result<Vec<String>> {
        self.strings("SELECT name FROM tag_types ORDER BY name", params![])
    }

    /// Tag names linked to a restaurant, one entry per link row
    pub fn tags_for(&self, url: &str) -> Result<Vec<String>> {
        self.strings(
            "SELECT tag_id FROM tags_restaurants WHERE restaurant_id = ?1 ORDER BY id",
            params![url],
        )
    }

    /// Restaurant urls linked to a postcode, one entry per link row
    pub fn links_for(&self, postcode: &str) -> Result<Vec<String>> {
        self.strings(
            "SELECT restaurant_id FROM customers_to_restaurants WHERE customer_id = ?1 ORDER BY id",
            params![postcode],
        )
    }

    fn strings(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let values = stmt
            .query_map(args, |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(values)
    }

    /// Count the rows of one schema table
    pub fn count_rows(&self, table: &str) -> Result<usize> {
        if !schema::TABLES.contains(&table) {
            return Err(Error::Storage(rusqlite::Error::InvalidParameterName(table.to_string())));
        }
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let tables = schema::TABLES
            .iter()
            .map(|table| -> Result<(&'static str, usize)> { Ok((*table, self.count_rows(table)?)) })
            .collect::<Result<Vec<_>>>()?;
        Ok(DbStats { tables })
    }
}

/// A persisted restaurant row
#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantRow {
    pub url: String,
    pub name: String,
    pub avg_rating: Option<f64>,
    pub address: Option<String>,
    pub description: Option<String>,
}

/// A persisted menu category row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow {
    pub id: String,
    pub name: String,
    pub restaurant_url: String,
}

/// A persisted item row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRow {
    pub name: String,
    pub price: i64,
    pub is_popular: bool,
    pub category_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRow {
    pub name: String,
    pub tag_type: String,
}

/// Database statistics: row count per table
#[derive(Debug, Clone)]
pub struct DbStats {
    pub tables: Vec<(&'static str, usize)>,
}

impl DbStats {
    pub fn get(&self, table: &str) -> usize {
        self.tables
            .iter()
            .find(|(name, _)| *name == table)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        for (table, count) in &self.tables {
            writeln!(f, "  {}: {}", table, count)?;
        }
        Ok(())
    }
}
