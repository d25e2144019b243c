//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - customers(postcode)
//! - restaurants(url, name, avg_rating, address, description)
//! - customers_to_restaurants(customer_id, restaurant_id)
//! - menu_categories(id, name, restaurant_id)
//! - items(name, price, is_popular, menu_category_id)
//! - tag_types(name)
//! - tags(name, tag_type_id)
//! - tags_restaurants(restaurant_id, tag_id)

pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteStore, StoreOptions, RestaurantRow, CategoryRow, ItemRow, TagRow, DbStats};
