//! Menu Decomposer - splits a menu record into restaurant, category and item rows
//!
//! Rows are written parents first so every foreign key is satisfied at the
//! moment of insertion: restaurant, then each category followed by its items.

use rusqlite::{Connection, params};
use uuid::Uuid;
use crate::Result;
use crate::record::{MenuCategory, MenuRecord};

/// What a decomposed menu wrote
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MenuSummary {
    pub url: String,
    /// Generated category ids, in input order
    pub category_ids: Vec<String>,
    pub items: usize,
}

/// Insert the restaurant, its categories and their items.
///
/// Each category gets a fresh random id; names are not keys, so two
/// categories called "Mains" become two rows.
pub fn decompose_menu(conn: &Connection, menu: &MenuRecord) -> Result<MenuSummary> {
    insert_restaurant(conn, menu)?;

    let mut category_ids = Vec::with_capacity(menu.menu_categories.len());
    let mut items = 0;
    for category in &menu.menu_categories {
        let id = new_category_id();
        insert_category(conn, &id, &menu.url, category)?;
        items += insert_items(conn, &id, category)?;
        category_ids.push(id);
    }

    Ok(MenuSummary {
        url: menu.url.clone(),
        category_ids,
        items,
    })
}

fn new_category_id() -> String {
    Uuid::new_v4().to_string()
}

fn insert_restaurant(conn: &Connection, menu: &MenuRecord) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO restaurants (url, name, avg_rating, address, description)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            menu.url,
            menu.name,
            menu.avg_rating,
            menu.street_address,
            menu.description,
        ],
    )?;
    Ok(())
}

fn insert_category(conn: &Connection, id: &str, restaurant_url: &str, category: &MenuCategory) -> Result<()> {
    conn.execute(
        "INSERT INTO menu_categories (id, name, restaurant_id) VALUES (?1, ?2, ?3)",
        params![id, category.name, restaurant_url],
    )?;
    Ok(())
}

fn insert_items(conn: &Connection, category_id: &str, category: &MenuCategory) -> Result<usize> {
    let mut stmt = conn.prepare_cached(
        r#"
        INSERT INTO items (name, price, is_popular, menu_category_id)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )?;

    let mut written = 0;
    for product in &category.products {
        written += stmt.execute(params![product.name, product.price, product.is_popular, category_id])?;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::record::Product;
    use crate::storage::SqliteStore;

    fn product(name: &str, price: i64, is_popular: bool) -> Product {
        Product { name: name.to_string(), price, is_popular }
    }

    fn category(name: &str, products: Vec<Product>) -> MenuCategory {
        MenuCategory { name: name.to_string(), products }
    }

    fn sample_menu(url: &str, categories: Vec<MenuCategory>) -> MenuRecord {
        MenuRecord {
            url: url.to_string(),
            name: "Pasta Place".to_string(),
            avg_rating: Some(4.5),
            street_address: Some("1 High St".to_string()),
            description: Some("Fresh pasta".to_string()),
            tags: Vec::new(),
            menu_categories: categories,
        }
    }

    #[test]
    fn test_rows_reference_restaurant() {
        let store = SqliteStore::open_in_memory().unwrap();
        let menu = sample_menu(
            "https://r/menu/pasta",
            vec![
                category("Mains", vec![product("Carbonara", 1150, true), product("Pesto", 990, false)]),
                category("Sides", vec![product("Bread", 350, false)]),
            ],
        );

        let summary = decompose_menu(store.connection(), &menu).unwrap();
        assert_eq!(summary.items, 3);

        let restaurant = store.restaurant("https://r/menu/pasta").unwrap().unwrap();
        assert_eq!(restaurant.url, menu.url);
        assert_eq!(restaurant.address.as_deref(), Some("1 High St"));

        let categories = store.categories_for(&menu.url).unwrap();
        assert_eq!(categories.len(), 2);
        assert!(categories.iter().all(|c| c.restaurant_url == menu.url));
        assert_eq!(
            categories.iter().map(|c| c.id.clone()).collect::<Vec<_>>(),
            summary.category_ids
        );

        let mains = store.items_in(&categories[0].id).unwrap();
        assert_eq!(mains.len(), 2);
        assert_eq!(mains[0].name, "Carbonara");
        assert_eq!(mains[0].price, 1150);
        assert!(mains[0].is_popular);
        assert!(!mains[1].is_popular);
        assert_eq!(store.items_in(&categories[1].id).unwrap().len(), 1);
    }

    #[test]
    fn test_same_named_categories_get_distinct_ids() {
        let store = SqliteStore::open_in_memory().unwrap();
        let menu = sample_menu(
            "r1",
            vec![category("Mains", vec![]), category("Mains", vec![product("Soup", 500, false)])],
        );

        let summary = decompose_menu(store.connection(), &menu).unwrap();
        assert_eq!(summary.category_ids.len(), 2);
        assert_ne!(summary.category_ids[0], summary.category_ids[1]);
        assert!(summary.category_ids.iter().all(|id| Uuid::parse_str(id).is_ok()));
        assert_eq!(store.count_rows("menu_categories").unwrap(), 2);
    }

    #[test]
    fn test_missing_rating_stored_as_null() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut menu = sample_menu("r1", vec![]);
        menu.avg_rating = None;
        menu.description = None;

        decompose_menu(store.connection(), &menu).unwrap();

        let restaurant = store.restaurant("r1").unwrap().unwrap();
        assert_eq!(restaurant.avg_rating, None);
        assert_eq!(restaurant.description, None);
    }

    #[test]
    fn test_repeated_restaurant_is_constraint_violation() {
        let store = SqliteStore::open_in_memory().unwrap();
        let menu = sample_menu("r1", vec![]);

        decompose_menu(store.connection(), &menu).unwrap();
        let err = decompose_menu(store.connection(), &menu).unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));
    }
}
