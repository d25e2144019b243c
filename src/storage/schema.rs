//! Database schema definitions

/// SQL to create the customers table (seeded, never written by ingest)
pub const CREATE_CUSTOMERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS customers (
    postcode TEXT PRIMARY KEY
)
"#;

/// SQL to create the restaurants table
pub const CREATE_RESTAURANTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS restaurants (
    url TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    avg_rating REAL,
    address TEXT,
    description TEXT
)
"#;

/// SQL to create the customers_to_restaurants join table.
/// Duplicate (customer, restaurant) pairs are allowed; restaurant_id has no
/// FK because discovery records arrive before the menus they point at.
pub const CREATE_CUSTOMERS_TO_RESTAURANTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS customers_to_restaurants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id TEXT NOT NULL REFERENCES customers(postcode),
    restaurant_id TEXT NOT NULL
)
"#;

/// SQL to create the menu_categories table
pub const CREATE_MENU_CATEGORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS menu_categories (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    restaurant_id TEXT NOT NULL REFERENCES restaurants(url)
)
"#;

/// SQL to create the items table
pub const CREATE_ITEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    price INTEGER NOT NULL,
    is_popular INTEGER NOT NULL DEFAULT 0,
    menu_category_id TEXT NOT NULL REFERENCES menu_categories(id)
)
"#;

/// SQL to create the tag_types table
pub const CREATE_TAG_TYPES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tag_types (
    name TEXT PRIMARY KEY
)
"#;

/// SQL to create the tags table
pub const CREATE_TAGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tags (
    name TEXT PRIMARY KEY,
    tag_type_id TEXT NOT NULL REFERENCES tag_types(name)
)
"#;

/// SQL to create the tags_restaurants join table
pub const CREATE_TAGS_RESTAURANTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tags_restaurants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    restaurant_id TEXT NOT NULL REFERENCES restaurants(url),
    tag_id TEXT NOT NULL REFERENCES tags(name)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_links_customer ON customers_to_restaurants(customer_id)",
    "CREATE INDEX IF NOT EXISTS idx_categories_restaurant ON menu_categories(restaurant_id)",
    "CREATE INDEX IF NOT EXISTS idx_items_category ON items(menu_category_id)",
    "CREATE INDEX IF NOT EXISTS idx_tags_type ON tags(tag_type_id)",
    "CREATE INDEX IF NOT EXISTS idx_tags_restaurants_restaurant ON tags_restaurants(restaurant_id)",
];

/// Every table, parents before children
pub const TABLES: &[&str] = &[
    "customers",
    "restaurants",
    "customers_to_restaurants",
    "menu_categories",
    "items",
    "tag_types",
    "tags",
    "tags_restaurants",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_CUSTOMERS_TABLE,
        CREATE_RESTAURANTS_TABLE,
        CREATE_CUSTOMERS_TO_RESTAURANTS_TABLE,
        CREATE_MENU_CATEGORIES_TABLE,
        CREATE_ITEMS_TABLE,
        CREATE_TAG_TYPES_TABLE,
        CREATE_TAGS_TABLE,
        CREATE_TAGS_RESTAURANTS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
