//! Demo data: the starter menu and a student account to try orders with.

use tracing::info;

use crate::commands::items;
use crate::db::Database;
use crate::error::AppResult;
use crate::models::{ItemFilter, NewItem};

pub const DEMO_USER_ID: &str = "student";
pub const DEMO_USER_PASSWORD: &str = "123";
pub const DEMO_WALLET: f64 = 500.0;
pub const DEMO_POINTS: i64 = 100;

fn menu_item(
    id: i64,
    name: &str,
    price: f64,
    category: &str,
    dietary: &str,
    description: &str,
    calories: i64,
    protein: &str,
    allergens: &[&str],
    tags: &[&str],
) -> NewItem {
    NewItem {
        id: Some(id),
        name: name.to_string(),
        price,
        category: category.to_string(),
        dietary: dietary.to_string(),
        image: String::new(),
        description: Some(description.to_string()),
        calories: Some(calories),
        protein: Some(protein.to_string()),
        allergens: allergens.iter().map(|a| a.to_string()).collect(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        stock: None,
    }
}

pub fn default_menu() -> Vec<NewItem> {
    vec![
        menu_item(
            1,
            "Veg Burger",
            50.0,
            "Snacks",
            "Veg",
            "Classic veggie patty with fresh lettuce and sauce.",
            350,
            "12g",
            &["Gluten", "Dairy"],
            &["Vegetarian"],
        ),
        menu_item(
            2,
            "Chicken Sandwich",
            80.0,
            "Snacks",
            "Non-Veg",
            "Grilled chicken with mayo and cheese.",
            450,
            "25g",
            &["Gluten", "Dairy", "Egg"],
            &["High-Protein", "Non-Veg"],
        ),
        menu_item(
            3,
            "Cold Coffee",
            40.0,
            "Beverages",
            "Veg",
            "Chilled brewed coffee with ice cream.",
            220,
            "5g",
            &["Dairy"],
            &["Vegetarian", "Sweet"],
        ),
        menu_item(
            4,
            "Masala Dosa",
            60.0,
            "Breakfast",
            "Veg",
            "Crispy crepe with spiced potato filling.",
            300,
            "6g",
            &[],
            &["Vegan", "Gluten-Free"],
        ),
        menu_item(
            5,
            "Rajma Rice Bowl",
            90.0,
            "Lunch",
            "Veg",
            "Comforting kidney beans curry with steamed rice.",
            400,
            "14g",
            &[],
            &["Vegan", "High-Fiber"],
        ),
    ]
}

/// Creates the demo student if missing and loads the default menu when the
/// menu is empty. Safe to run on every start.
pub fn seed_demo(db: &Database) -> AppResult<()> {
    {
        let conn = db.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO users (id, name, password, role, wallet, points)
             VALUES (?1, 'Student User', ?2, 'user', ?3, ?4)",
            rusqlite::params![DEMO_USER_ID, DEMO_USER_PASSWORD, DEMO_WALLET, DEMO_POINTS],
        )?;
        if inserted > 0 {
            info!("Seeded user: {DEMO_USER_ID} / {DEMO_USER_PASSWORD}");
        }
    }

    if items::list_items(db, &ItemFilter::default())?.is_empty() {
        items::seed_items(db, default_menu())?;
    }

    Ok(())
}
