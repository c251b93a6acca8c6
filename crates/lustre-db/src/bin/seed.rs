//! # Seed Data Generator
//!
//! Populates a development database with cosmetics stock for one vendor.
//!
//! ## Usage
//! ```bash
//! # Default vendor and path
//! cargo run -p lustre-db --bin seed
//!
//! # Custom vendor, database and a demo loyalty customer
//! cargo run -p lustre-db --bin seed -- --vendor shop-42 --db ./data/lustre.db --customer
//! ```
//!
//! Every product is generated in each shade, with prices and quantities
//! spread so the grid shows in-stock, low-stock and out-of-stock badges.

use std::env;

use lustre_core::NewStockItem;
use lustre_db::{Database, DbConfig};

/// (category, products, base price in cents)
const CATALOG: &[(&str, &[&str], i64)] = &[
    (
        "Lips",
        &["Matte Lipstick", "Lip Gloss", "Lip Liner", "Tinted Lip Balm"],
        45_000,
    ),
    (
        "Eyes",
        &["Kajal", "Mascara", "Eyeliner Pen", "Eyeshadow Palette"],
        60_000,
    ),
    (
        "Face",
        &["Foundation", "Compact Powder", "Concealer", "Blush"],
        95_000,
    ),
    (
        "Skincare",
        &["Rose Face Wash", "Aloe Toner", "Night Cream", "Sunscreen SPF50"],
        75_000,
    ),
    (
        "Bath",
        &["Herbal Soap", "Sandalwood Soap", "Body Lotion", "Shower Gel"],
        20_000,
    ),
];

/// Shade or size variants with a price addon in cents.
const VARIANTS: &[(&str, i64)] = &[("Classic", 0), ("Ruby", 5_000), ("Nude", 2_500)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut vendor_id = String::from("demo-vendor");
    let mut db_path = String::from("./lustre_dev.db");
    let mut with_customer = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--vendor" | "-v" => {
                if let Some(value) = args.get(i + 1) {
                    vendor_id = value.clone();
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if let Some(value) = args.get(i + 1) {
                    db_path = value.clone();
                    i += 1;
                }
            }
            "--customer" => with_customer = true,
            "--help" | "-h" => {
                println!("Lustre POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -v, --vendor <ID>  Vendor to seed (default: demo-vendor)");
                println!("  -d, --db <PATH>    Database file path (default: ./lustre_dev.db)");
                println!("      --customer     Also register a demo loyalty customer");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Lustre POS Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Vendor:   {}", vendor_id);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing = db.stock().count_for_vendor(&vendor_id).await?;
    if existing > 0 {
        println!("⚠ Vendor already has {} stock items, skipping", existing);
        return Ok(());
    }

    let mut generated = 0usize;
    for (category, products, base_price) in CATALOG {
        for product in products.iter() {
            for (variant, addon) in VARIANTS {
                let item = generate_item(category, product, variant, base_price + addon, generated);
                if let Err(e) = db.stock().insert(&vendor_id, &item).await {
                    eprintln!("Failed to insert {}: {}", item.product_name, e);
                    continue;
                }
                generated += 1;
            }
        }
    }
    println!("✓ Generated {} stock items", generated);

    if with_customer {
        match db.customers().insert(&vendor_id, "Demo Customer", "0771234567").await {
            Ok(c) => println!("✓ Registered customer {} ({})", c.name, c.phone),
            Err(e) => eprintln!("Customer not registered: {}", e),
        }
    }

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

/// Builds one stock item. `seed` spreads quantities across 0..=30 so every
/// stock status shows up.
fn generate_item(category: &str, product: &str, variant: &str, price_cents: i64, seed: usize) -> NewStockItem {
    // Cost at 55-70% of price
    let cost_pct = 55 + (seed % 16) as i64;

    NewStockItem {
        product_name: format!("{} {}", product, variant),
        quantity: ((seed * 7) % 31) as i64,
        cost_cents: Some(price_cents * cost_pct / 100),
        price_cents,
        category: Some(category.to_string()),
        low_stock_threshold: lustre_core::DEFAULT_LOW_STOCK_THRESHOLD,
    }
}
