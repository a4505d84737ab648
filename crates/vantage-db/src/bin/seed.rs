//! # Seed Data Generator
//!
//! Populates a database with products and customers for development.
//!
//! ## Usage
//! ```bash
//! # 200 products, 25 customers (default)
//! cargo run -p vantage-db --bin seed
//!
//! # Custom amounts and path
//! cargo run -p vantage-db --bin seed -- --count 1000 --customers 100 --db ./data/vantage.db
//! ```
//!
//! Every product gets SKU `{CATEGORY}-{NNNN}`, a price between $0.99 and
//! $49.99 and stock between 0 and 60, so some start below the low-stock
//! threshold.

use std::env;

use uuid::Uuid;
use vantage_core::{Customer, Product, DEFAULT_LOW_STOCK_THRESHOLD};
use vantage_db::{Database, DbConfig};

const CATEGORIES: &[(&str, &[&str])] = &[
    ("MUG", &["Ceramic Mug", "Travel Mug", "Espresso Cup", "Latte Glass"]),
    ("TEA", &["Green Tea", "Earl Grey", "Chamomile", "Rooibos", "Chai"]),
    ("COF", &["House Blend", "Dark Roast", "Decaf", "Single Origin"]),
    ("BAK", &["Croissant", "Muffin", "Bagel", "Scone", "Cookie"]),
    ("ACC", &["Filter Papers", "Grinder", "Kettle", "French Press"]),
];

const FIRST_NAMES: &[&str] = &["Ada", "Grace", "Alan", "Edsger", "Barbara", "Ken", "Radia"];
const LAST_NAMES: &[&str] = &["Lovelace", "Hopper", "Turing", "Dijkstra", "Liskov", "Thompson", "Perlman"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut customers: usize = 25;
    let mut db_path = String::from("./vantage_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(count);
                    i += 1;
                }
            }
            "--customers" => {
                if i + 1 < args.len() {
                    customers = args[i + 1].parse().unwrap_or(customers);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Vantage POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>      Number of products (default: 200)");
                println!("      --customers <N>  Number of customers (default: 25)");
                println!("  -d, --db <PATH>      Database file path (default: ./vantage_dev.db)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Vantage POS Seed Data Generator");
    println!("===============================");
    println!("Database:  {}", db_path);
    println!("Products:  {}", count);
    println!("Customers: {}", customers);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing = db.product_count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products, skipping seed.", existing);
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut generated = 0;
    'outer: for (category, names) in CATEGORIES {
        for name in names.iter() {
            for variant in 0..(count / (CATEGORIES.len() * names.len()) + 1) {
                if generated >= count {
                    break 'outer;
                }
                let product = generate_product(category, name, variant, generated);
                if let Err(e) = db.insert_product(&product).await {
                    eprintln!("Failed to insert {}: {}", product.name, e);
                    continue;
                }
                generated += 1;
            }
        }
    }
    println!("✓ Generated {} products in {:?}", generated, start.elapsed());

    let mut created = 0;
    for n in 0..customers {
        let customer = generate_customer(n);
        if let Err(e) = db.insert_customer(&customer).await {
            eprintln!("Failed to insert {}: {}", customer.email, e);
            continue;
        }
        created += 1;
    }
    println!("✓ Generated {} customers", created);

    db.close().await;
    println!();
    println!("✓ Seed complete!");
    Ok(())
}

fn generate_product(category: &str, name: &str, variant: usize, seed: usize) -> Product {
    let price_cents = 99 + ((seed * 37) % 4900) as i64;
    let stock = (seed % 61) as i64;

    let mut product = Product::new(
        Uuid::new_v4().to_string(),
        format!("{} #{}", name, variant + 1),
        vantage_core::Money::from_cents(price_cents),
        stock,
    );
    product.sku = Some(format!("{}-{:04}", category, seed));
    product.low_stock_threshold = DEFAULT_LOW_STOCK_THRESHOLD;
    product
}

fn generate_customer(n: usize) -> Customer {
    let first = FIRST_NAMES[n % FIRST_NAMES.len()];
    let last = LAST_NAMES[(n / FIRST_NAMES.len()) % LAST_NAMES.len()];
    Customer::new(
        Uuid::new_v4().to_string(),
        first,
        last,
        format!("{}.{}.{}@example.com", first.to_lowercase(), last.to_lowercase(), n),
    )
}
