//! # Seed Data Generator
//!
//! Fills a development database with a grocery catalog.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p till-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p till-db --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p till-db --bin seed -- --db ./data/till.db
//! ```
//!
//! Each product gets a SKU `{CATEGORY}-{NNN}`, a price between R$ 1,99 and
//! R$ 49,99 depending on its package, and a stock of 0 to 60 units (every
//! 15th product starts out of stock so the cart's OutOfStock path is easy
//! to reach by hand).

use std::env;
use till_core::ProductInput;
use till_db::{Database, DbConfig};

/// (category, SKU prefix, base names)
const CATALOG: &[(&str, &str, &[&str])] = &[
    (
        "Bebidas",
        "BEB",
        &[
            "Refrigerante Cola",
            "Refrigerante Guaraná",
            "Água Mineral",
            "Suco de Laranja",
            "Suco de Uva",
            "Chá Gelado",
            "Cerveja Pilsen",
            "Energético",
        ],
    ),
    (
        "Mercearia",
        "MER",
        &[
            "Arroz Branco",
            "Feijão Carioca",
            "Feijão Preto",
            "Macarrão Espaguete",
            "Açúcar Refinado",
            "Café Torrado",
            "Farinha de Mandioca",
            "Óleo de Soja",
            "Sal Refinado",
            "Molho de Tomate",
        ],
    ),
    (
        "Laticínios",
        "LAT",
        &[
            "Leite Integral",
            "Leite Desnatado",
            "Queijo Mussarela",
            "Requeijão",
            "Iogurte Natural",
            "Manteiga",
            "Creme de Leite",
        ],
    ),
    (
        "Padaria",
        "PAD",
        &[
            "Pão de Forma",
            "Pão de Queijo",
            "Bolo de Fubá",
            "Biscoito Cream Cracker",
            "Biscoito Recheado",
        ],
    ),
    (
        "Limpeza",
        "LIM",
        &[
            "Detergente",
            "Sabão em Pó",
            "Água Sanitária",
            "Desinfetante",
            "Esponja",
        ],
    ),
];

/// (package label, price added in centavos)
const PACKAGES: &[(&str, i64)] = &[
    ("300g", 0),
    ("500g", 150),
    ("1kg", 400),
    ("2L", 600),
    ("5kg", 2500),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./till_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
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
                println!("Till POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./till_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Till POS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicate SKUs.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let products = db.products();
    let start = std::time::Instant::now();
    let mut generated = 0;

    for input in catalog().take(count) {
        if let Err(e) = products.insert(&input).await {
            eprintln!("Failed to insert {}: {}", input.name, e);
            continue;
        }

        generated += 1;
        if generated % 50 == 0 {
            println!("  Generated {} products...", generated);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Every (name, package) combination, category by category.
fn catalog() -> impl Iterator<Item = ProductInput> {
    CATALOG.iter().enumerate().flat_map(|(cat_idx, (category, prefix, names))| {
        names.iter().enumerate().flat_map(move |(name_idx, name)| {
            PACKAGES
                .iter()
                .enumerate()
                .map(move |(pkg_idx, (package, addon))| {
                    let seed = name_idx * PACKAGES.len() + pkg_idx;
                    let barcode = format!("789{:010}", cat_idx * 1000 + seed);
                    generate_product(category, prefix, name, package, *addon, seed, barcode)
                })
        })
    })
}

fn generate_product(
    category: &str,
    prefix: &str,
    name: &str,
    package: &str,
    price_addon: i64,
    seed: usize,
    barcode: String,
) -> ProductInput {
    let base_price = 199 + ((seed * 37) % 1800) as i64;
    let stock = if seed % 15 == 14 { 0 } else { (seed * 7 % 60) as i64 + 1 };

    ProductInput {
        name: format!("{} {}", name, package),
        description: None,
        sku: Some(format!("{}-{:03}", prefix, seed)),
        barcode: Some(barcode),
        price_cents: (base_price + price_addon).min(4999),
        stock,
        category: category.to_string(),
    }
}
