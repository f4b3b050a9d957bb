//! # Seed Data Generator
//!
//! Populates the database with demo data for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p ventas-db --bin seed
//!
//! # Specify database path and admin credentials
//! cargo run -p ventas-db --bin seed -- --db ./data/ventas.db \
//!     --admin-email admin@ventas.local --admin-password cambiar123
//! ```
//!
//! ## Generated Data
//! - One admin and one salesperson account
//! - A small catalog across three categories, some of it low on stock
//! - A handful of customers with different document types

use anyhow::{bail, Context};
use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use std::env;
use ventas_core::{DocumentType, NewCustomer, NewProduct, Role};
use ventas_db::{Database, DbConfig};

/// (code, name, category, price in cents, stock)
const PRODUCTS: &[(&str, &str, &str, i64, i64)] = &[
    ("LAP-001", "Laptop 14\"", "computo", 2_499_900, 8),
    ("LAP-002", "Laptop 15\" Pro", "computo", 3_899_900, 3),
    ("MON-001", "Monitor 24\"", "computo", 689_900, 12),
    ("MOU-001", "Mouse inalambrico", "accesorios", 8_999, 40),
    ("KEY-001", "Teclado mecanico", "accesorios", 12_000, 25),
    ("HUB-001", "Hub USB-C", "accesorios", 15_500, 6),
    ("CAB-001", "Cable HDMI 2m", "cables", 2_500, 100),
    ("CAB-002", "Cable USB-C 1m", "cables", 1_900, 2),
];

/// (document, type, name, email)
const CUSTOMERS: &[(&str, DocumentType, &str, &str)] = &[
    ("1020304050", DocumentType::Cedula, "Carlos Ruiz", "carlos.ruiz@example.com"),
    ("52987654", DocumentType::Cedula, "Maria Lopez", "maria.lopez@example.com"),
    ("PA778899", DocumentType::Pasaporte, "John Smith", "john.smith@example.com"),
    ("900123456", DocumentType::Nit, "Soluciones SAS", "compras@soluciones.example.com"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./ventas_dev.db");
    let mut admin_email = String::from("admin@ventas.local");
    let mut admin_password = String::from("admin12345");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" if i + 1 < args.len() => {
                db_path = args[i + 1].clone();
                i += 1;
            }
            "--admin-email" if i + 1 < args.len() => {
                admin_email = args[i + 1].clone();
                i += 1;
            }
            "--admin-password" if i + 1 < args.len() => {
                admin_password = args[i + 1].clone();
                i += 1;
            }
            "--help" | "-h" => {
                println!("Ventas Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>            Database file path (default: ./ventas_dev.db)");
                println!("      --admin-email <EMAIL>  Admin login (default: admin@ventas.local)");
                println!("      --admin-password <PW>  Admin password (default: admin12345)");
                println!("  -h, --help                 Show this help message");
                return Ok(());
            }
            other => bail!("unknown argument: {other}"),
        }
        i += 1;
    }

    if admin_password.len() < ventas_core::MIN_PASSWORD_LENGTH {
        bail!(
            "admin password must be at least {} characters",
            ventas_core::MIN_PASSWORD_LENGTH
        );
    }

    println!("🌱 Ventas Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.users().count().await? > 0 {
        println!("⚠ Database already has users");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let admin_hash = hash(&admin_password)?;
    db.users()
        .insert("Administrador", &admin_email, &admin_hash, Role::Admin)
        .await?;
    let seller_hash = hash("vendedor123")?;
    db.users()
        .insert("Vendedor Demo", "vendedor@ventas.local", &seller_hash, Role::Vendedor)
        .await?;
    println!("✓ Users: {} (admin), vendedor@ventas.local (vendedor)", admin_email);

    for (code, name, category, price_cents, stock) in PRODUCTS {
        db.products()
            .insert(&NewProduct {
                code: code.to_string(),
                name: name.to_string(),
                description: None,
                price_cents: *price_cents,
                stock: *stock,
                category: Some(category.to_string()),
            })
            .await
            .with_context(|| format!("inserting product {code}"))?;
    }
    println!("✓ Products: {}", PRODUCTS.len());

    for (document, document_type, name, email) in CUSTOMERS {
        db.customers()
            .insert(&NewCustomer {
                document: document.to_string(),
                document_type: *document_type,
                name: name.to_string(),
                email: email.to_string(),
                phone: None,
                address: None,
            })
            .await
            .with_context(|| format!("inserting customer {document}"))?;
    }
    println!("✓ Customers: {}", CUSTOMERS.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn hash(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("hashing password: {e}"))?;
    Ok(hash.to_string())
}
