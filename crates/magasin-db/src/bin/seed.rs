//! # Seed Data Generator
//!
//! Populates a development database with a small catalog, opening stock,
//! and the bootstrap admin account.
//!
//! ## Usage
//! ```bash
//! # Seed the default dev database
//! cargo run -p magasin-db --bin seed -- --admin-password <password>
//!
//! # Specify a database path
//! cargo run -p magasin-db --bin seed -- --db ./data/magasin.db --admin-password <password>
//! ```
//!
//! The admin password always comes from the flag. There is no built-in
//! default credential: a database without an admin and a run without the
//! flag is an error, and the created account forces a password change on
//! first login either way.

use std::env;
use std::process::ExitCode;

use tracing::info;
use tracing_subscriber::EnvFilter;

use magasin_core::{Article, Role};
use magasin_db::{Database, DbConfig};

/// Sample catalog: (code, name, category, purchase cents, sale cents,
/// threshold, opening stock).
const CATALOG: &[(&str, &str, &str, i64, i64, i64, i64)] = &[
    ("PAP-001", "Cahier A4 96p", "Papeterie", 250, 500, 10, 120),
    ("PAP-002", "Cahier A5 48p", "Papeterie", 150, 320, 10, 80),
    ("PAP-003", "Bloc notes 80f", "Papeterie", 180, 390, 8, 45),
    ("STY-001", "Stylo bille bleu", "Écriture", 40, 120, 25, 400),
    ("STY-002", "Stylo bille noir", "Écriture", 40, 120, 25, 380),
    ("STY-003", "Surligneur jaune", "Écriture", 80, 190, 15, 60),
    ("STY-004", "Crayon HB", "Écriture", 25, 90, 30, 0),
    ("CLA-001", "Classeur A4 dos 40mm", "Classement", 220, 480, 6, 35),
    ("CLA-002", "Intercalaires x12", "Classement", 110, 260, 10, 50),
    ("BUR-001", "Agrafeuse 24/6", "Bureau", 450, 950, 4, 12),
    ("BUR-002", "Agrafes 24/6 x1000", "Bureau", 90, 210, 20, 150),
    ("BUR-003", "Ruban adhésif 33m", "Bureau", 70, 180, 12, 0),
];

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("seed failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./magasin_dev.db");
    let mut admin_password: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-password" | "-p" => {
                if i + 1 < args.len() {
                    admin_password = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Magasin Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>             Database file path (default: ./magasin_dev.db)");
                println!("  -p, --admin-password <PW>   Initial admin password (required on first run)");
                println!("  -h, --help                  Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Magasin Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database
    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Bootstrap the admin account first; everything after needs a user id
    // for the ledger entries.
    let auth = db.auth();
    match admin_password {
        Some(password) => {
            if auth.bootstrap_admin(&password).await? {
                println!("✓ Admin account created (password change forced on first login)");
            } else {
                println!("✓ Admin account already present");
            }
        }
        None => {
            if db.users().count_with_role(Role::Admin).await? == 0 {
                eprintln!("No admin account exists yet.");
                eprintln!("Re-run with --admin-password <password> to create one.");
                return Err("missing --admin-password".into());
            }
            println!("✓ Admin account already present");
        }
    }

    // Refuse to reseed a populated catalog.
    let existing = db.articles().count().await?;
    if existing > 0 {
        println!();
        println!("Database already has {} articles; skipping catalog seed.", existing);
        println!("Delete the database file to regenerate.");
        return Ok(());
    }

    let admin = db
        .users()
        .find_by_username(magasin_core::BOOTSTRAP_ADMIN_USERNAME)
        .await?
        .ok_or("admin account missing after bootstrap")?;

    // One supplier for the whole sample catalog.
    let supplier = db
        .suppliers()
        .insert(
            "Papeterie Générale",
            Some("01 23 45 67 89"),
            Some("contact@papeterie-generale.example"),
            Some("12 rue du Commerce, 75011 Paris"),
        )
        .await?;
    println!("✓ Supplier created");

    // Catalog and opening stock. Articles with 0 opening stock get no
    // stock row at all, which keeps them on the low-stock report.
    println!();
    println!("Seeding catalog...");

    let articles = db.articles();
    let stock = db.stock();
    let mut stocked = 0;

    for &(code, name, category, purchase, sale, threshold, opening) in CATALOG {
        articles
            .insert(&Article {
                code: code.to_string(),
                name: name.to_string(),
                category: Some(category.to_string()),
                purchase_price_cents: purchase,
                sale_price_cents: sale,
                alert_threshold: threshold,
                barcode: None,
                supplier_id: Some(supplier.id),
            })
            .await?;

        if opening > 0 {
            stock.receive(code, opening, None, admin.id).await?;
            stocked += 1;
        }
    }

    println!("✓ {} articles created, {} with opening stock", CATALOG.len(), stocked);

    // Quick sanity pass over the reports.
    let alerts = stock.low_stock().await?;
    let value = db.reports().total_stock_value().await?;
    println!();
    println!("Low stock alerts: {}", alerts.len());
    println!("Stock valuation:  {}", value);

    info!("Seed complete");
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
