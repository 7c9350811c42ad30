use anyhow::{anyhow, Result};
use places_bot::database::connection::{DatabaseManager, TABLES};
use std::env;
use std::io;
use std::path::Path;

const DEFAULT_DATABASE_URL: &str = "sqlite:./data/places.db";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("migrate");

    match command {
        "migrate" | "up" => create_schema().await,
        "check" => check_database().await,
        "reset" => reset_database().await,
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {command}");
            print_help();
            std::process::exit(1);
        }
    }
}

/// Only the database location matters here, so the bot's full
/// configuration (token, poll chat) is not required.
fn database_url() -> String {
    dotenvy::dotenv().ok();
    env::var("DATABASE_URL")
        .ok()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

async fn create_schema() -> Result<()> {
    println!("🔧 Places Bot - Database Schema Tool");
    println!("====================================");

    let url = database_url();
    println!("📊 Database URL: {}", mask_url(&url));

    let db_manager = DatabaseManager::new(&url)
        .await
        .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;

    match db_manager.ensure_schema().await {
        Ok(()) => println!("✅ Schema is up to date!"),
        Err(e) => {
            eprintln!("❌ Schema creation failed: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn check_database() -> Result<()> {
    println!("🔍 Checking database connection and schema...");

    let url = database_url();
    println!("📊 Database URL: {}", mask_url(&url));

    let db_manager = DatabaseManager::new(&url)
        .await
        .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;

    let found = db_manager.list_tables().await?;
    println!("✅ Database connection successful!");
    println!("📋 Found tables:");
    for table in &found {
        println!("  • {table}");
    }

    let missing: Vec<&str> = TABLES
        .iter()
        .copied()
        .filter(|table| !found.iter().any(|f| f == table))
        .collect();
    if !missing.is_empty() {
        println!("⚠️  Missing tables: {}", missing.join(", "));
        println!("💡 Run 'migrate up' to create them");
    }

    Ok(())
}

async fn reset_database() -> Result<()> {
    println!("⚠️  WARNING: This will delete ALL places, ratings and poll data!");
    println!("🤔 Are you sure you want to continue? (yes/no)");

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    if input.trim().to_lowercase() != "yes" {
        println!("❌ Reset cancelled.");
        return Ok(());
    }

    let url = database_url();
    let Some(db_path) = url.strip_prefix("sqlite:") else {
        return Err(anyhow!("Reset is only supported for SQLite databases"));
    };

    if Path::new(db_path).exists() {
        std::fs::remove_file(db_path)?;
        println!("🗑️  Deleted database file: {db_path}");
    }

    println!("🔄 Recreating database schema...");
    create_schema().await?;

    println!("✅ Database reset completed!");
    Ok(())
}

fn mask_url(url: &str) -> String {
    let path = url.strip_prefix("sqlite:").unwrap_or(url);
    match Path::new(path).file_name() {
        Some(filename) => format!("sqlite:.../{}", filename.to_string_lossy()),
        None => url.to_string(),
    }
}

const USAGE: &str = "\
USAGE:
    migrate [COMMAND]

COMMANDS:
    migrate, up    Create any missing tables (default)
    check          Check database connection and list tables
    reset          Delete the database file and recreate it - DESTRUCTIVE!
    help           Show this help message

ENVIRONMENT:
    DATABASE_URL   Database connection string";

fn print_help() {
    println!("📍 Places Bot - Database Schema Tool\n");
    println!("{USAGE} (default: {DEFAULT_DATABASE_URL})\n");
}
