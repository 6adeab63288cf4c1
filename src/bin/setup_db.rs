//! Database setup: create the database, apply migrations, seed sample data
//! and verify the result.
//!
//! Runs on plain threads through [`BlockingConnectionManager`].

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Context};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{Connection, PgConnection};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use equipment_server::{
    config::{AppConfig, DatabaseConfig},
    db::{BlockingConnectionManager, ConnectionManager, Executor, Fetch, QueryOutcome, SqlValue, Statement},
    models::PackageItem,
    repository::Repository,
};

/// name, description, type, brand, model, power, price per day
const SAMPLE_EQUIPMENT: &[(&str, &str, &str, &str, &str, &str, i64)] = &[
    ("QSC K12.2", "12-inch powered loudspeaker with wide coverage for parties and speeches", "speaker", "QSC", "K12.2", "2000W", 4500),
    ("QSC KS118", "Powered subwoofer delivering deep bass for dance floors", "speaker", "QSC", "KS118", "3600W", 6500),
    ("Chauvet Intimidator Spot 360", "Moving head spot light with gobo wheel for club and stage shows", "light", "Chauvet", "Intimidator Spot 360", "250W", 3500),
    ("Chauvet SlimPAR Pro H", "LED wash par for uplighting walls at weddings and receptions", "light", "Chauvet", "SlimPAR Pro H", "90W", 1999),
    ("Shure SM58", "Dynamic vocal microphone, the reliable choice for toasts and karaoke", "microphone", "Shure", "SM58", "", 1500),
    ("Shure BLX24/SM58", "Wireless handheld microphone system for presenters", "microphone", "Shure", "BLX24", "", 3000),
    ("Allen & Heath ZEDi-10FX", "Compact analogue mixer with USB interface and built-in effects", "mixer", "Allen & Heath", "ZEDi-10FX", "", 4000),
    ("Pioneer DDJ-FLX10", "Four-channel DJ controller for club nights", "controller", "Pioneer", "DDJ-FLX10", "", 7500),
    ("XLR Cable 10m", "Balanced microphone cable, 10 metres", "cable", "Cordial", "CMK 222", "", 300),
    ("Speaker Stand Pair", "Tripod speaker stands with air-cushioned lowering", "stand", "K&M", "21460", "", 1200),
];

/// name, description, audience, event size, [(equipment name, quantity, required)]
type SamplePackage = (&'static str, &'static str, &'static str, &'static str, &'static [(&'static str, i32, bool)]);

const SAMPLE_PACKAGES: &[SamplePackage] = &[
    (
        "Party Package",
        "Everything for a house party: two speakers, a mixer and a mic",
        "private",
        "small",
        &[("QSC K12.2", 2, true), ("Allen & Heath ZEDi-10FX", 1, true), ("Shure SM58", 1, false), ("Speaker Stand Pair", 1, false)],
    ),
    (
        "Wedding Package",
        "Ceremony and reception sound with uplighting",
        "wedding",
        "medium",
        &[("QSC K12.2", 2, true), ("Shure BLX24/SM58", 2, true), ("Chauvet SlimPAR Pro H", 8, false), ("XLR Cable 10m", 4, true)],
    ),
    (
        "Club Night",
        "Full DJ rig with bass and moving lights",
        "club",
        "large",
        &[("QSC K12.2", 2, true), ("QSC KS118", 2, true), ("Pioneer DDJ-FLX10", 1, true), ("Chauvet Intimidator Spot 360", 4, false)],
    ),
];

const EXPECTED_TABLES: [&str; 3] = ["categories", "equipment", "equipment_categories"];

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

async fn create_database(config: &DatabaseConfig) -> anyhow::Result<()> {
    let mut conn = PgConnection::connect_with(&config.maintenance_options())
        .await
        .context("Cannot connect to PostgreSQL; check that it is running and the credentials are correct")?;

    let exists = sqlx::query_scalar::<_, i32>("SELECT 1 FROM pg_database WHERE datname = $1")
        .bind(&config.name)
        .fetch_optional(&mut conn)
        .await?
        .is_some();

    if exists {
        tracing::info!("Database '{}' already exists", config.name);
    } else {
        tracing::info!("Creating database: {}", config.name);
        sqlx::query(&format!("CREATE DATABASE {}", quote_identifier(&config.name)))
            .execute(&mut conn)
            .await
            .with_context(|| format!("Failed to create database {}", config.name))?;
        tracing::info!("Database '{}' created successfully", config.name);
    }

    conn.close().await?;
    Ok(())
}

fn seed_equipment_statements() -> Vec<Statement> {
    SAMPLE_EQUIPMENT
        .iter()
        .map(|(name, description, equipment_type, brand, model, power, cents)| {
            let power = (!power.is_empty()).then(|| power.to_string());
            Statement::new(
                r#"
                INSERT INTO equipment (name, description, equipment_type, brand, model,
                                       power_rating, rental_price_per_day)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
                vec![
                    (*name).into(),
                    (*description).into(),
                    (*equipment_type).into(),
                    (*brand).into(),
                    (*model).into(),
                    SqlValue::from(power),
                    Decimal::new(*cents, 2).into(),
                ],
            )
        })
        .collect()
}

fn seed(manager: &BlockingConnectionManager, repository: &Repository) -> anyhow::Result<()> {
    if !manager.block_on(repository.get_all_equipment()).is_empty() {
        tracing::info!("Catalog already contains equipment, skipping sample data");
        return Ok(());
    }

    let inserted = manager
        .transaction_blocking(&seed_equipment_statements())
        .context("Failed to insert sample equipment")?;
    tracing::info!("Inserted {} equipment items", inserted);

    let ids: HashMap<String, i32> = manager
        .block_on(repository.get_all_equipment())
        .into_iter()
        .map(|e| (e.name, e.id))
        .collect();

    for (name, description, audience, size, items) in SAMPLE_PACKAGES {
        let items: Vec<PackageItem> = items
            .iter()
            .filter_map(|(equipment, quantity, required)| {
                ids.get(*equipment).map(|id| PackageItem {
                    equipment_id: *id,
                    quantity: *quantity,
                    required: *required,
                })
            })
            .collect();

        let category = json!({
            "name": name,
            "description": description,
            "target_audience": audience,
            "typical_event_size": size,
        });
        let Some(category) = category.as_object().cloned() else {
            continue;
        };

        match manager.block_on(repository.create_package_from_equipment_list(category, &items)) {
            Some(package) => tracing::info!(
                "Created package '{}' with {} items",
                package.category.name,
                package.statistics.total_items
            ),
            None => bail!("Failed to create package {}", name),
        }
    }

    Ok(())
}

fn count(manager: &BlockingConnectionManager, db: &Executor, table: &str) -> anyhow::Result<i64> {
    let sql = format!("SELECT COUNT(*) AS count FROM {}", table);
    let outcome = manager.block_on(db.query(&sql, &[], Fetch::One, false))?;
    let count = match outcome {
        QueryOutcome::Row(Some(row)) => row.get("count").and_then(|v| v.as_i64()).unwrap_or(0),
        _ => 0,
    };
    tracing::info!("{} rows: {}", table, count);
    Ok(count)
}

fn verify(manager: &BlockingConnectionManager, db: &Executor) -> anyhow::Result<()> {
    let tables: Vec<String> = manager
        .block_on(db.fetch_rows(
            r#"
            SELECT table_name::text AS table_name
            FROM information_schema.tables
            WHERE table_schema = 'public'
              AND table_name IN ('equipment', 'categories', 'equipment_categories')
            ORDER BY table_name
            "#,
            &[],
        ))?
        .into_iter()
        .filter_map(|row| row.get("table_name").and_then(|v| v.as_str()).map(str::to_string))
        .collect();
    tracing::info!("Found tables: {:?}", tables);

    if tables != EXPECTED_TABLES {
        bail!("Expected tables {:?}, found {:?}", EXPECTED_TABLES, tables);
    }

    let equipment = count(manager, db, "equipment")?;
    let categories = count(manager, db, "categories")?;
    count(manager, db, "equipment_categories")?;

    if equipment == 0 || categories == 0 {
        bail!("Sample data is missing");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("setup_db={},equipment_server={}", config.logging.level, config.logging.level).into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Equipment database setup");

    let manager = Arc::new(BlockingConnectionManager::new(config.database.clone())?);

    manager.block_on(create_database(manager.config()))?;

    manager
        .block_on(async {
            let mut conn = manager.acquire().await?;
            sqlx::migrate!("./migrations").run(&mut *conn).await?;
            Ok::<_, anyhow::Error>(())
        })
        .context("Failed to run migrations")?;
    tracing::info!("Schema is up to date");

    if !manager.health_check_blocking() {
        bail!("Database health check failed");
    }

    let repository = Repository::new(manager.clone());
    seed(&manager, &repository)?;

    let db = Executor::new(manager.clone());
    verify(&manager, &db)?;

    manager.close_all_blocking();
    tracing::info!("Database setup completed successfully");
    Ok(())
}
