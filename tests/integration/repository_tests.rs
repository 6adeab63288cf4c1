//! Repository tests against a live PostgreSQL database configured through
//! the DB_* variables

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::{json, Value};

use equipment_server::{
    config::AppConfig,
    db::{
        validate::Payload, BlockingConnectionManager, ConnectionManager, Executor, PgConnectionManager,
        Statement,
    },
    error::AppResult,
    repository::Repository,
};

async fn setup() -> (Arc<PgConnectionManager>, Repository) {
    dotenvy::dotenv().ok();
    let config = AppConfig::load().expect("Failed to load configuration");
    let manager = Arc::new(PgConnectionManager::new(config.database));

    let mut conn = manager.acquire().await.expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&mut *conn)
        .await
        .expect("Failed to run migrations");
    drop(conn);

    let repository = Repository::new(manager.clone());
    (manager, repository)
}

fn blocking_setup() -> Arc<BlockingConnectionManager> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load().expect("Failed to load configuration");
    let manager = Arc::new(
        BlockingConnectionManager::new(config.database).expect("Failed to start blocking manager"),
    );

    manager.block_on(async {
        let mut conn = manager.acquire().await.expect("Failed to connect to database");
        sqlx::migrate!("./migrations")
            .run(&mut *conn)
            .await
            .expect("Failed to run migrations");
    });
    manager
}

/// Poll until every checked-out connection is back in the pool
fn wait_for_idle_pool(manager: &BlockingConnectionManager) -> u32 {
    let mut in_use = manager.status().in_use;
    for _ in 0..50 {
        if in_use == 0 {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
        in_use = manager.status().in_use;
    }
    in_use
}

fn insert_equipment(name: &str) -> Statement {
    Statement::new(
        "INSERT INTO equipment (name, description, equipment_type) VALUES ($1, $2, $3)",
        vec![name.into(), "Batch insert".into(), "other".into()],
    )
}

fn payload(value: Value) -> Payload {
    value.as_object().cloned().expect("object payload")
}

fn unique(name: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{} {}", name, nanos)
}

async fn speaker(repository: &Repository, name: &str, price: &str) -> i32 {
    repository
        .create_equipment(payload(json!({
            "name": unique(name),
            "description": "Test loudspeaker",
            "equipment_type": "speaker",
            "rental_price_per_day": price,
        })))
        .await
        .expect("Failed to create equipment")
        .id
}

#[tokio::test]
#[ignore]
async fn test_create_sanitizes_and_defaults() {
    let (_, repository) = setup().await;

    let equipment = repository
        .create_equipment(payload(json!({
            "name": format!("  {}  ", unique("Sanitized")),
            "description": "  padded  ",
            "equipment_type": "light",
            "weight": 3.5,
        })))
        .await
        .expect("Failed to create equipment");

    assert!(!equipment.name.starts_with(' '));
    assert_eq!(equipment.description, "padded");
    assert_eq!(equipment.availability_status.as_str(), "available");
    assert!(equipment.created_at.is_some());

    let rejected = repository
        .create_equipment(payload(json!({
            "name": "Bad",
            "description": "negative price",
            "equipment_type": "speaker",
            "rental_price_per_day": -1,
        })))
        .await;
    assert!(rejected.is_none());

    assert!(repository.delete_equipment(equipment.id).await);
}

#[tokio::test]
#[ignore]
async fn test_update_ignores_unknown_fields() {
    let (_, repository) = setup().await;
    let id = speaker(&repository, "Updatable", "10.00").await;

    assert!(
        repository
            .update_equipment(
                id,
                payload(json!({ "brand": "Acme", "id": 1, "not_a_column": true })),
            )
            .await
    );
    let equipment = repository.get_equipment(id).await.expect("equipment exists");
    assert_eq!(equipment.brand.as_deref(), Some("Acme"));
    assert_eq!(equipment.id, id);

    assert!(!repository.update_equipment(id, payload(json!({ "equipment_type": "toaster" }))).await);

    repository.delete_equipment(id).await;
}

#[tokio::test]
#[ignore]
async fn test_upsert_keeps_one_row_per_pair() {
    let (_, repository) = setup().await;
    let id = speaker(&repository, "Upsert", "45.00").await;
    let category = repository
        .create_category(payload(json!({ "name": unique("Upsert Package") })))
        .await
        .expect("Failed to create category");

    assert!(repository.add_equipment_to_package(id, category.id, 1, true).await);
    assert!(repository.add_equipment_to_package(id, category.id, 3, false).await);

    let details = repository
        .get_package_details(category.id)
        .await
        .expect("package exists");
    assert_eq!(details.equipment.len(), 1);
    assert_eq!(details.equipment[0].quantity_in_package, 3);
    assert!(!details.equipment[0].is_required);
    assert_eq!(details.statistics.total_items, 3);
    assert_eq!(details.statistics.estimated_daily_cost, Decimal::new(13500, 2));

    let association = repository
        .get_package_association(id, category.id)
        .await
        .expect("association exists");
    assert_eq!(association.quantity_in_package, 3);

    assert!(repository.remove_equipment_from_package(id, category.id).await);
    assert!(!repository.remove_equipment_from_package(id, category.id).await);
    assert!(repository.get_package_association(id, category.id).await.is_none());

    repository.delete_category(category.id).await;
    repository.delete_equipment(id).await;
}

#[tokio::test]
#[ignore]
async fn test_quantity_must_be_positive() {
    let (_, repository) = setup().await;
    let id = speaker(&repository, "Quantity", "5.00").await;
    let category = repository
        .create_category(payload(json!({ "name": unique("Quantity Package") })))
        .await
        .expect("Failed to create category");

    assert!(!repository.add_equipment_to_package(id, category.id, 0, true).await);
    assert!(repository.add_equipment_to_package(id, category.id, 2, true).await);
    assert!(!repository.update_package_quantity(id, category.id, 0).await);
    assert!(!repository.update_package_quantity(id, category.id, -4).await);

    let details = repository.get_package_details(category.id).await.expect("package exists");
    assert_eq!(details.equipment[0].quantity_in_package, 2);

    assert!(repository.update_package_quantity(id, category.id, 5).await);
    assert!(repository.update_package_requirement(id, category.id, false).await);
    let details = repository.get_package_details(category.id).await.expect("package exists");
    assert_eq!(details.statistics.optional_items, 5);

    repository.delete_category(category.id).await;
    repository.delete_equipment(id).await;
}

#[tokio::test]
#[ignore]
async fn test_deleting_category_cascades_to_associations_only() {
    let (manager, repository) = setup().await;
    let id = speaker(&repository, "Cascade", "12.00").await;
    let category = repository
        .create_category(payload(json!({ "name": unique("Cascade Package") })))
        .await
        .expect("Failed to create category");
    assert!(repository.add_equipment_to_package(id, category.id, 1, true).await);

    assert!(repository.delete_category(category.id).await);

    let db = Executor::new(manager.clone());
    let rows = db
        .fetch_rows(
            "SELECT * FROM equipment_categories WHERE category_id = $1",
            &[category.id.into()],
        )
        .await
        .expect("query succeeds");
    assert!(rows.is_empty());
    assert!(repository.get_equipment(id).await.is_some());
    assert!(repository.get_equipment_in_packages(id).await.is_empty());

    repository.delete_equipment(id).await;
}

#[tokio::test]
#[ignore]
async fn test_party_package_end_to_end() {
    let (_, repository) = setup().await;
    let speakers = speaker(&repository, "Party Speaker", "45.00").await;
    let light = repository
        .create_equipment(payload(json!({
            "name": unique("Party Light"),
            "description": "LED par",
            "equipment_type": "light",
            "rental_price_per_day": 19.99,
        })))
        .await
        .expect("Failed to create equipment")
        .id;

    let category = repository
        .create_category(payload(json!({ "name": "Party Package" })))
        .await
        .expect("Failed to create category");
    assert!(repository.add_equipment_to_package(speakers, category.id, 2, true).await);
    assert!(repository.add_equipment_to_package(light, category.id, 1, false).await);

    let details = repository.get_package_details(category.id).await.expect("package exists");
    assert_eq!(details.statistics.total_items, 3);
    assert_eq!(details.statistics.required_items, 2);
    assert_eq!(details.statistics.optional_items, 1);
    assert_eq!(details.statistics.estimated_daily_cost, Decimal::new(10999, 2));
    assert_eq!(details.equipment_by_type.len(), 2);
    // required items first
    assert_eq!(details.equipment[0].equipment.id, speakers);

    let compatibility = repository.get_equipment_compatibility(light).await;
    assert_eq!(compatibility.len(), 1);
    assert!(!compatibility[0].package_details.is_required);
    assert!(repository.get_equipment_compatibility(-1).await.is_empty());

    let copy = repository
        .duplicate_package(category.id, payload(json!({ "name": unique("Party Copy") })))
        .await
        .expect("duplicate succeeds");
    assert_eq!(copy.statistics, details.statistics);

    repository.delete_category(copy.category.id).await;
    repository.delete_category(category.id).await;
    repository.delete_equipment(speakers).await;
    repository.delete_equipment(light).await;
}

#[tokio::test]
#[ignore]
async fn test_search_matches_description_only_token() {
    let (_, repository) = setup().await;
    let equipment = repository
        .create_equipment(payload(json!({
            "name": unique("Plain Box"),
            "description": "Contains a xylophonic resonator",
            "equipment_type": "other",
        })))
        .await
        .expect("Failed to create equipment");

    let results = repository.search_equipment("xylophonic").await;
    assert!(results.iter().any(|e| e.id == equipment.id));

    repository.delete_equipment(equipment.id).await;
}

#[tokio::test]
#[ignore]
async fn test_failed_query_releases_connection() {
    let (manager, _) = setup().await;
    let db = Executor::new(manager.clone());

    assert!(db.fetch_rows("SELECT * FROM no_such_table", &[]).await.is_err());
    assert!(db.execute("INSERT INTO no_such_table VALUES (1)", &[]).await.is_err());

    // Returned connections are handed back to the pool asynchronously
    let mut in_use = manager.status().in_use;
    for _ in 0..50 {
        if in_use == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        in_use = manager.status().in_use;
    }
    assert_eq!(in_use, 0);
    assert!(manager.health_check().await);
}

#[tokio::test]
#[ignore]
async fn test_statistics() {
    let (_, repository) = setup().await;

    let overview = repository.get_database_overview().await.expect("overview");
    assert!(overview.equipment.total >= overview.equipment.available);

    let shares = repository.get_availability_statistics().await;
    if !shares.is_empty() {
        let percent: f64 = shares.values().map(|s| s.percentage).sum();
        assert!((percent - 100.0).abs() < 0.1);
    }

    if let Some(prices) = repository.get_price_statistics().await {
        assert!(prices.min_price <= prices.median_price);
        assert!(prices.median_price <= prices.max_price);
    }

    let report = repository.get_statistics_report().await;
    assert!(report.overview.is_some());
}

#[test]
#[ignore]
fn test_blocking_connection_returns_to_pool_on_every_exit_path() {
    let manager = blocking_setup();

    let conn = manager.acquire_blocking().expect("Failed to acquire connection");
    assert!(manager.status().in_use >= 1);
    drop(conn);
    assert_eq!(wait_for_idle_pool(&manager), 0);

    let failing = || -> AppResult<()> {
        let mut conn = manager.acquire_blocking()?;
        manager.block_on(sqlx::query("SELECT * FROM no_such_table").execute(&mut *conn))?;
        manager.release_blocking(conn);
        Ok(())
    };
    assert!(failing().is_err());
    assert_eq!(wait_for_idle_pool(&manager), 0);

    let conn = manager.acquire_blocking().expect("Failed to acquire connection");
    manager.release_blocking(conn);
    assert_eq!(wait_for_idle_pool(&manager), 0);
    assert!(manager.health_check_blocking());
}

#[tokio::test]
#[ignore]
async fn test_transaction_is_all_or_nothing() {
    let (manager, repository) = setup().await;
    let db = Executor::new(manager.clone());
    let name = unique("Batch Rollback");

    let batch = [
        insert_equipment(&name),
        Statement::new("INSERT INTO no_such_table VALUES (1)", vec![]),
    ];
    assert!(db.execute_transaction(&batch).await.is_err());
    assert!(!repository.get_all_equipment().await.iter().any(|e| e.name == name));

    assert_eq!(db.execute_transaction(&[insert_equipment(&name)]).await.unwrap(), 1);
    let stored = repository
        .get_all_equipment()
        .await
        .into_iter()
        .find(|e| e.name == name)
        .expect("committed row exists");
    assert!(repository.delete_equipment(stored.id).await);
}

#[test]
#[ignore]
fn test_blocking_transaction_is_all_or_nothing() {
    let manager = blocking_setup();
    let repository = Repository::new(manager.clone());
    let name = unique("Blocking Rollback");

    let batch = [
        insert_equipment(&name),
        Statement::new("INSERT INTO no_such_table VALUES (1)", vec![]),
    ];
    assert!(manager.transaction_blocking(&batch).is_err());
    assert!(!manager
        .block_on(repository.get_all_equipment())
        .iter()
        .any(|e| e.name == name));
    assert_eq!(wait_for_idle_pool(&manager), 0);

    assert_eq!(manager.transaction_blocking(&[insert_equipment(&name)]).unwrap(), 1);
    let stored = manager
        .block_on(repository.get_all_equipment())
        .into_iter()
        .find(|e| e.name == name)
        .expect("committed row exists");
    assert!(manager.block_on(repository.delete_equipment(stored.id)));
}

#[tokio::test]
#[ignore]
async fn test_category_search_ignores_case() {
    let (_, repository) = setup().await;
    let category = repository
        .create_category(payload(json!({
            "name": unique("Glow Party"),
            "description": "Neon UV lighting setup",
        })))
        .await
        .expect("Failed to create category");

    for query in ["GLOW PARTY", "glow party", "neon uv"] {
        let results = repository.search_categories(query).await;
        assert!(results.iter().any(|c| c.id == category.id), "query {:?}", query);
    }
    assert!(!repository
        .search_categories("%")
        .await
        .iter()
        .any(|c| c.id == category.id));

    repository.delete_category(category.id).await;
}

#[tokio::test]
#[ignore]
async fn test_update_category() {
    let (_, repository) = setup().await;
    let category = repository
        .create_category(payload(json!({ "name": unique("Updatable") })))
        .await
        .expect("Failed to create category");

    assert!(
        repository
            .update_category(
                category.id,
                payload(json!({ "description": "  Now described  ", "id": 0 })),
            )
            .await
    );
    let updated = repository.get_category(category.id).await.expect("category exists");
    assert_eq!(updated.description.as_deref(), Some("Now described"));
    assert_eq!(updated.id, category.id);
    assert_eq!(updated.name, category.name);

    assert!(!repository.update_category(category.id, payload(json!({ "bogus": 1 }))).await);
    assert!(!repository.update_category(category.id, payload(json!({ "name": null }))).await);
    assert!(!repository.update_category(-1, payload(json!({ "description": "x" }))).await);

    repository.delete_category(category.id).await;
}

#[tokio::test]
#[ignore]
async fn test_packages_by_audience_and_event_size() {
    let (_, repository) = setup().await;
    let audience = unique("audience");
    let id = speaker(&repository, "Audience Speaker", "20.00").await;

    let mut created = Vec::new();
    for (name, size) in [("Small Gig", "small"), ("Big Gig", "large")] {
        let category = repository
            .create_category(payload(json!({
                "name": unique(name),
                "target_audience": audience,
                "typical_event_size": size,
            })))
            .await
            .expect("Failed to create category");
        assert!(repository.add_equipment_to_package(id, category.id, 2, true).await);
        created.push(category);
    }

    let large = repository.get_categories_by_event_size("large").await;
    assert!(large.iter().any(|c| c.id == created[1].id));
    assert!(!large.iter().any(|c| c.id == created[0].id));

    let packages = repository
        .get_packages_by_audience_and_size(&audience, "small")
        .await;
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].category.id, created[0].id);
    assert_eq!(packages[0].statistics.total_items, 2);

    assert!(repository
        .get_packages_by_audience_and_size(&audience, "medium")
        .await
        .is_empty());

    for category in created {
        repository.delete_category(category.id).await;
    }
    repository.delete_equipment(id).await;
}

#[tokio::test]
#[ignore]
async fn test_empty_category_has_zero_statistics() {
    let (_, repository) = setup().await;
    let category = repository
        .create_category(payload(json!({ "name": unique("Empty Package") })))
        .await
        .expect("Failed to create category");

    let stats = repository
        .get_category_statistics()
        .await
        .into_iter()
        .find(|s| s.name == category.name)
        .expect("empty category is listed");
    assert_eq!(stats.equipment_count, 0);
    assert_eq!(stats.unique_equipment_count, 0);
    assert_eq!(stats.total_items, 0);

    repository.delete_category(category.id).await;
}

#[tokio::test]
#[ignore]
async fn test_category_with_equipment_counts() {
    let (_, repository) = setup().await;
    let required = speaker(&repository, "Required Speaker", "30.00").await;
    let optional = speaker(&repository, "Optional Speaker", "10.00").await;
    let category = repository
        .create_category(payload(json!({ "name": unique("Counted Package") })))
        .await
        .expect("Failed to create category");

    assert!(repository.add_equipment_to_package(required, category.id, 2, true).await);
    assert!(repository.add_equipment_to_package(optional, category.id, 1, false).await);

    let view = repository
        .get_category_with_equipment(category.id)
        .await
        .expect("category exists");
    assert_eq!(view.category.id, category.id);
    assert_eq!(view.total_equipment_count, 2);
    assert_eq!(view.required_equipment_count, 1);
    assert!(view.equipment.iter().any(|e| e.equipment.id == required && e.is_required));

    assert!(repository.get_category_with_equipment(-1).await.is_none());

    repository.delete_category(category.id).await;
    repository.delete_equipment(required).await;
    repository.delete_equipment(optional).await;
}
