//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    atelier_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    assert!(info_str.contains("profile"), "missing profile table");
    assert!(info_str.contains("brand"), "missing brand table");
    assert!(info_str.contains("_migration"), "missing _migration table");
}

#[tokio::test]
async fn migration_is_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    atelier_db::run_migrations(&db).await.unwrap();
    atelier_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("SELECT * FROM _migration").await.unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), 1, "expected exactly one migration record");
}

#[tokio::test]
async fn role_assertion_rejects_unknown_values() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    atelier_db::run_migrations(&db).await.unwrap();

    let result = db
        .query(
            "CREATE profile:bad SET \
             email = 'x@example.com', \
             role = 'superuser', \
             owned_brands = []",
        )
        .await
        .unwrap()
        .check();

    assert!(result.is_err(), "role outside the enum must be rejected");
}

#[tokio::test]
async fn unique_index_prevents_duplicate_brand_slugs() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    atelier_db::run_migrations(&db).await.unwrap();

    db.query("CREATE brand SET name = 'Noir', slug = 'noir'")
        .await
        .unwrap()
        .check()
        .unwrap();

    let result = db
        .query("CREATE brand SET name = 'Noir Two', slug = 'noir'")
        .await
        .unwrap()
        .check();

    assert!(result.is_err(), "duplicate slug should be rejected");
}
