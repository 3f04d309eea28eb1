//! PostgreSQL document store tests. Require `DATABASE_URL`; run with
//! `cargo test -- --ignored`.

use serde_json::json;
use sqlx::PgPool;

use citizen_db::collections::{OPT_IN_HISTORY, PHONE_MAPPING};
use citizen_db::store::{DocumentStore, PgDocumentStore, StoreError};

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_upsert_replaces_by_key(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    store
        .upsert(PHONE_MAPPING, "5521999887766", &json!({"status": "pending"}))
        .await
        .unwrap();
    store
        .upsert(PHONE_MAPPING, "5521999887766", &json!({"status": "active"}))
        .await
        .unwrap();

    let doc = store.find_one(PHONE_MAPPING, "5521999887766").await.unwrap();
    assert_eq!(doc, Some(json!({"status": "active"})));

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM phone_mapping")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count.0, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_find_many_uses_containment_in_insert_order(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    for n in 0..3 {
        store
            .insert(OPT_IN_HISTORY, &json!({"cpf": "03561350712", "n": n}))
            .await
            .unwrap();
    }
    store
        .insert(OPT_IN_HISTORY, &json!({"cpf": "45049725810", "n": 9}))
        .await
        .unwrap();

    let docs = store
        .find_many(OPT_IN_HISTORY, &json!({"cpf": "03561350712"}))
        .await
        .unwrap();
    let ns: Vec<i64> = docs.iter().map(|d| d["n"].as_i64().unwrap()).collect();
    assert_eq!(ns, vec![0, 1, 2]);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_unknown_collection_is_rejected(pool: PgPool) {
    let store = PgDocumentStore::new(pool);
    let result = store.find_one("pets", "1").await;
    assert!(matches!(result, Err(StoreError::UnknownCollection(_))));
}

/// Every table must have created_at and updated_at as timestamptz.
#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_all_tables_have_timestamps(pool: PgPool) {
    let tables: Vec<(String,)> = sqlx::query_as(
        "SELECT table_name
         FROM information_schema.tables
         WHERE table_schema = 'public'
           AND table_type = 'BASE TABLE'
           AND table_name != '_sqlx_migrations'
         ORDER BY table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(tables.len(), 5);
    for (table,) in &tables {
        for col in ["created_at", "updated_at"] {
            let result: Option<(String,)> = sqlx::query_as(&format!(
                "SELECT data_type
                 FROM information_schema.columns
                 WHERE table_schema = 'public'
                   AND table_name = '{table}'
                   AND column_name = '{col}'"
            ))
            .fetch_optional(&pool)
            .await
            .unwrap();

            let (data_type,) =
                result.unwrap_or_else(|| panic!("Table {table} is missing column {col}"));
            assert_eq!(
                data_type, "timestamp with time zone",
                "Table {table}.{col} should be timestamptz, got {data_type}"
            );
        }
    }
}
