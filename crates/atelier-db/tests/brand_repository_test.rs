//! Integration tests for [`SurrealBrandRepository`] using in-memory
//! SurrealDB.

use std::collections::BTreeSet;

use atelier_core::error::AtelierError;
use atelier_core::models::brand::{CreateBrand, UpdateBrand};
use atelier_core::models::profile::CreateProfile;
use atelier_core::repository::{BrandRepository, Pagination, ProfileRepository};
use atelier_db::repository::{SurrealBrandRepository, SurrealProfileRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> (
    SurrealProfileRepository<Db>,
    SurrealBrandRepository<Db>,
    Surreal<Db>,
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    atelier_db::run_migrations(&db).await.unwrap();
    (
        SurrealProfileRepository::new(db.clone()),
        SurrealBrandRepository::new(db.clone()),
        db,
    )
}

fn brand(slug: &str) -> CreateBrand {
    CreateBrand {
        name: slug.replace('-', " "),
        slug: slug.into(),
        created_by: None,
    }
}

async fn profile(repo: &SurrealProfileRepository<Db>, email: &str) -> Uuid {
    repo.create(CreateProfile {
        id: Uuid::new_v4(),
        email: email.into(),
        display_name: None,
        avatar_url: None,
    })
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn create_get_and_update_brand() {
    let (_, brands, _db) = setup().await;

    let created = brands.create(brand("maison-noir")).await.unwrap();
    assert_eq!(created.slug, "maison-noir");
    assert_eq!(created.created_by, None);

    let fetched = brands.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched.name, created.name);

    let updated = brands
        .update(
            created.id,
            UpdateBrand {
                name: Some("Maison Noir Paris".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Maison Noir Paris");
    assert_eq!(updated.slug, "maison-noir"); // unchanged
}

#[tokio::test]
async fn duplicate_slug_is_already_exists() {
    let (_, brands, _db) = setup().await;
    brands.create(brand("dup")).await.unwrap();

    let err = brands.create(brand("dup")).await.unwrap_err();
    assert!(
        matches!(err, AtelierError::AlreadyExists { .. }),
        "expected AlreadyExists, got: {err:?}"
    );
}

#[tokio::test]
async fn delete_retracts_brand_from_every_owner() {
    let (profiles, brands, _db) = setup().await;

    let doomed = brands.create(brand("brand-3")).await.unwrap();
    let kept = brands.create(brand("brand-4")).await.unwrap();

    let first = profile(&profiles, "one@example.com").await;
    let second = profile(&profiles, "two@example.com").await;
    profiles.grant_brand(first, doomed.id).await.unwrap();
    profiles.grant_brand(second, doomed.id).await.unwrap();
    profiles.grant_brand(second, kept.id).await.unwrap();

    brands.delete(doomed.id).await.unwrap();

    assert!(brands.get_by_id(doomed.id).await.is_err());
    let first_owned = profiles.owned_brands(first).await.unwrap();
    let second_owned = profiles.owned_brands(second).await.unwrap();
    assert!(first_owned.is_empty());
    assert_eq!(second_owned, BTreeSet::from([kept.id]));
}

#[tokio::test]
async fn delete_missing_brand_is_not_found() {
    let (_, brands, _db) = setup().await;
    let err = brands.delete(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AtelierError::NotFound { .. }));
}

#[tokio::test]
async fn list_by_ids_skips_missing_brands() {
    let (_, brands, _db) = setup().await;
    let a = brands.create(brand("alpha")).await.unwrap();
    let b = brands.create(brand("beta")).await.unwrap();
    brands.create(brand("gamma")).await.unwrap();

    let wanted = BTreeSet::from([a.id, b.id, Uuid::new_v4()]);
    let found = brands.list_by_ids(&wanted).await.unwrap();

    let found_ids: BTreeSet<Uuid> = found.iter().map(|b| b.id).collect();
    assert_eq!(found_ids, BTreeSet::from([a.id, b.id]));

    assert!(brands.list_by_ids(&BTreeSet::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_brands_with_pagination() {
    let (_, brands, _db) = setup().await;
    for i in 0..4 {
        brands.create(brand(&format!("label-{i}"))).await.unwrap();
    }

    let page = brands
        .list(Pagination {
            offset: 0,
            limit: 3,
        })
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.total, 4);
    assert_eq!(page.items[0].slug, "label-0");
}
