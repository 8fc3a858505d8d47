// Integration tests for BaseRepository against a live MongoDB replica set
//
// Run with:
//   TEST_MONGODB_URI=mongodb://localhost:27017/?replicaSet=rs0 \
//     cargo test --test base_repository_test -- --ignored --test-threads=1

#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::http::StatusCode;
use actix_web::ResponseError;
use mongodb::bson::{doc, oid::ObjectId, Document};

use docrepo::core::error_codes::DUPLICATE_KEY;
use docrepo::core::AppError;
use docrepo::repository::FindQuery;
use docrepo::users::User;
use helpers::{create_test_user_repository, TestDataFactory};

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_create_and_find() {
    let repository = create_test_user_repository().await;
    let base = repository.base();

    let email = TestDataFactory::unique_email("ada");
    let created = base.create(User::new(email.clone(), "Ada"), None).await.unwrap();
    let id = created.id.expect("create must assign an id");

    let found = base.find_by_id(id, None).await.unwrap().unwrap();
    assert_eq!(found.email, email);
    assert_eq!(found.version, 0);

    assert!(repository.email_taken(&email).await.unwrap());
    assert_eq!(base.count(doc! { "email": email.as_str() }, None).await.unwrap(), 1);
    assert!(base.find_by_id(ObjectId::new(), None).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_duplicate_email_maps_to_conflict() {
    let repository = create_test_user_repository().await;
    let base = repository.base();

    let email = TestDataFactory::unique_email("dup");
    base.create(User::new(email.clone(), "First"), None).await.unwrap();
    let err = base
        .create(User::new(email, "Second"), None)
        .await
        .unwrap_err();

    assert_eq!(err.driver_code(), Some(DUPLICATE_KEY));
    assert_eq!(err.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_find_with_sort_skip_limit() {
    let repository = create_test_user_repository().await;
    let base = repository.base();

    let users = ["c", "a", "b"]
        .iter()
        .map(|name| User::new(format!("{}@sort.example.com", name), *name))
        .collect();
    let created = base.create_many(users, None).await.unwrap();
    assert!(created.iter().all(|u| u.id.is_some()));

    let query = FindQuery::new(doc! { "email": { "$regex": "@sort\\.example\\.com$" } })
        .sort(doc! { "name": 1 })
        .skip(1)
        .limit(1);
    let page = base.find(query, None).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].name, "b");

    let projected = base
        .find_documents(
            FindQuery::new(doc! { "name": "a" }).projection(doc! { "_id": 0, "name": 1 }),
            None,
        )
        .await
        .unwrap();
    assert_eq!(projected, vec![doc! { "name": "a" }]);

    let paged = base
        .paginate(Document::new(), Some(doc! { "name": 1 }), 2, 2)
        .await
        .unwrap();
    assert_eq!(paged.total, 3);
    assert_eq!(paged.total_pages(), 2);
    assert_eq!(paged.items.len(), 1);
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_update_by_id_checks_version() {
    let repository = create_test_user_repository().await;
    let base = repository.base();

    let created = base
        .create(User::new(TestDataFactory::unique_email("occ"), "Grace"), None)
        .await
        .unwrap();
    let id = created.id.unwrap();

    let updated = base
        .update_by_id(id, doc! { "name": "Grace Hopper" }, 0)
        .await
        .unwrap();
    assert_eq!(updated.name, "Grace Hopper");
    assert_eq!(updated.version, 1);

    let stale = base
        .update_by_id(id, doc! { "name": "Stale" }, 0)
        .await
        .unwrap_err();
    assert!(matches!(stale, AppError::Conflict(_)));

    let missing = base
        .update_by_id(ObjectId::new(), doc! { "name": "Nobody" }, 0)
        .await
        .unwrap_err();
    assert!(matches!(missing, AppError::NotFound(_)));

    let current = base.find_by_id(id, None).await.unwrap().unwrap();
    assert_eq!(current.name, "Grace Hopper");
    assert_eq!(current.version, 1);
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_update_by_id_rolls_back_on_driver_error() {
    let repository = create_test_user_repository().await;
    let base = repository.base();

    let taken = TestDataFactory::unique_email("taken");
    base.create(User::new(taken.clone(), "Owner"), None).await.unwrap();
    let other = base
        .create(User::new(TestDataFactory::unique_email("other"), "Other"), None)
        .await
        .unwrap();
    let id = other.id.unwrap();

    let err = base
        .update_by_id(id, doc! { "name": "Renamed", "email": taken.as_str() }, 0)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::CONFLICT);
    assert_eq!(err.driver_code(), Some(DUPLICATE_KEY));

    let current = base.find_by_id(id, None).await.unwrap().unwrap();
    assert_eq!(current.name, "Other");
    assert_eq!(current.email, other.email);
    assert_eq!(current.version, 0);
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_update_and_delete_many() {
    let repository = create_test_user_repository().await;
    let base = repository.base();

    for name in ["x", "y"] {
        base.create(User::new(format!("{}@bulk.example.com", name), name), None)
            .await
            .unwrap();
    }
    let filter = doc! { "email": { "$regex": "@bulk\\.example\\.com$" } };

    let modified = base
        .update_many(filter.clone(), doc! { "$set": { "name": "bulk" } }, None)
        .await
        .unwrap();
    assert_eq!(modified, 2);

    let one = base
        .update_one(doc! { "email": "x@bulk.example.com" }, doc! { "name": "solo" }, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(one.name, "solo");

    assert!(base.delete_one(doc! { "name": "solo" }, None).await.unwrap());
    assert!(!base.delete_one(doc! { "name": "solo" }, None).await.unwrap());
    assert_eq!(base.delete_many(filter.clone(), None).await.unwrap(), 1);
    assert!(!base.exists(filter, None).await.unwrap());
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_aggregate_by_domain() {
    let repository = create_test_user_repository().await;
    let base = repository.base();

    for email in ["a@one.test", "b@one.test", "c@two.test"] {
        base.create(User::new(email, "n"), None).await.unwrap();
    }

    let counts = repository.count_by_domain().await.unwrap();
    assert_eq!(counts[0].domain, "one.test");
    assert_eq!(counts[0].count, 2);
    assert_eq!(counts[1].domain, "two.test");
    assert_eq!(counts[1].count, 1);
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_aborted_transaction_discards_writes() {
    let repository = create_test_user_repository().await;
    let base = repository.base();

    let email = TestDataFactory::unique_email("tx");
    let mut session = base.start_session().await.unwrap();
    base.start_transaction(&mut session).await.unwrap();
    base.create(User::new(email.clone(), "Temp"), Some(&mut session))
        .await
        .unwrap();
    assert!(base
        .exists(doc! { "email": email.as_str() }, Some(&mut session))
        .await
        .unwrap());
    base.abort_transaction(&mut session).await.unwrap();
    base.end_session(session);

    assert!(repository.find_by_email(&email).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_committed_transaction_keeps_writes() {
    let repository = create_test_user_repository().await;
    let base = repository.base();

    let email = TestDataFactory::unique_email("commit");
    let mut session = base.start_session().await.unwrap();
    base.start_transaction(&mut session).await.unwrap();
    base.upsert(
        doc! { "email": email.as_str() },
        doc! {
            "$setOnInsert": {
                "name": "Upserted",
                "createdAt": mongodb::bson::DateTime::now(),
                "__v": 0_i64,
            }
        },
        Some(&mut session),
    )
    .await
    .unwrap();
    base.commit_transaction(&mut session).await.unwrap();
    base.end_session(session);

    let user = repository.find_by_email(&email).await.unwrap().unwrap();
    assert_eq!(user.name, "Upserted");
}
