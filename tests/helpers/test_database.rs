// Test database helpers
//
// Integration tests need a MongoDB replica set (transactions are not
// available on a standalone server), e.g.
//   docker run -p 27017:27017 mongo:7 --replSet rs0
//   mongosh --eval 'rs.initiate()'

use mongodb::Client;

use docrepo::repository::RepositoryOptions;
use docrepo::users::UserRepository;

/// Connect to TEST_MONGODB_URI, falling back to a local replica set
pub async fn create_test_client() -> Client {
    let uri = std::env::var("TEST_MONGODB_URI")
        .or_else(|_| std::env::var("MONGODB_URI"))
        .unwrap_or_else(|_| "mongodb://localhost:27017/?replicaSet=rs0".to_string());

    Client::with_uri_str(&uri).await.unwrap_or_else(|e| {
        panic!(
            "Failed to connect to test database at {}: {}\n\n\
             Troubleshooting:\n\
             1. Ensure MongoDB is running as a replica set\n\
             2. Verify TEST_MONGODB_URI or MONGODB_URI is set correctly",
            uri, e
        )
    })
}

pub fn test_database_name() -> String {
    std::env::var("TEST_MONGODB_DATABASE").unwrap_or_else(|_| "docrepo_test".to_string())
}

/// User repository bound to the test database with a clean collection
pub async fn create_test_user_repository() -> UserRepository {
    let client = create_test_client().await;
    let repository = UserRepository::new(
        client,
        &test_database_name(),
        RepositoryOptions { log_errors: true },
    );

    repository
        .base()
        .delete_many(mongodb::bson::Document::new(), None)
        .await
        .expect("Failed to clear users collection");
    repository
        .ensure_indexes()
        .await
        .expect("Failed to create user indexes");

    repository
}
