//! Test utilities shared by the handler, auth and application tests.

use crate::config::{AuthConfig, Config, PoolSettings};
use crate::db::handlers::{Drinks, Questions, Repository};
use crate::db::models::{
    drinks::{DrinkCreateDBRequest, DrinkDBResponse, Ingredient},
    questions::{QuestionCreateDBRequest, QuestionDBResponse},
};
use crate::types::{CategoryId, Service};
use axum_test::TestServer;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use sqlx::SqlitePool;

pub const TEST_SECRET: &str = "quizbrew-test-secret";
pub const TEST_ISSUER: &str = "https://quizbrew-test.eu.auth0.com/";
pub const TEST_AUDIENCE: &str = "coffee";

pub async fn create_test_app(pool: SqlitePool, service: Service) -> TestServer {
    let config = create_test_config(service);

    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub fn create_test_config(service: Service) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        service,
        database: crate::config::DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            pool: PoolSettings {
                max_connections: 1,
                min_connections: 0,
                ..Default::default()
            },
        },
        auth: AuthConfig {
            secret_key: Some(TEST_SECRET.to_string()),
            issuer: TEST_ISSUER.to_string(),
            audience: TEST_AUDIENCE.to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// HS256 token for the test issuer and audience carrying `permissions`, valid for ten minutes
pub fn mint_token(permissions: &[&str]) -> String {
    mint_token_with(json!({
        "iss": TEST_ISSUER,
        "aud": TEST_AUDIENCE,
        "sub": "auth0|test-barista",
        "permissions": permissions,
        "exp": chrono::Utc::now().timestamp() + 600,
    }))
}

/// HS256 token with exactly the given claims
pub fn mint_token_with(claims: serde_json::Value) -> String {
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_SECRET.as_bytes())).expect("Failed to sign test token")
}

pub async fn create_test_question(pool: &SqlitePool, question: &str, category: CategoryId) -> QuestionDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Questions::new(&mut conn)
        .create(&QuestionCreateDBRequest {
            question: question.to_string(),
            answer: format!("Answer to: {question}"),
            category,
            difficulty: 1,
        })
        .await
        .expect("Failed to create test question")
}

/// Drink with a single blue ingredient named after it
pub async fn create_test_drink(pool: &SqlitePool, title: &str) -> DrinkDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Drinks::new(&mut conn)
        .create(&DrinkCreateDBRequest {
            title: title.to_string(),
            recipe: vec![Ingredient {
                name: title.to_string(),
                color: "blue".to_string(),
                parts: 1.into(),
            }],
        })
        .await
        .expect("Failed to create test drink")
}
