//! # quizbrew: trivia quiz and coffee-shop menu APIs
//!
//! `quizbrew` serves one of two small JSON APIs over HTTP, backed by SQLite:
//!
//! - **trivia**: question categories, a paginated question list, question creation, deletion and
//!   substring search, per-category listings, and a quiz endpoint that hands out one random
//!   question at a time without repeating any the player has already seen.
//! - **coffee**: a drinks menu. The public listing shows each drink's colours and proportions;
//!   the full recipes and every write operation need a bearer JWT carrying the matching
//!   permission (`get:drinks-detail`, `post:drinks`, `patch:drinks`, `delete:drinks`).
//!
//! Which API a process serves is chosen with `--service` (or `service:` in the config file).
//!
//! ## Architecture
//!
//! Built on [Axum](https://github.com/tokio-rs/axum) and [SQLx](https://github.com/launchbadge/sqlx).
//! Requests flow through CORS, tracing and (optionally) Prometheus layers into a handler, which
//! runs one repository operation and renders a `{"success": true, ...}` body. Failures are typed
//! [`errors::Error`] values rendered as `{"success": false, "error", "message"}`; the trivia
//! router renders `error` as a string and the coffee router as a number.
//!
//! Tokens are verified with either a shared HS256 secret or the RS256 key set of an identity
//! provider, fetched once at startup (see [`auth`]).
//!
//! ## Getting Started
//!
//! ```bash
//! quizbrew --service trivia -f config.yaml
//! QUIZBREW_AUTH__SECRET_KEY=dev QUIZBREW_AUTH__ISSUER=dev QUIZBREW_AUTH__AUDIENCE=coffee \
//!     quizbrew --service coffee
//! ```
//!
//! See [`config`] for every setting and its environment variable.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    api::handlers::{categories, drinks, healthz, method_not_allowed, questions, quizzes, route_not_found},
    auth::token::TokenVerifier,
    config::CorsOrigin,
    db::handlers::{Drinks, Questions, Repository},
    db::models::{
        drinks::{DrinkCreateDBRequest, Ingredient},
        questions::QuestionCreateDBRequest,
    },
    types::Service,
};
use axum::{
    Router, http,
    middleware::map_response,
    routing::{delete, get, patch, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::{str::FromStr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};

/// Application state shared across all request handlers.
///
/// - `db`: SQLite connection pool
/// - `config`: Application configuration loaded from file and environment
/// - `token_verifier`: Bearer-token verification, present when serving the coffee-shop API
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .maybe_token_verifier(verifier)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub token_verifier: Option<Arc<TokenVerifier>>,
}

/// Get the quizbrew database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Questions inserted by [`seed_sample_questions`]: (question, answer, category, difficulty)
const SAMPLE_QUESTIONS: &[(&str, &str, i64, i64)] = &[
    ("What is the heaviest organ in the human body?", "The Liver", 1, 4),
    ("Who discovered penicillin?", "Alexander Fleming", 1, 3),
    ("Hematology is a branch of medicine involving the study of what?", "Blood", 1, 4),
    ("La Giaconda is better known as what?", "Mona Lisa", 2, 3),
    ("How many paintings did Van Gogh sell in his lifetime?", "One", 2, 4),
    (
        "Which American artist was a pioneer of Abstract Expressionism, and a leading exponent of action painting?",
        "Jackson Pollock",
        2,
        2,
    ),
    ("Which Dutch graphic artist, initials M C, was a creator of optical illusions?", "Escher", 2, 1),
    ("What is the largest lake in Africa?", "Lake Victoria", 3, 2),
    ("In which royal palace would you find the Hall of Mirrors?", "The Palace of Versailles", 3, 3),
    ("The Taj Mahal is located in which Indian city?", "Agra", 3, 2),
    ("Whose autobiography is entitled 'I Know Why the Caged Bird Sings'?", "Maya Angelou", 4, 2),
    ("What boxer's original name is Cassius Clay?", "Muhammad Ali", 4, 1),
    ("Who invented Peanut Butter?", "George Washington Carver", 4, 2),
    ("Which dung beetle was worshipped by the ancient Egyptians?", "Scarab", 4, 4),
    ("What movie earned Tom Hanks his third straight Oscar nomination, in 1996?", "Apollo 13", 5, 4),
    (
        "What actor did author Anne Rice first denounce, then praise in the role of her beloved Lestat?",
        "Tom Cruise",
        5,
        4,
    ),
    (
        "What was the title of the 1990 fantasy directed by Tim Burton about a young man with multi-bladed appendages?",
        "Edward Scissorhands",
        5,
        3,
    ),
    ("Which is the only team to play in every soccer World Cup tournament?", "Brazil", 6, 3),
    ("Which country won the first ever soccer World Cup in 1930?", "Uruguay", 6, 4),
];

/// Insert the sample trivia questions.
///
/// Runs once per database: the `questions_seeded` flag in `system_config` is set in the same
/// transaction, so later startups (and questions deleted since) are left alone.
#[instrument(skip_all, err)]
pub async fn seed_sample_questions(db: &SqlitePool) -> anyhow::Result<()> {
    let mut tx = db.begin().await?;

    let seeded: Option<bool> = sqlx::query_scalar("SELECT value FROM system_config WHERE key = 'questions_seeded'")
        .fetch_optional(&mut *tx)
        .await?;

    if let Some(true) = seeded {
        info!("Sample questions already seeded, skipping");
        tx.commit().await?;
        return Ok(());
    }

    {
        let mut repo = Questions::new(&mut tx);
        for (question, answer, category, difficulty) in SAMPLE_QUESTIONS {
            repo.create(&QuestionCreateDBRequest {
                question: question.to_string(),
                answer: answer.to_string(),
                category: *category,
                difficulty: *difficulty,
            })
            .await?;
        }
    }

    sqlx::query(
        "INSERT INTO system_config (key, value, updated_at) VALUES ('questions_seeded', TRUE, CURRENT_TIMESTAMP)
         ON CONFLICT (key) DO UPDATE SET value = TRUE, updated_at = CURRENT_TIMESTAMP",
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    info!("Seeded {} sample questions", SAMPLE_QUESTIONS.len());

    Ok(())
}

/// Drop every drink and recreate the sample "water" drink
#[instrument(skip_all, err)]
pub async fn reset_drinks(db: &SqlitePool) -> anyhow::Result<()> {
    let mut tx = db.begin().await?;

    let removed;
    {
        let mut repo = Drinks::new(&mut tx);
        removed = repo.delete_all().await?;
        repo.create(&DrinkCreateDBRequest {
            title: "water".to_string(),
            recipe: vec![Ingredient {
                name: "water".to_string(),
                color: "blue".to_string(),
                parts: 1.into(),
            }],
        })
        .await?;
    }

    tx.commit().await?;
    info!("Drinks reset ({} removed), sample drink created", removed);

    Ok(())
}

/// Open the SQLite pool described by `database`. Foreign keys are enforced on every connection.
async fn connect(database: &config::DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&database.url)?.foreign_keys(true);
    let pool_settings = &database.pool;

    let pool = SqlitePoolOptions::new()
        .max_connections(pool_settings.max_connections)
        .min_connections(pool_settings.min_connections)
        .acquire_timeout(Duration::from_secs(pool_settings.acquire_timeout_secs))
        .idle_timeout((pool_settings.idle_timeout_secs > 0).then(|| Duration::from_secs(pool_settings.idle_timeout_secs)))
        .max_lifetime((pool_settings.max_lifetime_secs > 0).then(|| Duration::from_secs(pool_settings.max_lifetime_secs)))
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Run migrations, then the startup data steps the config asks for
async fn prepare_database(config: &Config, pool: &SqlitePool) -> anyhow::Result<()> {
    migrator().run(pool).await?;

    match config.service {
        Service::Trivia if config.trivia.seed_sample_questions => seed_sample_questions(pool).await?,
        Service::Coffee if config.coffee.reset_on_startup => reset_drinks(pool).await?,
        _ => {}
    }

    Ok(())
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let origins = &config.cors.allowed_origins;

    let allow_origin = if origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut values = Vec::new();
        for origin in origins {
            if let CorsOrigin::Url(url) = origin {
                // Origins never carry a path; Url renders a bare origin with a trailing '/'
                values.push(url.as_str().trim_end_matches('/').parse::<http::HeaderValue>()?);
            }
        }
        AllowOrigin::list(values)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_methods([
            http::Method::GET,
            http::Method::PATCH,
            http::Method::POST,
            http::Method::DELETE,
            http::Method::OPTIONS,
        ]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Routes of the trivia API
pub fn build_trivia_router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(categories::list_categories))
        .route("/categories/{category_id}/questions", get(categories::list_category_questions))
        .route(
            "/questions",
            get(questions::list_questions).post(questions::create_or_search_questions),
        )
        .route("/questions/{question_id}", delete(questions::delete_question))
        .route("/quizzes", post(quizzes::next_quiz_question))
}

/// Routes of the coffee-shop API
pub fn build_coffee_router() -> Router<AppState> {
    Router::new()
        .route("/drinks", get(drinks::list_drinks).post(drinks::create_drink))
        .route("/drinks-detail", get(drinks::list_drinks_detail))
        .route("/drinks/{drink_id}", patch(drinks::update_drink).delete(drinks::delete_drink))
}

/// Build the router for the configured service, with health check, JSON fallbacks, CORS,
/// optional Prometheus metrics and request tracing.
///
/// # Errors
///
/// Returns an error if a configured CORS origin isn't a valid header value.
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let routes = match state.config.service {
        Service::Trivia => build_trivia_router(),
        Service::Coffee => build_coffee_router(),
    };

    let mut routes = routes
        .route("/healthz", get(healthz))
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed);

    // The trivia API has always reported error codes as strings
    if state.config.service == Service::Trivia {
        routes = routes.layer(map_response(errors::with_string_error_codes));
    }

    let mut router = routes.with_state(state.clone()).layer(create_cors_layer(&state.config)?);

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create the application, reusing `pool` if given instead of connecting to `database.url`
    pub async fn new_with_pool(config: Config, pool: Option<SqlitePool>) -> anyhow::Result<Self> {
        debug!("Starting quizbrew with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => pool,
            None => connect(&config.database).await?,
        };
        prepare_database(&config, &pool).await?;

        let token_verifier = match config.service {
            Service::Coffee => Some(Arc::new(TokenVerifier::from_config(&config.auth).await?)),
            Service::Trivia => None,
        };

        let app_state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .maybe_token_verifier(token_verifier)
            .build();

        let router = build_router(&app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "quizbrew ({} API) listening on http://{}, available at http://localhost:{}",
            self.config.service, bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
