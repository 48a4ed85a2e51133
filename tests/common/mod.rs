#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use imprint_api::{
    auth::{consts as roles, AuthConfig, AuthService, RegisterUserInput},
    config::AppConfig,
    db,
    entities::{author, book, school, school_stock, user, warehouse_stock},
    events::{self, EventSender},
    handlers::AppServices,
    services::{
        books::CreateBookInput,
        inventory::ReceiveStockInput,
        schools::RegisterSchoolInput,
    },
    AppState,
};

/// Helper harness: application state backed by a throwaway SQLite
/// database, with the event processor running.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub auth_service: Arc<AuthService>,
    db_file: String,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_file = format!("imprint_test_{}.db", Uuid::new_v4());
        let _ = std::fs::remove_file(&db_file);

        let mut cfg = AppConfig::new(
            format!("sqlite://{db_file}?mode=rwc"),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 5;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_cfg = AuthConfig::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            cfg.auth_audience.clone(),
            Duration::from_secs(cfg.jwt_expiration as u64),
        );
        let auth_service = Arc::new(AuthService::new(auth_cfg, db_arc.clone()));

        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            auth_service.clone(),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", imprint_api::api_v1_routes())
            .nest(
                "/auth",
                imprint_api::auth::auth_routes().with_state(auth_service.clone()),
            )
            .layer(axum::middleware::from_fn_with_state(
                auth_service.clone(),
                |axum::extract::State(auth): axum::extract::State<Arc<AuthService>>,
                 mut req: axum::http::Request<Body>,
                 next: axum::middleware::Next| async move {
                    req.extensions_mut().insert(auth);
                    next.run(req).await
                },
            ))
            .layer(axum::middleware::from_fn(
                imprint_api::tracing::request_id_middleware,
            ))
            .with_state(state.clone());

        Self {
            router,
            state,
            auth_service,
            db_file,
            _event_task: event_task,
        }
    }

    /// Registers an admin account and returns it with a bearer token.
    pub async fn create_admin(&self) -> (user::Model, String) {
        let account = self
            .state
            .services
            .auth
            .register_user(RegisterUserInput {
                email: format!("admin-{}@imprintpress.example", Uuid::new_v4()),
                password: "admin-password".to_string(),
                role: roles::ROLE_ADMIN.to_string(),
                school_id: None,
            })
            .await
            .expect("failed to register admin");
        let token = self
            .auth_service
            .generate_token(&account)
            .expect("failed to issue admin token");
        (account, token)
    }

    /// Registers a school-role account bound to the given school.
    pub async fn create_school_user(&self, school_id: i32) -> (user::Model, String) {
        let account = self
            .state
            .services
            .auth
            .register_user(RegisterUserInput {
                email: format!("school-{}@imprintpress.example", Uuid::new_v4()),
                password: "school-password".to_string(),
                role: roles::ROLE_SCHOOL.to_string(),
                school_id: Some(school_id),
            })
            .await
            .expect("failed to register school user");
        let token = self
            .auth_service
            .generate_token(&account)
            .expect("failed to issue school token");
        (account, token)
    }

    /// Creates an author and a book under it, returning the book.
    pub async fn seed_book(&self, price: Decimal) -> book::Model {
        let suffix = Uuid::new_v4();
        let now = Utc::now();
        let writer = author::ActiveModel {
            name: Set("Test Author".to_string()),
            email: Set(format!("author-{suffix}@imprintpress.example")),
            bio: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let writer = writer
            .insert(&*self.state.db)
            .await
            .expect("failed to seed author");

        self.state
            .services
            .books
            .create_book(CreateBookInput {
                title: format!("Test Book {suffix}"),
                isbn: format!("978-{}", &suffix.simple().to_string()[..10]),
                author_id: writer.id,
                price,
            })
            .await
            .expect("failed to seed book")
    }

    /// Registers and approves a school.
    pub async fn seed_approved_school(&self) -> school::Model {
        let suffix = Uuid::new_v4();
        let registered = self
            .state
            .services
            .schools
            .register_school(RegisterSchoolInput {
                name: format!("Test School {suffix}"),
                email: format!("school-{suffix}@example.edu"),
                address: None,
            })
            .await
            .expect("failed to register school");
        self.state
            .services
            .schools
            .approve_school(registered.id)
            .await
            .expect("failed to approve school")
    }

    /// Receives quantity into the warehouse ledger.
    pub async fn receive(&self, book_id: i32, quantity: i32) {
        self.state
            .services
            .inventory
            .receive_stock(ReceiveStockInput { book_id, quantity })
            .await
            .expect("failed to receive stock");
    }

    /// Current warehouse quantity for a book (0 when no ledger row).
    pub async fn warehouse_qty(&self, book_id: i32) -> i32 {
        warehouse_stock::Entity::find()
            .filter(warehouse_stock::Column::BookId.eq(book_id))
            .one(&*self.state.db)
            .await
            .expect("warehouse query failed")
            .map(|row| row.quantity)
            .unwrap_or(0)
    }

    /// Current school-ledger quantity for a (school, book) pair.
    pub async fn school_qty(&self, school_id: i32, book_id: i32) -> i32 {
        school_stock::Entity::find()
            .filter(school_stock::Column::SchoolId.eq(school_id))
            .filter(school_stock::Column::BookId.eq(book_id))
            .one(&*self.state.db)
            .await
            .expect("school stock query failed")
            .map(|row| row.quantity)
            .unwrap_or(0)
    }

    /// Number of school-ledger rows for a (school, book) pair.
    pub async fn school_stock_rows(&self, school_id: i32, book_id: i32) -> u64 {
        use sea_orm::PaginatorTrait;
        school_stock::Entity::find()
            .filter(school_stock::Column::SchoolId.eq(school_id))
            .filter(school_stock::Column::BookId.eq(book_id))
            .count(&*self.state.db)
            .await
            .expect("school stock count failed")
    }

    /// Seeds a school ledger row directly, bypassing the transfer flow.
    pub async fn seed_school_stock(&self, school_id: i32, book_id: i32, quantity: i32) {
        let now = Utc::now();
        let row = school_stock::ActiveModel {
            school_id: Set(school_id),
            book_id: Set(book_id),
            quantity: Set(quantity),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        row.insert(&*self.state.db)
            .await
            .expect("failed to seed school stock");
    }

    /// Sends a request through the router and returns status + JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("failed to build request"),
            None => builder.body(Body::empty()).expect("failed to build request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to read body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", self.db_file, suffix));
        }
    }
}
