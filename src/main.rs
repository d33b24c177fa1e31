mod announcements;
mod auth;
mod config;
mod db;
mod email;
mod error;
mod extract;
mod response;
mod users;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use announcements::notifier::{LogNotifier, Notifier};
use announcements::repository::{AnnouncementStore, PgAnnouncementStore};
use auth::middleware::RequireRoles;
use auth::models::Role;
use auth::repository::{PgUserStore, UserStore};
use auth::service::AuthService;
use auth::token::TokenService;
use config::Config;
use email::{LogMailer, Mailer};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::signup,
        auth::handlers::login,
        auth::handlers::refresh,
        auth::handlers::forgot,
        auth::handlers::reset,
        auth::handlers::me,
        users::handlers::list_users,
        users::handlers::get_user,
        users::handlers::update_user,
        users::handlers::update_role,
        users::handlers::search_users,
        users::handlers::checkin,
        users::handlers::checkin_list,
        announcements::handlers::list_announcements,
        announcements::handlers::create_announcement,
        announcements::handlers::release_announcement,
        announcements::handlers::delete_announcement,
    ),
    components(schemas(
        auth::models::Role,
        auth::models::UserResponse,
        auth::models::SignupRequest,
        auth::models::LoginRequest,
        auth::models::ForgotRequest,
        auth::models::ResetRequest,
        auth::models::AuthResponse,
        users::models::UpdateUserRequest,
        users::models::RoleRequest,
        announcements::models::AnnouncementResponse,
        announcements::models::CreateAnnouncementRequest,
    )),
    tags(
        (name = "auth", description = "Signup, login, and password-reset flows"),
        (name = "users", description = "User listings and profile management"),
        (name = "admin", description = "Role assignment and user search"),
        (name = "exec", description = "Event check-in"),
        (name = "announcements", description = "Event announcements")
    ),
    info(
        title = "Hackathon Registration API",
        version = "1.0.0",
        description = "Registration, authentication, and event operations for hackathon participants"
    )
)]
struct ApiDoc;

const EXEC_ONLY: &[Role] = &[Role::Exec];
const ADMIN_ONLY: &[Role] = &[Role::Admin];
/// Any authenticated principal
const ANY_ROLE: &[Role] = &[];

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub announcements: Arc<dyn AnnouncementStore>,
    pub tokens: TokenService,
    pub auth: AuthService,
    pub mailer: Arc<dyn Mailer>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        announcements: Arc<dyn AnnouncementStore>,
        tokens: TokenService,
        mailer: Arc<dyn Mailer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let auth = AuthService::new(users.clone(), tokens.clone(), mailer.clone());
        Self {
            users,
            announcements,
            tokens,
            auth,
            mailer,
            notifier,
        }
    }
}

/// Reports unhandled server errors to operators. The response has already
/// been sanitized by the time it gets here; the email carries only the
/// endpoint, and delivery never delays the response.
async fn report_server_errors(state: AppState, request: Request<Body>, next: Next) -> Response {
    let endpoint = request.uri().path().to_string();
    let response = next.run(request).await;

    if response.status() == StatusCode::INTERNAL_SERVER_ERROR {
        let mailer = state.mailer.clone();
        tokio::spawn(async move {
            let message = format!("Internal server error on {}", endpoint);
            if let Err(e) = mailer.send_error_email(&message).await {
                tracing::warn!("Failed to send error report email: {}", e);
            }
        });
    }

    response
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds role guards and CORS
fn create_router(state: AppState) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let exec = RequireRoles::new(state.clone(), EXEC_ONLY);
    let exec_layer = middleware::from_fn(move |request: Request<Body>, next: Next| {
        let guard = exec.clone();
        async move { guard.handle(request, next).await }
    });

    let admin = RequireRoles::new(state.clone(), ADMIN_ONLY);
    let admin_layer = middleware::from_fn(move |request: Request<Body>, next: Next| {
        let guard = admin.clone();
        async move { guard.handle(request, next).await }
    });

    let authed = RequireRoles::new(state.clone(), ANY_ROLE);
    let authed_layer = middleware::from_fn(move |request: Request<Body>, next: Next| {
        let guard = authed.clone();
        async move { guard.handle(request, next).await }
    });

    let reporter_state = state.clone();
    let error_reports = middleware::from_fn(move |request: Request<Body>, next: Next| {
        let state = reporter_state.clone();
        async move { report_server_errors(state, request, next).await }
    });

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Authentication
        .route("/api/auth/signup", post(auth::handlers::signup))
        .route("/api/auth/login", post(auth::handlers::login))
        .route("/api/auth/refresh", get(auth::handlers::refresh))
        .route("/api/auth/forgot", post(auth::handlers::forgot))
        .route("/api/auth/reset", post(auth::handlers::reset))
        .route(
            "/api/auth/me",
            get(auth::handlers::me).route_layer(authed_layer.clone()),
        )
        // User management; profile edits enforce self-or-admin themselves
        .route(
            "/api/users",
            get(users::handlers::list_users).route_layer(exec_layer.clone()),
        )
        .route(
            "/api/users/:id",
            get(users::handlers::get_user).route_layer(exec_layer.clone()),
        )
        .route(
            "/api/users/:id",
            put(users::handlers::update_user).route_layer(authed_layer),
        )
        // Admin surface
        .route(
            "/api/admin/role",
            post(users::handlers::update_role).route_layer(admin_layer.clone()),
        )
        .route(
            "/api/admin/users",
            get(users::handlers::search_users).route_layer(admin_layer),
        )
        // Check-in
        .route(
            "/api/exec/checkin/:email",
            post(users::handlers::checkin).route_layer(exec_layer.clone()),
        )
        .route(
            "/api/exec/checkin",
            get(users::handlers::checkin_list).route_layer(exec_layer.clone()),
        )
        // Announcements; the feed is public, everything else is staff-only
        .route(
            "/api/announcements",
            get(announcements::handlers::list_announcements),
        )
        .route(
            "/api/announcements",
            post(announcements::handlers::create_announcement).route_layer(exec_layer.clone()),
        )
        .route(
            "/api/announcements/release/:id",
            post(announcements::handlers::release_announcement).route_layer(exec_layer.clone()),
        )
        .route(
            "/api/announcements/:id",
            delete(announcements::handlers::delete_announcement).route_layer(exec_layer),
        )
        .layer(error_reports)
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    tracing::info!("Hackathon API - Starting...");

    let config = Config::from_env().expect("Invalid configuration");

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    // Run SQLx migrations on startup
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    let tokens = TokenService::new(config.secret.clone(), config.session_ttl, config.reset_ttl);
    let state = AppState::new(
        Arc::new(PgUserStore::new(pool.clone())),
        Arc::new(PgAnnouncementStore::new(pool)),
        tokens,
        Arc::new(LogMailer),
        Arc::new(LogNotifier),
    );

    let app = create_router(state);

    // Start the Axum server
    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Hackathon API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}
