// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, explore, preferences, profile, vote},
    state::AppState,
    utils::{
        guard::{admin_middleware, session_middleware},
        photo::MAX_PHOTO_BYTES,
    },
};

/// Global request body cap. Routes that carry a photo lift it so oversized
/// photos get a proper error.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, profiles, dashboard, explore, questions, admin).
/// * Applies global middleware (Trace, CORS, body limit).
/// * Injects global state (the stores).
pub fn create_router(state: AppState) -> Router {
    let mut origins = vec![
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];
    if let Ok(origin) = state.config.public_origin.trim_end_matches('/').parse::<HeaderValue>() {
        if !origins.contains(&origin) {
            origins.push(origin);
        }
    }

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    let profile_routes = Router::new()
        .route("/", get(profile::list_profiles))
        .route("/{id}/like", post(profile::like_profile))
        .route("/{id}/view", post(profile::view_profile))
        .route("/{id}/links/{link_id}/click", post(profile::click_link));

    // Protected dashboard routes
    let dashboard_routes = Router::new()
        .route(
            "/profile",
            get(profile::get_my_profile)
                .put(profile::save_my_profile)
                .layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES * 2)),
        )
        .route(
            "/photo",
            post(profile::upload_photo).layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES * 2)),
        )
        .route("/auto-style", post(profile::auto_style))
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware));

    let explore_routes = Router::new()
        .route("/", get(explore::explore_feed))
        .route("/markers", get(explore::list_markers))
        .route("/markers/refresh", post(explore::refresh_markers));

    let question_routes = Router::new()
        .route("/", get(vote::list_ranked))
        // Protected question routes
        .merge(
            Router::new()
                .route("/submit", post(vote::submit_question))
                .route("/{id}/vote", post(vote::vote_question))
                .layer(middleware::from_fn_with_state(state.clone(), session_middleware)),
        );

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}", delete(admin::delete_user))
        .route("/users/{id}/ban", post(admin::ban_user))
        .route("/simulate", post(admin::simulate_users))
        .route("/questions", get(admin::list_questions))
        .route("/popups", get(admin::list_popups).post(admin::create_popup))
        .route("/popups/{id}", delete(admin::delete_popup))
        .route("/popups/{id}/toggle", put(admin::toggle_popup))
        .route("/backup", get(admin::download_backup))
        // Double middleware protection: Session first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/profiles", profile_routes)
        .route("/api/public/{username}", get(profile::get_public_profile))
        .nest("/api/dashboard", dashboard_routes)
        .nest("/api/explore", explore_routes)
        .route("/api/regions", get(explore::list_regions))
        .nest("/api/questions", question_routes)
        .route("/api/popups/active", get(preferences::active_popup))
        .route(
            "/api/preferences/theme",
            get(preferences::get_theme).put(preferences::set_theme),
        )
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(BODY_LIMIT)),
        )
        .with_state(state)
}
