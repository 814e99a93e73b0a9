use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use crate::server::routes::{admin, auth, dashboard, resources, users};
use crate::server::state::AppState;

pub async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = state.config.server.address.clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("starting server on: {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/resources", get(resources::list_resources))
        .route("/resources/search", get(resources::search))
        .route("/resources/recent", get(resources::recent))
        .route("/resources/upload", post(resources::upload))
        .route(
            "/resources/edit-resource/:id",
            get(resources::edit_form).post(resources::edit),
        )
        .route("/resources/delete-resource/:id", post(resources::delete))
        .route("/resources/:id/mark-read", post(resources::mark_read))
        .route("/resources/:id/toggle-star", post(resources::toggle_star))
        .route("/resources/bulk-update", post(resources::bulk_update))
        .route("/resources/bulk-delete", post(resources::bulk_delete))
        .route("/profile", get(users::profile).post(users::update_profile))
        .route("/profile/change-password", post(users::change_password))
        .route("/users/", get(users::list_users))
        .route("/users/:id", get(users::get_user))
        .route("/rss/", get(resources::rss_list))
        .route("/rss/:id", get(resources::rss_get))
        .route("/admin", get(admin::admin_dashboard))
        .route("/admin/delete-user/:id", post(admin::delete_user))
        .with_state(state)
}
