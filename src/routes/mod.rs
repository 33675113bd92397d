pub mod auth;
pub mod billing;
pub mod conversations;
pub mod dashboard;
pub mod documents;
pub mod exchange_rates;
pub mod health;
pub mod import_export;
pub mod issues;
pub mod organizations;
pub mod projects;
pub mod resources;
pub mod risks;
pub mod tasks;
pub mod time_entries;

use crate::{AppState, cache, middleware::auth::auth_middleware, websocket};
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use std::sync::Arc;
use uuid::Uuid;

/// Drops the cached project dashboard after a change to its data.
pub(crate) async fn invalidate_dashboard(state: &AppState, project_id: Uuid) {
    cache::invalidate_project_dashboard(&state.redis, &state.config.redis_channel_prefix, project_id).await;
}

/// Routes reachable without a bearer token.
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh_token))
        .route("/documents/download", get(documents::resolve_download))
}

fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/profile", get(auth::get_profile).put(auth::update_profile))
        .route("/auth/switch-organization", post(auth::switch_organization))
        .route("/organizations", post(organizations::create_organization))
        .route(
            "/organizations/current",
            get(organizations::get_current_organization)
                .put(organizations::update_organization)
                .delete(organizations::delete_organization),
        )
        .route("/members", get(organizations::get_members).post(organizations::add_member))
        .route(
            "/members/:user_id",
            put(organizations::update_member_role).delete(organizations::remove_member),
        )
        .route("/projects", get(projects::get_projects).post(projects::create_project))
        .route(
            "/projects/:project_id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/projects/:project_id/dashboard", get(dashboard::get_project_dashboard))
        .route("/projects/:project_id/tasks", get(tasks::get_tasks).post(tasks::create_task))
        .route(
            "/projects/:project_id/dependencies",
            get(tasks::get_dependencies).post(tasks::create_dependency),
        )
        .route(
            "/projects/:project_id/dependencies/:dependency_id",
            axum::routing::delete(tasks::delete_dependency),
        )
        .route("/projects/:project_id/gantt", get(tasks::get_gantt))
        .route("/projects/:project_id/kanban", get(tasks::get_kanban))
        .route(
            "/tasks/:task_id",
            get(tasks::get_task).put(tasks::update_task).delete(tasks::delete_task),
        )
        .route("/tasks/:task_id/move", post(tasks::move_task))
        .route(
            "/tasks/:task_id/assignments",
            get(resources::get_assignments).post(resources::create_assignment),
        )
        .route(
            "/tasks/:task_id/assignments/:assignment_id",
            axum::routing::delete(resources::delete_assignment),
        )
        .route("/resources", get(resources::get_resources).post(resources::create_resource))
        .route(
            "/resources/:resource_id",
            get(resources::get_resource)
                .put(resources::update_resource)
                .delete(resources::delete_resource),
        )
        .route("/resources/:resource_id/utilization", get(resources::get_resource_utilization))
        .route("/utilization", get(resources::get_utilization))
        .route(
            "/time-entries",
            get(time_entries::get_time_entries).post(time_entries::create_time_entry),
        )
        .route(
            "/time-entries/:entry_id",
            put(time_entries::update_time_entry).delete(time_entries::delete_time_entry),
        )
        .route("/time-entries/:entry_id/submit", post(time_entries::submit_time_entry))
        .route("/time-entries/:entry_id/review", post(time_entries::review_time_entry))
        .route("/timesheet", get(time_entries::get_timesheet))
        .route("/projects/:project_id/risks", get(risks::get_risks).post(risks::create_risk))
        .route("/projects/:project_id/risk-matrix", get(risks::get_risk_matrix))
        .route(
            "/projects/:project_id/risks/:risk_id",
            get(risks::get_risk).put(risks::update_risk).delete(risks::delete_risk),
        )
        .route("/projects/:project_id/issues", get(issues::get_issues).post(issues::create_issue))
        .route(
            "/projects/:project_id/issues/:issue_id",
            get(issues::get_issue).put(issues::update_issue).delete(issues::delete_issue),
        )
        .route(
            "/projects/:project_id/issues/:issue_id/transition",
            post(issues::transition_issue),
        )
        .route(
            "/projects/:project_id/documents",
            get(documents::get_documents).post(documents::create_document),
        )
        .route(
            "/projects/:project_id/documents/:document_id",
            get(documents::get_document)
                .put(documents::update_document)
                .delete(documents::delete_document),
        )
        .route(
            "/projects/:project_id/documents/:document_id/versions",
            get(documents::get_versions).post(documents::add_version),
        )
        .route(
            "/projects/:project_id/documents/:document_id/download-link",
            get(documents::create_download_link),
        )
        .route(
            "/conversations",
            get(conversations::get_conversations).post(conversations::create_conversation),
        )
        .route(
            "/conversations/:conversation_id/messages",
            get(conversations::get_messages).post(conversations::post_message),
        )
        .route("/conversations/:conversation_id/read", post(conversations::mark_read))
        .route(
            "/conversations/:conversation_id/participants",
            post(conversations::add_participant),
        )
        .route("/dashboard", get(dashboard::get_organization_dashboard))
        .route("/projects/:project_id/export/tasks", get(import_export::export_tasks))
        .route("/projects/:project_id/import/tasks", post(import_export::import_tasks))
        .route("/projects/:project_id/export/risks", get(import_export::export_risks))
        .route("/projects/:project_id/export/bundle", get(import_export::export_bundle))
        .route("/project-imports", post(import_export::import_bundle))
        .route("/billing/quote", get(billing::get_quote))
        .route("/exchange-rates", get(exchange_rates::get_rates))
        .route("/exchange-rates/convert", get(exchange_rates::convert))
        .route("/exchange-rates/sync", post(exchange_rates::trigger_sync))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let protected = protected_routes().route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes())
        .merge(protected)
        .merge(websocket::create_websocket_routes())
        .with_state(state)
}
