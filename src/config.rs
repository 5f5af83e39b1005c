use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use diesel_migrations::MigrationHarness;
use thiserror::Error;
use tokio::task::spawn_blocking;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    MIGRATIONS,
    auth::{
        login::{do_login, do_logout, login_page},
        register::{do_register, register_page},
    },
    competitions::{
        competitors::{
            create_competitor, delete_competitor, get_competitor,
            list_competition_competitors, list_competitors, update_competitor,
        },
        create_competition, delete_competition,
        dives::{
            create_entry, delete_entry,
            fina::fina_lookup,
            get_entry, list_entries,
            sheet::{get_dive_sheet, reopen_dive_sheet, submit_dive_sheet},
            update_entry,
        },
        events::{
            create_event, delete_event, get_event, list_events, update_event,
            view_event_page,
        },
        get_competition, home, list_competitions,
        live::{
            download_leaderboard_csv, get_event_scores, get_leaderboard,
            get_live_results, live_fragment, live_page,
        },
        run_order::{
            delete_run_order, generate_run_order, get_run_order,
            next_in_run_order, run_order_grid, run_order_page,
        },
        scores::{
            do_submit_score_form, entry_scores, judging_page, submit_score,
        },
        update_competition, view_competition_page,
    },
    settings::Settings,
    state::{AppState, DbPool, make_pool, tx_commit},
    users::{do_update_user_role_form, list_users, update_user_role, users_page},
};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("could not open the database: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("could not run migrations: {0}")]
    Migrations(String),
    #[error("migration task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub async fn run_migrations(pool: DbPool) -> Result<(), StartupError> {
    spawn_blocking(move || {
        let mut conn = pool.get()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StartupError::Migrations(e.to_string()))?;
        info!(count = applied.len(), "applied pending migrations");
        Ok(())
    })
    .await?
}

fn html_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login_page).post(do_login))
        .route("/logout", post(do_logout))
        .route("/register", get(register_page).post(do_register))
        .route("/users", get(users_page))
        .route("/users/:id/role", post(do_update_user_role_form))
        .route("/competitions/:id", get(view_competition_page))
        .route("/events/:id", get(view_event_page))
        .route("/events/:id/live", get(live_page))
        .route("/events/:id/live/fragment", get(live_fragment))
        .route("/events/:id/leaderboard.csv", get(download_leaderboard_csv))
        .route("/events/:id/run-order", get(run_order_page))
        .route("/events/:id/run-order/grid", get(run_order_grid))
        .route(
            "/events/:id/judge",
            get(judging_page).post(do_submit_score_form),
        )
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id/role", put(update_user_role))
        .route(
            "/competitions",
            get(list_competitions).post(create_competition),
        )
        .route(
            "/competitions/:id",
            get(get_competition)
                .put(update_competition)
                .delete(delete_competition),
        )
        .route(
            "/competitions/:id/events",
            get(list_events).post(create_event),
        )
        .route(
            "/competitions/:id/competitors",
            get(list_competition_competitors),
        )
        .route(
            "/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route(
            "/events/:id/competitors",
            get(list_competitors).post(create_competitor),
        )
        .route("/events/:id/live-results", get(get_live_results))
        .route("/events/:id/leaderboard", get(get_leaderboard))
        .route("/events/:id/scores", get(get_event_scores))
        .route(
            "/events/:id/run-order",
            get(get_run_order)
                .post(generate_run_order)
                .delete(delete_run_order),
        )
        .route("/events/:id/run-order/next", get(next_in_run_order))
        .route(
            "/competitors/:id",
            get(get_competitor)
                .put(update_competitor)
                .delete(delete_competitor),
        )
        .route(
            "/competitors/:id/entries",
            get(list_entries).post(create_entry),
        )
        .route("/competitors/:id/dive-sheet", get(get_dive_sheet))
        .route("/competitors/:id/dive-sheet/submit", post(submit_dive_sheet))
        .route("/competitors/:id/dive-sheet/reopen", post(reopen_dive_sheet))
        .route(
            "/entries/:id",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/entries/:id/scores", get(entry_scores))
        .route("/scores", post(submit_score))
        .route("/fina/:code/:height", get(fina_lookup))
}

/// Builds the router over an existing pool. Migrations must already have
/// been run.
pub fn make_router(pool: DbPool, settings: Settings) -> Router {
    let state = AppState {
        pool,
        key: settings.cookie_key(),
        settings: Arc::new(settings),
    };

    Router::new()
        .merge(html_routes())
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(tx_commit)),
        )
        .with_state(state)
}

/// Opens the database, brings its schema up to date and builds the router.
pub async fn make_app(settings: Settings) -> Result<Router, StartupError> {
    let pool = make_pool(&settings)?;
    run_migrations(pool.clone()).await?;
    Ok(make_router(pool, settings))
}
