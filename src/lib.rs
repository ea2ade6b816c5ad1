use crate::cli::Args;
use crate::identity::{HttpIdentityService, IdentityService};
use crate::ranking::{PointsRanking, RankingService};
use anyhow::Context;
use axum::Router;
use axum::routing::{get, post};
use deadpool_diesel::Runtime;
use deadpool_diesel::postgres::{Manager, Pool};
use std::sync::Arc;
use tracing::info;

pub mod cli;
pub mod errors;
pub mod identity;
pub mod model;
pub mod payloads;
pub mod ranking;
pub mod refresh;
pub mod response;
pub mod schema;

mod api;

/// Everything a handler needs: the data store pool and the two external
/// collaborators, passed as capability objects.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub identity: Arc<dyn IdentityService>,
    pub ranking: Arc<dyn RankingService>,
}

pub fn init_router(args: &Args) -> anyhow::Result<Router> {
    info!("Initializing database pool...");
    let pool = init_pool(&args.connection_str, args.db_pool_max_size)
        .context("Failed to initialize database pool")?;

    info!("Initializing identity service client...");
    let identity: Arc<dyn IdentityService> = Arc::new(HttpIdentityService::new(
        args.identity_service_url.clone(),
        args.identity_service_key.clone(),
    ));

    let ranking: Arc<dyn RankingService> = Arc::new(PointsRanking::new(pool.clone()));

    info!("Initializing router...");
    Ok(init_router_internal(AppState {
        pool,
        identity,
        ranking,
    }))
}

pub fn init_test_router(
    pool: Pool,
    identity: Arc<dyn IdentityService>,
    ranking: Arc<dyn RankingService>,
) -> Router {
    init_router_internal(AppState {
        pool,
        identity,
        ranking,
    })
}

fn init_router_internal(state: AppState) -> Router {
    let account_api = account_routes();
    let profile_api = profile_routes();

    Router::new()
        .nest("/account", account_api)
        .nest("/profile", profile_api)
        .with_state(state)
}

fn init_pool(conn_str: &str, max_size: u32) -> anyhow::Result<Pool> {
    let manager = Manager::new(conn_str, Runtime::Tokio1);
    let pool = Pool::builder(manager).max_size(max_size as usize).build()?;
    Ok(pool)
}

fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(api::account::sign_up))
        .route("/sign-in", post(api::account::sign_in))
        .route("/forgot-password", post(api::account::forgot_password))
        .route("/reset-password", post(api::account::reset_password))
        .route("/sign-out", post(api::account::sign_out))
}

fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api::profile::get_profile))
        .route("/watch", get(api::profile::watch_profile))
}
