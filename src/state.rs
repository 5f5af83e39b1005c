use std::{
    ops::{Deref, DerefMut},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::Key;
use diesel::{
    SqliteConnection,
    connection::{SimpleConnection, TransactionManager},
    r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection},
};
use tokio::sync::OwnedMutexGuard;
use tracing::error;

use crate::{settings::Settings, util_resp::FailureResponse};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type PooledConn = PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub key: Key,
    pub settings: Arc<Settings>,
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

impl FromRef<AppState> for Arc<Settings> {
    fn from_ref(state: &AppState) -> Self {
        state.settings.clone()
    }
}

/// Turns on foreign keys (so that deletes cascade) for every connection the
/// pool hands out.
#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error>
    for SqlitePragmas
{
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn make_pool(settings: &Settings) -> Result<DbPool, diesel::r2d2::PoolError> {
    let builder = Pool::builder()
        .max_size(settings.pool_size())
        .connection_customizer(Box::new(SqlitePragmas))
        .connection_timeout(Duration::from_secs(30));

    // An in-memory database lives exactly as long as its one connection.
    let builder = if settings.is_in_memory() {
        builder.idle_timeout(None).max_lifetime(None)
    } else {
        builder
    };

    builder.build(ConnectionManager::<SqliteConnection>::new(
        &settings.database_url,
    ))
}

/// Per-request connection slot. Extractors fill it lazily, and
/// [`tx_commit`] ends any transaction opened in it once the handler has
/// produced a response.
#[derive(Clone, Default)]
pub struct ThreadSafeConn {
    inner: Arc<tokio::sync::Mutex<Option<PooledConn>>>,
    in_tx: Arc<AtomicBool>,
}

/// Commits the request's transaction if the response was a success or a
/// redirect, otherwise rolls it back.
pub async fn tx_commit(mut req: Request, next: Next) -> Response {
    let slot = ThreadSafeConn::default();
    req.extensions_mut().insert(slot.clone());

    let res = next.run(req).await;

    if !slot.in_tx.load(Ordering::SeqCst) {
        return res;
    }

    let mut guard = slot.inner.lock().await;
    let Some(conn) = guard.as_mut() else {
        return res;
    };

    let status = res.status();
    let outcome = if status.is_success()
        || status.is_redirection()
        || status.is_informational()
    {
        <PooledConn as diesel::Connection>::TransactionManager::commit_transaction(conn)
    } else {
        <PooledConn as diesel::Connection>::TransactionManager::rollback_transaction(conn)
    };

    match outcome {
        Ok(()) => res,
        Err(e) => {
            error!("failed to end transaction: {e}");
            FailureResponse::ServerError(()).into_response()
        }
    }
}

/// A database connection for the duration of a handler. With `TX = true`
/// the work done through it is committed or rolled back as a unit.
pub struct Conn<const TX: bool> {
    /// Always `Some`: the extractor fills the slot before building this.
    inner: OwnedMutexGuard<Option<PooledConn>>,
}

impl<const TX: bool> Deref for Conn<TX> {
    type Target = PooledConn;

    fn deref(&self) -> &Self::Target {
        match self.inner.deref() {
            Some(conn) => conn,
            None => unreachable!("connection slot is filled on extraction"),
        }
    }
}

impl<const TX: bool> DerefMut for Conn<TX> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self.inner.deref_mut() {
            Some(conn) => conn,
            None => unreachable!("connection slot is filled on extraction"),
        }
    }
}

#[async_trait]
impl<S, const TX: bool> FromRequestParts<S> for Conn<TX>
where
    S: Send + Sync,
    DbPool: FromRef<S>,
{
    type Rejection = FailureResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let slot = parts
            .extensions
            .get::<ThreadSafeConn>()
            .cloned()
            .ok_or_else(|| {
                error!("request reached a handler without a connection slot");
                FailureResponse::ServerError(())
            })?;

        let mut guard: OwnedMutexGuard<Option<PooledConn>> =
            slot.inner.clone().lock_owned().await;

        if guard.is_none() {
            let pool = DbPool::from_ref(state);
            let conn = tokio::task::spawn_blocking(move || pool.get())
                .await
                .map_err(|e| {
                    error!("connection checkout task failed: {e}");
                    FailureResponse::ServerError(())
                })??;
            *guard = Some(conn);
        }

        if TX && !slot.in_tx.load(Ordering::SeqCst) {
            if let Some(conn) = guard.as_mut() {
                <PooledConn as diesel::Connection>::TransactionManager::begin_transaction(conn)?;
                slot.in_tx.store(true, Ordering::SeqCst);
            }
        }

        Ok(Conn { inner: guard })
    }
}
