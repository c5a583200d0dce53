use std::time::Duration;

use actix_web::web;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use failsafe::backoff::EqualJittered;
use failsafe::failure_policy::{ConsecutiveFailures, OrElse, SuccessRateOverTimeWindow};
use failsafe::{CircuitBreaker, StateMachine};

use crate::config::Settings;
use crate::error::{ServiceError, StoreError};

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

pub type CircuitBreakerType = StateMachine<
    OrElse<SuccessRateOverTimeWindow<EqualJittered>, ConsecutiveFailures<EqualJittered>>,
    (),
>;

const SCHEMA: &str = include_str!("../migrations/schema.sql");

/// Per-connection pragmas. Foreign keys are off by default in SQLite and
/// the setting does not persist, so every new connection needs it.
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions {
    busy_timeout: Duration,
}

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        configure_connection(conn, self.busy_timeout).map_err(r2d2::Error::QueryError)
    }
}

pub fn configure_connection(conn: &mut SqliteConnection, busy_timeout: Duration) -> QueryResult<()> {
    conn.batch_execute(&format!(
        "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
        busy_timeout.as_millis()
    ))
}

/// Creates the tables and indexes if they are missing. Running it against an
/// initialized store leaves existing tables untouched.
pub fn initialize(conn: &mut SqliteConnection) -> Result<(), StoreError> {
    // persisted in the file, a no-op for in-memory stores
    conn.batch_execute("PRAGMA journal_mode = WAL;")?;
    conn.batch_execute(SCHEMA)?;
    Ok(())
}

pub fn init_pool(settings: &Settings) -> Result<DbPool, StoreError> {
    let manager = ConnectionManager::<SqliteConnection>::new(settings.database_url.as_str());
    // every connection to :memory: opens its own private database
    let max_size = if settings.is_in_memory() { 1 } else { settings.pool_size };
    let pool = r2d2::Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(ConnectionOptions {
            busy_timeout: settings.busy_timeout,
        }))
        .build(manager)?;
    Ok(pool)
}

/// Builds the pool, initializes the schema and wraps both in a [`Store`].
pub fn connect(settings: &Settings) -> Result<Store, StoreError> {
    let pool = init_pool(settings)?;
    let mut conn = pool.get()?;
    initialize(&mut conn)?;
    drop(conn);
    Ok(Store::new(pool, failsafe::Config::new().build()))
}

/// Shared handle to the relational store.
///
/// Each [`Store::run`] checks a connection out of the pool on the blocking
/// thread pool, hands it to the closure, and returns it to the pool when the
/// closure finishes, whatever the outcome.
#[derive(Clone)]
pub struct Store {
    pool: DbPool,
    circuit_breaker: CircuitBreakerType,
}

impl Store {
    pub fn new(pool: DbPool, circuit_breaker: CircuitBreakerType) -> Self {
        Self {
            pool,
            circuit_breaker,
        }
    }

    pub async fn run<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, ServiceError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        let circuit_breaker = self.circuit_breaker.clone();

        web::block(move || {
            let result = circuit_breaker.call_with(
                |err: &ServiceError| err.is_outage(),
                || {
                    let mut conn = pool.get().map_err(StoreError::from)?;
                    f(&mut *conn)
                },
            );
            match result {
                Ok(value) => Ok(value),
                Err(failsafe::Error::Inner(err)) => Err(err),
                Err(failsafe::Error::Rejected) => {
                    //sql store is not responsive, fail fast until the breaker closes
                    log::warn!("circuit breaker open, rejecting store call");
                    Err(ServiceError::Unavailable)
                }
            }
        })
        .await?
    }
}
