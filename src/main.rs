use anyhow::{Context, Result};
use hpt_auth::application::{
    commands::oauth::GrantLifetimes,
    ports::{
        security::TokenManager, session::SessionRepository, time::Clock, util::SecretGenerator,
    },
    services::{ApplicationServices, ServiceSettings},
};
use hpt_auth::config::{AppConfig, SeedClient, SessionBackend, StorageBackend};
use hpt_auth::domain::{
    client::{Client, ClientRegistry},
    errors::DomainError,
    oauth::TokenStore,
    user::{UserDirectory, UserIdentity},
};
use hpt_auth::infrastructure::{
    database,
    gc::GarbageCollector,
    repositories::{
        InMemoryClientRegistry, InMemoryUserDirectory, PostgresClientRegistry, PostgresTokenStore,
        PostgresUserDirectory,
    },
    security::{
        redis_session_store::RedisSessionRepository, session_store::InMemorySessionRepository,
        token::BiscuitTokenManager, token_store::InMemoryTokenStore,
    },
    time::SystemClock,
    util::RandomSecretGenerator,
};
use hpt_auth::presentation::http::{
    routes::build_router_with_rate_limiter,
    state::{HttpSettings, HttpState},
};
use std::{net::SocketAddr, sync::Arc};
use tokio::{signal, sync::watch};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    if let Err(err) = bootstrap().await {
        tracing::error!(error = %err, "fatal error");
        eprintln!("fatal error: {err:#}");
        std::process::exit(1);
    }
}

struct Storage {
    clients: Arc<dyn ClientRegistry>,
    tokens: Arc<dyn TokenStore>,
    users: Arc<dyn UserDirectory>,
}

async fn bootstrap() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let secrets: Arc<dyn SecretGenerator> = Arc::new(RandomSecretGenerator);

    let storage = init_storage(&config).await?;
    let sessions = init_sessions(&config)?;
    register_seed_client(storage.clients.as_ref(), config.seed_client()).await?;

    let token_manager: Arc<dyn TokenManager> = Arc::new(BiscuitTokenManager::new(
        config.biscuit_private_key(),
        Arc::clone(&clock),
    )?);

    let session_signing_key = match config.session_secret() {
        Some(secret) => secret.as_bytes().to_vec(),
        None => {
            tracing::warn!("SESSION_SECRET not set; sessions will not survive a restart");
            secrets.generate().into_bytes()
        }
    };

    let settings = ServiceSettings {
        lifetimes: GrantLifetimes {
            code_ttl: chrono::Duration::from_std(config.auth_code_ttl())?,
            token_ttl: chrono::Duration::from_std(config.token_ttl())?,
        },
        session_ttl: config.session_ttl(),
        session_signing_key,
    };

    let services = Arc::new(ApplicationServices::new(
        storage.clients,
        storage.tokens,
        storage.users,
        sessions,
        token_manager,
        Arc::clone(&secrets),
        Arc::clone(&clock),
        settings,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let gc = GarbageCollector::new(
        services.token_store(),
        services.session_repository(),
        Arc::clone(&clock),
        config.gc_interval(),
        config.gc_batch_size(),
    )
    .spawn(shutdown_rx);

    let state = HttpState {
        services: Arc::clone(&services),
        settings: HttpSettings {
            session_cookie_name: config.session_cookie_name().to_string(),
            session_cookie_secure: config.session_cookie_secure(),
            request_timeout: config.request_timeout(),
            allowed_origins: config.allowed_origins().to_vec(),
        },
    };

    let app = build_router_with_rate_limiter(state, config.token_rate_limit());

    let listener = tokio::net::TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("binding {}", config.listen_addr()))?;
    let address: SocketAddr = listener.local_addr()?;
    tracing::info!("listening on {address}");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tx.send(true).ok();
    gc.await?;
    Ok(())
}

async fn init_storage(config: &AppConfig) -> Result<Storage> {
    match config.storage_backend() {
        StorageBackend::Postgres => {
            let pool = database::init_pool(config.database_url())
                .await
                .context("connecting to postgres")?;
            database::run_migrations(&pool).await?;
            Ok(Storage {
                clients: Arc::new(PostgresClientRegistry::new(pool.clone())),
                tokens: Arc::new(PostgresTokenStore::new(pool.clone())),
                users: Arc::new(PostgresUserDirectory::new(pool)),
            })
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; codes and tokens are lost on restart");
            Ok(Storage {
                clients: Arc::new(InMemoryClientRegistry::new()),
                tokens: Arc::new(InMemoryTokenStore::new()),
                users: Arc::new(InMemoryUserDirectory::with_users([UserIdentity::new(
                    "test@example.com",
                    "Test User",
                )?])),
            })
        }
    }
}

fn init_sessions(config: &AppConfig) -> Result<Arc<dyn SessionRepository>> {
    Ok(match config.session_backend() {
        SessionBackend::Memory => Arc::new(InMemorySessionRepository::new()),
        SessionBackend::Redis(url) => Arc::new(RedisSessionRepository::from_url(url)?),
    })
}

/// Registers the configured client. A previous registration with the same id is kept.
async fn register_seed_client(clients: &dyn ClientRegistry, seed: &SeedClient) -> Result<()> {
    let client = Client::new(seed.id.clone(), seed.secret.clone(), seed.domain.clone())?;
    match clients.register(client.clone()).await {
        Ok(()) => {
            tracing::info!(client_id = %seed.id, domain = %seed.domain, "seed client registered");
        }
        Err(DomainError::Conflict(_)) => {
            let existing = clients.find_by_id(&seed.id).await?;
            if existing.as_ref() != Some(&client) {
                tracing::warn!(
                    client_id = %seed.id,
                    "seed client differs from the stored registration; keeping the stored one"
                );
            }
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .ok()
        .unwrap_or_else(|| "info,tower_http=info,sqlx=warn".to_string());

    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_filter))
        .with(tracing_subscriber::fmt::layer());

    if subscriber.try_init().is_err() {
        tracing::warn!("tracing subscriber already initialised");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
