#[macro_use]
extern crate rocket;

pub mod auth;
pub mod db;
pub mod request_logger;
pub mod routes;

use crate::auth::{AuthConfig, AuthState, PgCredentialStore};
use crate::db::TicketDb;
use crate::request_logger::RequestLogger;
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::http::Method;
use rocket::{Build, Rocket, Route};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;
use rocket_okapi::{
    openapi_get_routes,
    rapidoc::{make_rapidoc, GeneralConfig, HideShowConfig, RapiDocConfig},
    settings::UrlObject,
    swagger_ui::{make_swagger_ui, SwaggerUIConfig},
};
use std::sync::{Arc, Once};
use std::time::Duration;

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

/// Every HTTP route; the `/api` ones require a bearer credential.
pub fn app_routes() -> Vec<Route> {
    openapi_get_routes![
        routes::health::ping,
        auth::routes::register,
        auth::routes::login,
        auth::routes::logout,
        auth::routes::me,
        auth::routes::sweep_revocations,
    ]
}

pub fn catchers() -> Vec<rocket::Catcher> {
    catchers![
        auth::routes::unauthorized,
        auth::routes::forbidden,
        auth::routes::default_catcher,
    ]
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    log::info!("Starting ticket API server");

    // Configure CORS
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![
                Method::Get,
                Method::Post,
                Method::Put,
                Method::Delete,
                Method::Patch,
            ]
            .into_iter()
            .map(From::from)
            .collect(),
        )
        .allow_credentials(true)
        .to_cors()
        .expect("Error creating CORS");

    rocket::build()
        .attach(RequestLogger)
        .attach(TicketDb::init())
        .attach(cors)
        // Run database migrations on startup
        .attach(AdHoc::try_on_ignite(
            "Run Migrations",
            |rocket| async move {
                match TicketDb::fetch(&rocket) {
                    Some(db) => {
                        let pool = (**db).clone();
                        match db::run_migrations(&pool).await {
                            Ok(_) => {
                                log::info!("database migrations successful");
                                Ok(rocket)
                            }
                            Err(e) => {
                                log::error!("database migrations failed: {}", e);
                                Err(rocket)
                            }
                        }
                    }
                    None => {
                        log::error!("database pool not available for migrations");
                        Err(rocket)
                    }
                }
            },
        ))
        // Build the auth services over the pool and seed the first admin
        .attach(AdHoc::try_on_ignite(
            "Authentication State",
            |rocket| async move {
                let config = match AuthConfig::from_env() {
                    Ok(config) => config,
                    Err(e) => {
                        log::error!("invalid auth configuration: {}", e);
                        return Err(rocket);
                    }
                };

                let Some(db) = TicketDb::fetch(&rocket) else {
                    log::error!("database pool not available for auth state");
                    return Err(rocket);
                };
                let store = Arc::new(PgCredentialStore::new((**db).clone()));

                let state = match AuthState::from_config(config, store) {
                    Ok(state) => state,
                    Err(e) => {
                        log::error!("failed to initialize auth services: {}", e);
                        return Err(rocket);
                    }
                };

                if let Err(e) = auth::service::seed_admin(&state).await {
                    log::error!("admin seeding failed: {}", e);
                    return Err(rocket);
                }

                Ok(rocket.manage(state))
            },
        ))
        // Periodic purge of expired revocation entries
        .attach(AdHoc::on_liftoff("Spawn Revocation Sweeper", |rocket| {
            Box::pin(async move {
                if let Some(state) = rocket.state::<AuthState>() {
                    let store = Arc::clone(&state.store);
                    let every = Duration::from_secs(state.config.revocation_sweep_interval_secs);
                    tokio::spawn(async move {
                        log::info!("starting revocation sweeper every {:?}", every);
                        auth::service::run_revocation_sweeper(store, every).await
                    });
                } else {
                    log::error!("failed to spawn revocation sweeper: auth state not found");
                }
            })
        }))
        .mount("/", app_routes())
        .register("/", catchers())
        .mount(
            "/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../../openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/docs/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("Ticket API", "../../openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use std::sync::Arc;

    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::{Build, Rocket, Route};

    use crate::auth::{AuthConfig, AuthState, CredentialStore, MemoryCredentialStore};

    pub use database::{TestDatabase, TestDatabaseError};

    pub const TEST_JWT_SECRET: &str = "test-signing-secret";

    /// Auth state over a fresh in-memory store; the store handle is returned for
    /// assertions against the ledger.
    pub fn memory_auth_state() -> (AuthState, MemoryCredentialStore) {
        let store = MemoryCredentialStore::new();
        let shared: Arc<dyn CredentialStore> = Arc::new(store.clone());
        let state = AuthState::from_config(AuthConfig::with_secret(TEST_JWT_SECRET), shared)
            .expect("auth state");
        (state, store)
    }

    pub mod database {
        use log::LevelFilter;
        use rocket_db_pools::sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use rocket_db_pools::sqlx::{self, ConnectOptions, PgPool};
        use testcontainers::{core::WaitFor, GenericImage, ImageExt};
        use testcontainers_modules::testcontainers::{
            core::error::TestcontainersError, runners::AsyncRunner, ContainerAsync,
        };
        use thiserror::Error;
        use tokio::runtime::Handle;
        use uuid::Uuid;

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("neither TEST_DATABASE_URL nor TICKET_TEST_CONTAINERS is set")]
            MissingUrl,
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// Throwaway database with the schema applied, dropped when the value goes away.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            admin_options: PgConnectOptions,
            database_name: String,
            container: Option<ContainerAsync<GenericImage>>,
        }

        impl TestDatabase {
            /// Uses `TEST_DATABASE_URL` when set, else a disposable container when
            /// `TICKET_TEST_CONTAINERS` is set; otherwise reports `MissingUrl`.
            pub async fn new_from_env() -> Result<Self, TestDatabaseError> {
                if let Ok(url) = std::env::var("TEST_DATABASE_URL") {
                    return Self::with_server(url, None).await;
                }
                if std::env::var("TICKET_TEST_CONTAINERS").is_ok() {
                    return Self::new_container().await;
                }
                Err(TestDatabaseError::MissingUrl)
            }

            async fn new_container() -> Result<Self, TestDatabaseError> {
                let container = GenericImage::new("postgres", "16-alpine")
                    .with_wait_for(WaitFor::message_on_stderr(
                        "database system is ready to accept connections",
                    ))
                    .with_env_var("POSTGRES_DB", "postgres")
                    .with_env_var("POSTGRES_USER", "postgres")
                    .with_env_var("POSTGRES_PASSWORD", "postgres")
                    .start()
                    .await?;

                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
                Self::with_server(url, Some(container)).await
            }

            async fn with_server(
                url: String,
                container: Option<ContainerAsync<GenericImage>>,
            ) -> Result<Self, TestDatabaseError> {
                let base_options: PgConnectOptions = url.parse()?;
                let base_options = base_options.log_statements(LevelFilter::Off);
                let admin_options = base_options.clone().database("postgres");

                let admin_pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect_with(admin_options.clone())
                    .await?;

                let database_name = format!("ticket_test_{}", Uuid::new_v4().simple());
                sqlx::query(&format!("CREATE DATABASE \"{}\"", database_name))
                    .execute(&admin_pool)
                    .await?;
                admin_pool.close().await;

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(base_options.database(&database_name))
                    .await?;

                crate::db::run_migrations(&pool).await?;

                Ok(Self {
                    pool: Some(pool),
                    admin_options,
                    database_name,
                    container,
                })
            }

            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            pub fn pool_clone(&self) -> PgPool {
                self.pool().clone()
            }

            /// Close pool connections and drop the ephemeral database.
            pub async fn close(mut self) -> Result<(), TestDatabaseError> {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }
                drop_database(self.admin_options.clone(), &self.database_name).await?;
                self.container.take();
                Ok(())
            }
        }

        async fn drop_database(
            admin_options: PgConnectOptions,
            database_name: &str,
        ) -> Result<(), sqlx::Error> {
            let admin_pool = PgPoolOptions::new()
                .max_connections(1)
                .connect_with(admin_options)
                .await?;
            sqlx::query(&format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", database_name))
                .execute(&admin_pool)
                .await?;
            Ok(())
        }

        impl Drop for TestDatabase {
            fn drop(&mut self) {
                if let Some(pool) = self.pool.take() {
                    let admin_options = self.admin_options.clone();
                    let db_name = self.database_name.clone();
                    if let Ok(handle) = Handle::try_current() {
                        handle.spawn(async move {
                            pool.close().await;
                            let _ = drop_database(admin_options, &db_name).await;
                        });
                    }
                }
                self.container.take();
            }
        }
    }

    /// Builder for constructing Rocket instances tailored for integration tests.
    pub struct TestRocketBuilder {
        figment: Figment,
        mounts: Vec<(String, Vec<Route>)>,
        auth_state: Option<AuthState>,
    }

    impl Default for TestRocketBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestRocketBuilder {
        /// Start a builder with sensible defaults: random port, logging disabled.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                mounts: Vec::new(),
                auth_state: None,
            }
        }

        /// Mount every route the server exposes.
        pub fn mount_app_routes(mut self) -> Self {
            self.mounts.push(("/".to_string(), crate::app_routes()));
            self
        }

        pub fn manage_auth_state(mut self, state: AuthState) -> Self {
            self.auth_state = Some(state);
            self
        }

        /// Finish building the Rocket instance.
        pub fn build(self) -> Rocket<Build> {
            let mut rocket = rocket::custom(self.figment);

            for (base, routes) in self.mounts {
                rocket = rocket.mount(base, routes);
            }

            rocket = rocket.register("/", crate::catchers());

            if let Some(state) = self.auth_state {
                rocket = rocket.manage(state);
            }

            rocket
        }

        /// Convenience helper to produce an asynchronous local client.
        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }
}
