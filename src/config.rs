use std::time::Duration;

use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    futures::TryFutureExt,
    Build, Rocket,
};
use serde::Deserialize;

use crate::identity::{IdentityProvider, IntrospectionIdentityProvider, JwtIdentityProvider};
use crate::model::mongodb::{ensure_election_id_counter_exists, ensure_indexes_exist, Coll};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    /// Base URL of the identity provider's introspection API. When unset,
    /// bearer tokens are validated locally against `jwt_secret`.
    identity_url: Option<String>,
    /// Timeout for identity-provider calls in seconds.
    identity_timeout: u64,
    // secrets
    jwt_secret: String,
}

impl Config {
    pub fn identity_url(&self) -> Option<&str> {
        self.identity_url.as_deref()
    }

    pub fn identity_timeout(&self) -> Duration {
        Duration::from_secs(self.identity_timeout)
    }

    /// Shared secret the identity provider signs JWTs with.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// A fairing that constructs the identity provider from the config and
/// places it into managed state. Must be attached after [`ConfigFairing`].
pub struct IdentityFairing;

#[rocket::async_trait]
impl Fairing for IdentityFairing {
    fn info(&self) -> Info {
        Info {
            name: "Identity Provider",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.state::<Config>() {
            Some(config) => config,
            None => {
                error!("Config was not available when building the identity provider");
                return Err(rocket);
            }
        };

        let provider: Box<dyn IdentityProvider> = match config.identity_url() {
            Some(url) => {
                let client = match reqwest::Client::builder()
                    .timeout(config.identity_timeout())
                    .build()
                {
                    Ok(client) => client,
                    Err(e) => {
                        error!("Failed to build identity provider client: {e}");
                        return Err(rocket);
                    }
                };
                info!("Using remote identity provider at {url}");
                Box::new(IntrospectionIdentityProvider::new(client, url.to_string()))
            }
            None => {
                info!("Using local JWT validation for identities");
                Box::new(JwtIdentityProvider::new(config.jwt_secret()))
            }
        };

        rocket = rocket.manage(provider);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    db_uri: String,
}

/// A fairing that loads the MongoDB config, connects to the database,
/// performs any setup necessary, and places both a `Client` and a
/// `Database` into managed state.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Loaded database config, connecting...");
        let client = match MongoClient::with_uri_str(config.db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(&get_database_name());

        // Ensure the required indexes and the election ID counter exist.
        let counters = Coll::from_db(&db);
        if let Err(e) = ensure_indexes_exist(&db)
            .and_then(|_| ensure_election_id_counter_exists(&counters))
            .await
        {
            error!("Failed to set up database: {e}");
            return Err(rocket);
        }
        info!("...database connection online!");

        rocket = rocket.manage(client).manage(db);
        Ok(rocket)
    }
}

/// Get the name of the database to use (production version).
#[cfg(not(test))]
fn get_database_name() -> String {
    "ballotbox".to_string()
}

/// Get the name of the database to use (test version).
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
fn get_database_name() -> String {
    let random: u32 = rand::random();
    let db = format!("test{random}");
    info!("Using database {db}");
    db
}
