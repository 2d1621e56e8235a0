#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

use rocket::{Build, Rocket};

pub mod api;
pub mod ballot;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod model;

/// Assemble the Rocket instance: configuration, identity provider,
/// database, request logging, and the route surface. Fairing order
/// matters; the identity and database fairings read the managed config.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(config::ConfigFairing)
        .attach(config::IdentityFairing)
        .attach(config::DatabaseFairing)
        .attach(logging::LoggerFairing)
        .mount("/", api::routes())
}
