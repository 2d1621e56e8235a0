use rocket::{http::Status, response::Responder};
use thiserror::Error;

use crate::ballot::{
    ledger::{CastError, CastRefusal},
    lifecycle::ResultsBlocked,
    store::StoreError,
};
use crate::identity::IdentityError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every error a handler can return.
///
/// Precondition failures carry an explicit status and a stable, named
/// reason; store and upstream failures map to retryable server errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] mongodb::error::Error),
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::Status(Status::BadRequest, msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Status(Status::Unauthorized, msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Status(Status::Forbidden, msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::Status(Status::NotFound, format!("{} not found", msg.into()))
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Status(Status::Conflict, msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Status(Status::ServiceUnavailable, msg.into())
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = match &self {
            Self::Status(status, _) => *status,
            // Store and identity-provider outages are retryable.
            Self::Db(_) | Self::Http(_) => Status::ServiceUnavailable,
            Self::Jwt(_) => Status::Unauthorized,
        };
        match status.class() {
            rocket::http::StatusClass::ServerError => error!("{status}: {self}"),
            _ => info!("{status}: {self}"),
        }
        Err(status)
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Db(e) => Self::Db(e),
            StoreError::Conflict(msg) => Self::unavailable(msg),
        }
    }
}

impl From<CastError> for Error {
    fn from(err: CastError) -> Self {
        match err {
            CastError::Refused(refusal) => {
                let reason = refusal.to_string();
                match refusal {
                    // The casting window and duplicate casts are state
                    // conflicts with distinct, stable reasons.
                    CastRefusal::Window(_) | CastRefusal::AlreadyVoted => Self::conflict(reason),
                    CastRefusal::NotVerified
                    | CastRefusal::Ineligible
                    | CastRefusal::AdminBarred => Self::forbidden(reason),
                    CastRefusal::WrongElection => Self::Status(Status::NotFound, reason),
                }
            }
            CastError::Store(e) => e.into(),
        }
    }
}

impl From<ResultsBlocked> for Error {
    fn from(err: ResultsBlocked) -> Self {
        match err {
            ResultsBlocked::NotClosed => Self::conflict(err.to_string()),
            ResultsBlocked::PendingApproval => Self::forbidden(err.to_string()),
        }
    }
}

impl From<IdentityError> for Error {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredential(_) => Self::unauthorized(err.to_string()),
            IdentityError::Unavailable(_) => Self::unavailable(err.to_string()),
        }
    }
}
