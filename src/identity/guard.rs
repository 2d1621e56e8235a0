use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request, State,
};

use crate::error::Error;

use super::{claims::IdentityClaims, provider::IdentityProvider};

/// Extract the bearer credential from the `Authorization` header.
fn bearer_credential<'r>(req: &'r Request<'_>) -> Option<&'r str> {
    req.headers()
        .get_one("Authorization")?
        .strip_prefix("Bearer ")
}

/// Request guard for any authenticated caller.
///
/// Verification is fail-closed: a missing or invalid credential aborts the
/// request with 401 rather than forwarding.
pub struct Identity(pub IdentityClaims);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Identity {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as the identity provider is always managed.
        let provider = req
            .guard::<&State<Box<dyn IdentityProvider>>>()
            .await
            .unwrap();

        let credential = match bearer_credential(req) {
            Some(credential) => credential,
            None => {
                return Outcome::Failure((
                    Status::Unauthorized,
                    Error::unauthorized("Missing bearer credential"),
                ))
            }
        };

        match provider.verify(credential).await {
            Ok(claims) => Outcome::Success(Identity(claims)),
            Err(e) => Outcome::Failure((Status::Unauthorized, e.into())),
        }
    }
}

/// Request guard for administrators.
///
/// Forwards (rather than failing) when the caller is not an admin or sent
/// no credential, so admin routes can share a path with ranked non-admin
/// variants; a credential that is present but invalid still aborts.
pub struct AdminIdentity(pub IdentityClaims);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminIdentity {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let provider = req
            .guard::<&State<Box<dyn IdentityProvider>>>()
            .await
            .unwrap();

        let credential = match bearer_credential(req) {
            Some(credential) => credential,
            None => return Outcome::Forward(()),
        };

        match provider.verify(credential).await {
            Ok(claims) if claims.is_admin() => Outcome::Success(AdminIdentity(claims)),
            Ok(_) => Outcome::Forward(()),
            Err(e) => Outcome::Failure((Status::Unauthorized, e.into())),
        }
    }
}

/// Request provenance recorded in audit entries: the caller's network
/// address and self-reported client identifier.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub client_addr: Option<String>,
    pub client_id: Option<String>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Provenance {
    type Error = std::convert::Infallible;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(Provenance {
            client_addr: req.client_ip().map(|ip| ip.to_string()),
            client_id: req.headers().get_one("X-Client-Id").map(str::to_string),
        })
    }
}
