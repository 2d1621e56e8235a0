//! The identity-provider collaborator.
//!
//! Authentication is delegated to an external provider: given a bearer
//! credential it returns a stable subject identifier, an email, and an
//! optional role claim. Verification failures are fail-closed for
//! authorization; only the ledger's secondary role lookup is fail-open.

mod claims;
mod guard;
mod provider;

pub use claims::{IdentityClaims, Role};
pub use guard::{AdminIdentity, Identity, Provenance};
pub use provider::{
    IdentityError, IdentityProvider, IntrospectionIdentityProvider, JwtIdentityProvider,
};
