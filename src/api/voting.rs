use chrono::Utc;
use mongodb::{bson::doc, Client, Database};
use rocket::{serde::json::Json, Route, State};

use crate::{
    ballot::{ledger::VoteLedger, store::MongoBallotStore},
    error::{Error, Result},
    identity::{Identity, IdentityProvider, Provenance},
    model::{
        api::vote::{CastRequest, CastResponse},
        common::ElectionId,
        db::{candidate::Candidate, election::Election, voter::Voter},
        mongodb::{u32_id_filter, Coll},
    },
};

pub fn routes() -> Vec<Route> {
    routes![cast_vote]
}

/// Cast a ballot in an election.
///
/// The handler only resolves the referenced records; every rule lives in
/// the ledger, which runs its precondition checks and then applies the
/// cast as one atomic unit.
#[post("/elections/<election_id>/votes", data = "<request>", format = "json")]
#[allow(clippy::too_many_arguments)]
async fn cast_vote(
    identity: Identity,
    provenance: Provenance,
    election_id: ElectionId,
    request: Json<CastRequest>,
    voters: Coll<Voter>,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    db_client: &State<Client>,
    db: &State<Database>,
    provider: &State<Box<dyn IdentityProvider>>,
) -> Result<Json<CastResponse>> {
    let voter = voters
        .find_one(doc! { "subject": &identity.0.subject }, None)
        .await?
        .ok_or_else(|| Error::not_found("Registered voter"))?;
    let election = elections
        .find_one(u32_id_filter(election_id), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election with ID '{election_id}'")))?;
    let candidate = candidates
        .find_one(request.candidate_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate with ID '{}'", request.candidate_id)))?;

    let store = MongoBallotStore::new(db_client.inner().clone(), db.inner().clone());
    let ledger = VoteLedger::new(store, provider.inner().as_ref());
    let receipt = ledger
        .cast(
            &identity.0,
            &provenance,
            &voter,
            &election,
            &candidate,
            Utc::now(),
        )
        .await?;

    Ok(Json(CastResponse {
        cast_at: receipt.cast_at,
    }))
}
