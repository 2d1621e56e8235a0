use mongodb::bson::doc;
use rocket::{serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    identity::Identity,
    model::{
        api::voter::{HistoryEntryDescription, RegistrationRequest, VoterDescription},
        db::{
            history::HistoryEntry,
            voter::{NewVoter, Voter, VoterCore},
        },
        mongodb::{Coll, Id, PlannedQuery},
    },
};

pub fn routes() -> Vec<Route> {
    routes![register, get_own_voter, get_own_history]
}

/// Register the calling identity as a voter. Voters start unverified and
/// ineligible; registration is idempotent per subject.
#[post("/voters", data = "<registration>", format = "json")]
async fn register(
    identity: Identity,
    registration: Json<RegistrationRequest>,
    voters: Coll<Voter>,
    new_voters: Coll<NewVoter>,
) -> Result<Json<VoterDescription>> {
    let by_subject = doc! { "subject": &identity.0.subject };

    let voter = if let Some(voter) = voters.find_one(by_subject, None).await? {
        // Already registered.
        voter
    } else {
        let voter = VoterCore::new(
            identity.0.subject.clone(),
            identity.0.email.clone(),
            registration.0.into(),
        );
        let new_id: Id = new_voters
            .insert_one(&voter, None)
            .await?
            .inserted_id
            .as_object_id()
            .unwrap() // Safe because the ID comes directly from the database.
            .into();
        voters.find_one(new_id.as_doc(), None).await?.unwrap()
    };

    Ok(Json(voter.into()))
}

#[get("/voters/me")]
async fn get_own_voter(identity: Identity, voters: Coll<Voter>) -> Result<Json<VoterDescription>> {
    let voter = voters
        .find_one(doc! { "subject": &identity.0.subject }, None)
        .await?
        .ok_or_else(|| Error::not_found("Registered voter"))?;
    Ok(Json(voter.into()))
}

/// The caller's voting history, newest first.
#[get("/voters/me/history")]
async fn get_own_history(
    identity: Identity,
    voters: Coll<Voter>,
    history: Coll<HistoryEntry>,
) -> Result<Json<Vec<HistoryEntryDescription>>> {
    let voter = voters
        .find_one(doc! { "subject": &identity.0.subject }, None)
        .await?
        .ok_or_else(|| Error::not_found("Registered voter"))?;

    let voter_id = voter.id;
    let entries = PlannedQuery::new(
        "history by voter",
        doc! { "voter_id": *voter_id },
        doc! {},
        move |entry: &HistoryEntry| entry.voter_id == voter_id,
    )
    .sorted(doc! { "cast_at": -1 }, |a, b| b.cast_at.cmp(&a.cast_at))
    .run(&history)
    .await?;

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
