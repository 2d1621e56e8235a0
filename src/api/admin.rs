use chrono::Utc;
use mongodb::{bson::doc, Client};
use rocket::{serde::json::Json, Route, State};

use crate::{
    ballot::store::is_duplicate_key,
    error::{Error, Result},
    identity::AdminIdentity,
    model::{
        api::{
            candidate::{CandidateDescription, CandidateSpec},
            election::{ApprovalRequest, ElectionDescription, ElectionSpec, StatusChange},
            voter::{VerificationUpdate, VoterDescription},
        },
        common::{ElectionId, ElectionStatus},
        db::{
            audit::{AuditAction, NewAuditEntry},
            candidate::{Candidate, NewCandidate},
            election::Election,
            voter::Voter,
        },
        mongodb::{u32_id_filter, Coll, Counter, Id, ELECTION_ID_COUNTER_ID},
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        create_election,
        modify_election,
        set_election_status,
        add_candidate,
        approve_results,
        verify_voter,
    ]
}

#[post("/elections", data = "<spec>", format = "json")]
async fn create_election(
    token: AdminIdentity,
    spec: Json<ElectionSpec>,
    elections: Coll<Election>,
    counters: Coll<Counter>,
    audit: Coll<NewAuditEntry>,
    db_client: &State<Client>,
) -> Result<Json<ElectionDescription>> {
    spec.validate().map_err(Error::bad_request)?;

    let id = Counter::next(&counters, ELECTION_ID_COUNTER_ID).await?;
    let election = spec.0.into_election(id);

    // Insert the election and its audit entry together.
    {
        let mut session = db_client.start_session(None).await?;
        session.start_transaction(None).await?;

        elections
            .insert_one_with_session(&election, None, &mut session)
            .await?;
        let entry = NewAuditEntry::admin_action(
            AuditAction::ElectionCreated,
            token.0.subject.clone(),
            Some(id),
            None,
            format!("created election '{}'", election.title),
        );
        audit
            .insert_one_with_session(&entry, None, &mut session)
            .await?;

        session.commit_transaction().await?;
    }

    Ok(Json(election.into()))
}

/// Replace an election's definition. Only allowed while it is still
/// scheduled; once active, the definition is frozen.
#[put("/elections/<election_id>", data = "<spec>", format = "json")]
async fn modify_election(
    token: AdminIdentity,
    election_id: ElectionId,
    spec: Json<ElectionSpec>,
    elections: Coll<Election>,
    audit: Coll<NewAuditEntry>,
) -> Result<Json<ElectionDescription>> {
    spec.validate().map_err(Error::bad_request)?;

    let election = elections
        .find_one(u32_id_filter(election_id), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election with ID '{election_id}'")))?;
    if election.status != ElectionStatus::Scheduled {
        return Err(Error::conflict(format!(
            "Cannot modify election {election_id} after it has left the scheduled state"
        )));
    }

    let replacement = spec.0.into_election(election_id);
    let result = elections
        .replace_one(u32_id_filter(election_id), &replacement, None)
        .await?;
    assert_eq!(result.modified_count, 1);

    audit
        .insert_one(
            NewAuditEntry::admin_action(
                AuditAction::ElectionModified,
                token.0.subject.clone(),
                Some(election_id),
                None,
                format!("replaced definition of election '{}'", replacement.title),
            ),
            None,
        )
        .await?;

    Ok(Json(replacement.into()))
}

/// Drive the admin-only status machine: scheduled to active to completed,
/// with cancellation from either non-terminal state.
#[post("/elections/<election_id>/status", data = "<change>", format = "json")]
async fn set_election_status(
    token: AdminIdentity,
    election_id: ElectionId,
    change: Json<StatusChange>,
    elections: Coll<Election>,
    audit: Coll<NewAuditEntry>,
) -> Result<()> {
    let election = elections
        .find_one(u32_id_filter(election_id), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election with ID '{election_id}'")))?;

    let from = election.status;
    let to = change.status;
    if !from.may_become(to) {
        return Err(Error::conflict(format!(
            "Election {election_id} cannot move from {from:?} to {to:?}"
        )));
    }

    // Filter on the old status so concurrent transitions cannot both win.
    let filter = doc! { "_id": election_id, "status": from };
    let update = doc! { "$set": { "status": to } };
    let result = elections.update_one(filter, update, None).await?;
    if result.modified_count != 1 {
        return Err(Error::conflict(format!(
            "Election {election_id} changed concurrently; try again"
        )));
    }

    audit
        .insert_one(
            NewAuditEntry::admin_action(
                AuditAction::ElectionStatusChanged,
                token.0.subject.clone(),
                Some(election_id),
                None,
                format!("{from:?} -> {to:?}"),
            ),
            None,
        )
        .await?;

    Ok(())
}

/// Add a candidate to a still-scheduled election.
#[post("/elections/<election_id>/candidates", data = "<spec>", format = "json")]
async fn add_candidate(
    _token: AdminIdentity,
    election_id: ElectionId,
    spec: Json<CandidateSpec>,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    new_candidates: Coll<NewCandidate>,
) -> Result<Json<CandidateDescription>> {
    spec.validate().map_err(Error::bad_request)?;

    let election = elections
        .find_one(u32_id_filter(election_id), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election with ID '{election_id}'")))?;
    if election.status != ElectionStatus::Scheduled {
        return Err(Error::conflict(format!(
            "Cannot add candidates to election {election_id} after it has left the scheduled state"
        )));
    }

    let candidate = spec.0.into_candidate(election_id);
    let new_id: Id = match new_candidates.insert_one(&candidate, None).await {
        Ok(inserted) => inserted
            .inserted_id
            .as_object_id()
            .unwrap() // Safe because the ID comes directly from the database.
            .into(),
        Err(e) if is_duplicate_key(&e) => {
            return Err(Error::conflict(format!(
                "Position {} is already taken in election {election_id}",
                candidate.position
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let candidate = candidates.find_one(new_id.as_doc(), None).await?.unwrap();
    Ok(Json(candidate.into()))
}

/// Approve (or revoke approval of) an election's results for non-admin
/// visibility. Approval is only possible once the election has completed
/// or its window has passed.
#[post(
    "/elections/<election_id>/results/approval",
    data = "<request>",
    format = "json"
)]
async fn approve_results(
    token: AdminIdentity,
    election_id: ElectionId,
    request: Json<ApprovalRequest>,
    elections: Coll<Election>,
    audit: Coll<NewAuditEntry>,
) -> Result<()> {
    let election = elections
        .find_one(u32_id_filter(election_id), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election with ID '{election_id}'")))?;

    let now = Utc::now();
    let closed = election.status == ElectionStatus::Completed || election.end_time <= now;
    if request.approved && !closed {
        return Err(Error::conflict(format!(
            "Results of election {election_id} cannot be approved before it closes"
        )));
    }

    let update = doc! { "$set": { "results_approved": request.approved } };
    elections
        .update_one(u32_id_filter(election_id), update, None)
        .await?;

    audit
        .insert_one(
            NewAuditEntry::admin_action(
                AuditAction::ResultsApproved,
                token.0.subject.clone(),
                Some(election_id),
                None,
                format!("results_approved set to {}", request.approved),
            ),
            None,
        )
        .await?;

    Ok(())
}

/// The administrative verification action: the only mutation of a voter's
/// flags.
#[post("/voters/<voter_id>/verification", data = "<update>", format = "json")]
async fn verify_voter(
    token: AdminIdentity,
    voter_id: Id,
    update: Json<VerificationUpdate>,
    voters: Coll<Voter>,
    audit: Coll<NewAuditEntry>,
) -> Result<Json<VoterDescription>> {
    let update_doc = doc! {
        "$set": {
            "is_verified": update.verified,
            "is_eligible": update.eligible,
        }
    };
    let result = voters
        .update_one(voter_id.as_doc(), update_doc, None)
        .await?;
    if result.matched_count != 1 {
        return Err(Error::not_found(format!("Voter with ID '{voter_id}'")));
    }

    audit
        .insert_one(
            NewAuditEntry::admin_action(
                AuditAction::VoterVerified,
                token.0.subject.clone(),
                None,
                Some(voter_id.to_string()),
                format!(
                    "verified set to {}, eligible set to {}",
                    update.verified, update.eligible
                ),
            ),
            None,
        )
        .await?;

    let voter = voters.find_one(voter_id.as_doc(), None).await?.unwrap();
    Ok(Json(voter.into()))
}
