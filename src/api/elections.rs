use chrono::Utc;
use mongodb::{bson::doc, Client, Database};
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};

use crate::{
    ballot::{
        lifecycle,
        results::ResultsProjector,
        store::{BallotStore, MongoBallotStore},
    },
    error::{Error, Result},
    identity::AdminIdentity,
    model::{
        api::{
            candidate::CandidateDescription,
            election::{ElectionDescription, ElectionSummary},
            results::ElectionResults,
        },
        common::{ElectionId, ElectionStatus},
        db::election::Election,
        mongodb::{u32_id_filter, Coll},
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        elections_admin,
        elections_non_admin,
        election,
        election_candidates,
        election_results,
    ]
}

/// A filter for the elections a non-admin may see.
fn non_admin_filter() -> mongodb::bson::Document {
    doc! {
        "$or": [{"status": ElectionStatus::Active}, {"status": ElectionStatus::Completed}],
    }
}

#[get("/elections", rank = 1)]
async fn elections_admin(
    _token: AdminIdentity,
    elections: Coll<Election>,
) -> Result<Json<Vec<ElectionSummary>>> {
    // Admins also see scheduled and cancelled elections.
    let elections: Vec<Election> = elections.find(None, None).await?.try_collect().await?;
    Ok(Json(elections.into_iter().map(Into::into).collect()))
}

#[get("/elections", rank = 2)]
async fn elections_non_admin(elections: Coll<Election>) -> Result<Json<Vec<ElectionSummary>>> {
    let elections: Vec<Election> = elections
        .find(non_admin_filter(), None)
        .await?
        .try_collect()
        .await?;
    Ok(Json(elections.into_iter().map(Into::into).collect()))
}

#[get("/elections/<election_id>")]
async fn election(
    admin: Option<AdminIdentity>,
    election_id: ElectionId,
    elections: Coll<Election>,
) -> Result<Json<ElectionDescription>> {
    let election = visible_election(&elections, election_id, admin.is_some()).await?;
    Ok(Json(election.into()))
}

#[get("/elections/<election_id>/candidates")]
async fn election_candidates(
    admin: Option<AdminIdentity>,
    election_id: ElectionId,
    elections: Coll<Election>,
    db_client: &State<Client>,
    db: &State<Database>,
) -> Result<Json<Vec<CandidateDescription>>> {
    visible_election(&elections, election_id, admin.is_some()).await?;

    let store = MongoBallotStore::new(db_client.inner().clone(), db.inner().clone());
    let candidates = store.candidates_of(election_id).await?;
    Ok(Json(candidates.into_iter().map(Into::into).collect()))
}

/// Results are gated by the lifecycle: the election must have closed, and
/// non-admins additionally need the approval flag. The projector itself
/// does no gating.
#[get("/elections/<election_id>/results")]
async fn election_results(
    admin: Option<AdminIdentity>,
    election_id: ElectionId,
    elections: Coll<Election>,
    db_client: &State<Client>,
    db: &State<Database>,
) -> Result<Json<ElectionResults>> {
    let election = elections
        .find_one(u32_id_filter(election_id), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election with ID '{election_id}'")))?;

    lifecycle::validate_for_results(&election, Utc::now(), admin.is_some())?;

    let projector = ResultsProjector::new(MongoBallotStore::new(
        db_client.inner().clone(),
        db.inner().clone(),
    ));
    let results = projector.project(election_id).await?;
    Ok(Json(results))
}

/// Fetch an election, hiding scheduled and cancelled ones from non-admins.
async fn visible_election(
    elections: &Coll<Election>,
    election_id: ElectionId,
    is_admin: bool,
) -> Result<Election> {
    let filter = if is_admin {
        u32_id_filter(election_id)
    } else {
        let mut filter = non_admin_filter();
        filter.insert("_id", election_id);
        filter
    };
    elections
        .find_one(filter, None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election with ID '{election_id}'")))
}
