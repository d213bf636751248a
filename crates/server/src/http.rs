// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State as AxumState},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tally::{Format, ImportOutcome};
use tally_api::{
    ApiError, ArchiveSummary, ImportOptions, ImportSource, evaluate_election_source,
    evaluate_party_source, evaluate_vote_source, export_archive, parse_ballot_type, parse_format,
    store_election_outcome, store_party_outcome, store_vote_outcome,
};
use tally_domain::{
    BallotType, ElectionResults, EntityRegistry, EntityResult, PanachageResult, PartyResult,
};
use tally_persistence::{ElectionData, Persistence, VoteData};
use tokio::sync::Mutex;
use tracing::{error, info};

const DEFAULT_MIME: &str = "application/octet-stream";
const DEFAULT_FILENAME: &str = "upload";

/// Application state shared across handlers.
///
/// Parsing runs outside the persistence lock; only lookups and the final
/// write hold it.
#[derive(Clone)]
pub struct AppState {
    pub persistence: Arc<Mutex<Persistence>>,
    pub registry: Arc<EntityRegistry>,
    /// Directory receiving `archive/` and `archive.zip`.
    pub archive_root: PathBuf,
}

/// Query parameters of a vote upload.
#[derive(Debug, Deserialize)]
struct VoteUploadQuery {
    format: String,
    ballot_type: Option<String>,
    number: Option<u32>,
    filename: Option<String>,
}

/// Query parameters of a party or candidate upload.
#[derive(Debug, Deserialize)]
struct FileUploadQuery {
    filename: Option<String>,
}

#[derive(Debug, Serialize)]
struct VoteResultsResponse {
    vote: VoteData,
    results: BTreeMap<BallotType, Vec<EntityResult>>,
}

#[derive(Debug, Serialize)]
struct PartyResultsResponse {
    election: ElectionData,
    parties: Vec<PartyResult>,
    panachage: Vec<PanachageResult>,
}

#[derive(Debug, Serialize)]
struct ElectionResultsResponse {
    election: ElectionData,
    results: ElectionResults,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    error: bool,
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match err {
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Io { .. } | ApiError::Storage { .. } => {
                error!(error = %err, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

fn vote_not_found(vote_id: i64) -> HttpError {
    ApiError::ResourceNotFound {
        resource_type: String::from("Vote"),
        message: format!("Vote {vote_id} does not exist"),
    }
    .into()
}

fn election_not_found(election_id: i64) -> HttpError {
    ApiError::ResourceNotFound {
        resource_type: String::from("Election"),
        message: format!("Election {election_id} does not exist"),
    }
    .into()
}

fn upload_source(filename: Option<String>, headers: &HeaderMap, body: Bytes) -> ImportSource {
    let mime: &str = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_MIME);
    ImportSource::new(
        filename.as_deref().unwrap_or(DEFAULT_FILENAME),
        mime,
        body.to_vec(),
    )
}

/// Rejected imports are answered with 422 and the full error list.
fn outcome_response(outcome: ImportOutcome) -> (StatusCode, Json<ImportOutcome>) {
    let status: StatusCode = if outcome.is_accepted() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (status, Json(outcome))
}

/// Handler for POST `/votes/{vote_id}/upload`.
async fn handle_vote_upload(
    AxumState(app_state): AxumState<AppState>,
    Path(vote_id): Path<i64>,
    Query(query): Query<VoteUploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<ImportOutcome>), HttpError> {
    let format: Format = parse_format(&query.format)?;
    let options: ImportOptions = ImportOptions {
        ballot_type: match &query.ballot_type {
            Some(name) => parse_ballot_type(name)?,
            None => BallotType::Proposal,
        },
        vote_number: query.number.unwrap_or(0),
    };
    let source: ImportSource = upload_source(query.filename, &headers, body);
    info!(
        vote_id,
        format = %format,
        ballot_type = %options.ballot_type,
        filename = %source.filename,
        bytes = source.bytes.len(),
        "Handling vote upload"
    );

    let vote: VoteData = {
        let mut persistence = app_state.persistence.lock().await;
        persistence
            .get_vote(vote_id)
            .map_err(ApiError::from)?
            .ok_or_else(|| vote_not_found(vote_id))?
    };

    let outcome: ImportOutcome =
        evaluate_vote_source(&vote, &app_state.registry, format, &source, &options)?;

    let mut persistence = app_state.persistence.lock().await;
    store_vote_outcome(&mut persistence, vote_id, &outcome)?;
    drop(persistence);

    Ok(outcome_response(outcome))
}

/// Handler for POST `/elections/{election_id}/parties`.
async fn handle_party_upload(
    AxumState(app_state): AxumState<AppState>,
    Path(election_id): Path<i64>,
    Query(query): Query<FileUploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<ImportOutcome>), HttpError> {
    let source: ImportSource = upload_source(query.filename, &headers, body);
    info!(
        election_id,
        filename = %source.filename,
        bytes = source.bytes.len(),
        "Handling party upload"
    );

    let election: ElectionData = {
        let mut persistence = app_state.persistence.lock().await;
        persistence
            .get_election(election_id)
            .map_err(ApiError::from)?
            .ok_or_else(|| election_not_found(election_id))?
    };

    let outcome: ImportOutcome = evaluate_party_source(&election, &source);

    let mut persistence = app_state.persistence.lock().await;
    store_party_outcome(&mut persistence, election_id, &outcome)?;
    drop(persistence);

    Ok(outcome_response(outcome))
}

/// Handler for POST `/elections/{election_id}/upload`.
async fn handle_election_upload(
    AxumState(app_state): AxumState<AppState>,
    Path(election_id): Path<i64>,
    Query(query): Query<FileUploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<ImportOutcome>), HttpError> {
    let source: ImportSource = upload_source(query.filename, &headers, body);
    info!(
        election_id,
        filename = %source.filename,
        bytes = source.bytes.len(),
        "Handling election upload"
    );

    let election: ElectionData = {
        let mut persistence = app_state.persistence.lock().await;
        persistence
            .get_election(election_id)
            .map_err(ApiError::from)?
            .ok_or_else(|| election_not_found(election_id))?
    };

    let outcome: ImportOutcome =
        evaluate_election_source(&election, &app_state.registry, &source);

    let mut persistence = app_state.persistence.lock().await;
    store_election_outcome(&mut persistence, election_id, &outcome)?;
    drop(persistence);

    Ok(outcome_response(outcome))
}

/// Handler for GET `/votes/{vote_id}/results`.
async fn handle_vote_results(
    AxumState(app_state): AxumState<AppState>,
    Path(vote_id): Path<i64>,
) -> Result<Json<VoteResultsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let vote: VoteData = persistence
        .get_vote(vote_id)
        .map_err(ApiError::from)?
        .ok_or_else(|| vote_not_found(vote_id))?;
    let results: BTreeMap<BallotType, Vec<EntityResult>> = persistence
        .load_ballot_results(vote_id)
        .map_err(ApiError::from)?;
    drop(persistence);

    Ok(Json(VoteResultsResponse { vote, results }))
}

/// Handler for GET `/elections/{election_id}/parties`.
async fn handle_party_results(
    AxumState(app_state): AxumState<AppState>,
    Path(election_id): Path<i64>,
) -> Result<Json<PartyResultsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let election: ElectionData = persistence
        .get_election(election_id)
        .map_err(ApiError::from)?
        .ok_or_else(|| election_not_found(election_id))?;
    let parties: Vec<PartyResult> = persistence
        .load_party_results(election_id)
        .map_err(ApiError::from)?;
    let panachage: Vec<PanachageResult> = persistence
        .load_panachage_results(election_id)
        .map_err(ApiError::from)?;
    drop(persistence);

    Ok(Json(PartyResultsResponse {
        election,
        parties,
        panachage,
    }))
}

/// Handler for GET `/elections/{election_id}/results`.
async fn handle_election_results(
    AxumState(app_state): AxumState<AppState>,
    Path(election_id): Path<i64>,
) -> Result<Json<ElectionResultsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let election: ElectionData = persistence
        .get_election(election_id)
        .map_err(ApiError::from)?
        .ok_or_else(|| election_not_found(election_id))?;
    let results: ElectionResults = persistence
        .load_election_results(election_id)
        .map_err(ApiError::from)?;
    drop(persistence);

    Ok(Json(ElectionResultsResponse { election, results }))
}

/// Handler for POST `/archive`.
async fn handle_archive(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<ArchiveSummary>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let summary: ArchiveSummary = export_archive(&mut persistence, &app_state.archive_root)?;
    drop(persistence);

    info!(
        files = summary.files.len(),
        zip = %summary.zip_path.display(),
        "Archive exported"
    );
    Ok(Json(summary))
}

/// Builds the application router with all endpoints.
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/votes/{vote_id}/upload", post(handle_vote_upload))
        .route("/votes/{vote_id}/results", get(handle_vote_results))
        .route("/elections/{election_id}/parties", post(handle_party_upload))
        .route("/elections/{election_id}/parties", get(handle_party_results))
        .route("/elections/{election_id}/upload", post(handle_election_upload))
        .route("/elections/{election_id}/results", get(handle_election_results))
        .route("/archive", post(handle_archive))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;
    use axum::{body::Body, http::Request};
    use std::sync::atomic::{AtomicU64, Ordering};
    use tally_domain::Domain;
    use tally_persistence::{NewElection, NewVote};
    use tower::ServiceExt;

    static DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

    const REGISTRY_JSON: &str = r#"{
        "principal": {"canton": "zg"},
        "entities": {
            "2017": {
                "1701": {"name": "Baar", "district": "Zug"},
                "1702": {"name": "Cham", "district": "Ennetsee"},
                "1711": {"name": "Zug", "district": "Zug"}
            }
        }
    }"#;

    const DEFAULT_CSV: &str = "ID,Ja Stimmen,Nein Stimmen,Stimmberechtigte,Leere Stimmzettel,Ungültige Stimmzettel\n1711,3821,7405,16516,80,1\n";

    const PARTY_CSV: &str = "year,total_votes,id,name,color,mandates,votes,voters_count,voters_count_percentage,panachage_votes_from_1,panachage_votes_from_2\n2022,1000,1,AL,#aa0000,1,600,6.5,60.1,,12\n2022,1000,2,CVP,#00aa00,0,400,4.5,39.9,8,\n";

    const ELECTION_CSV: &str = "election_status,entity_id,entity_counted,entity_eligible_voters,entity_received_ballots,entity_blank_ballots,entity_invalid_ballots,entity_blank_votes,entity_invalid_votes,candidate_family_name,candidate_first_name,candidate_id,candidate_elected,candidate_votes,list_name,list_id,list_number_of_mandates,list_votes\ninterim,1711,true,16516,9000,50,10,20,5,Muster,Anna,101,false,4200,FDP,01,2,7000\ninterim,1711,true,16516,9000,50,10,20,5,Beispiel,Beat,201,false,3100,SP,02,1,5100\n";

    /// Helper to create test app state with in-memory persistence.
    fn create_test_app_state() -> AppState {
        let id: u64 = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
        let archive_root: PathBuf = std::env::temp_dir().join(format!(
            "tally-server-{}-{id}",
            std::process::id()
        ));
        let persistence: Persistence =
            Persistence::new_in_memory().expect("Failed to create in-memory persistence");
        AppState {
            persistence: Arc::new(Mutex::new(persistence)),
            registry: Arc::new(EntityRegistry::from_json(REGISTRY_JSON).unwrap()),
            archive_root,
        }
    }

    async fn add_vote(app_state: &AppState) -> i64 {
        app_state
            .persistence
            .lock()
            .await
            .add_vote(&NewVote::new("Steuergesetz", 2017, Domain::Federation))
            .unwrap()
    }

    async fn add_election(app_state: &AppState) -> i64 {
        app_state
            .persistence
            .lock()
            .await
            .add_election(&NewElection::new("Kantonsratswahl", 2022))
            .unwrap()
    }

    async fn add_proporz_election(app_state: &AppState) -> i64 {
        app_state
            .persistence
            .lock()
            .await
            .add_election(&NewElection::new("Regierungsratswahl", 2017))
            .unwrap()
    }

    async fn send(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "text/csv")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status: StatusCode = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body_bytes).unwrap())
    }

    #[tokio::test]
    async fn test_vote_upload_is_accepted_and_readable() {
        let app_state: AppState = create_test_app_state();
        let vote_id: i64 = add_vote(&app_state).await;
        let app: Router = build_router(app_state.clone());

        let (status, body) = send(
            app.clone(),
            "POST",
            &format!("/votes/{vote_id}/upload?format=default&filename=zug.csv"),
            DEFAULT_CSV,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "accepted");

        let (status, body) = send(app, "GET", &format!("/votes/{vote_id}/results"), "").await;
        assert_eq!(status, StatusCode::OK);
        let proposal = body["results"]["proposal"].as_array().unwrap();
        assert_eq!(proposal.len(), 3);
        assert_eq!(proposal[2]["entity_id"], 1711);
        assert_eq!(proposal[2]["yeas"], 3821);
        assert_eq!(proposal[0]["counted"], false);
        assert!(body["vote"]["last_result_change"].is_string());
    }

    #[tokio::test]
    async fn test_rejected_upload_lists_errors_and_writes_nothing() {
        let app_state: AppState = create_test_app_state();
        let vote_id: i64 = add_vote(&app_state).await;
        let app: Router = build_router(app_state.clone());

        let (status, body) = send(
            app,
            "POST",
            &format!("/votes/{vote_id}/upload?format=default&filename=bad.csv"),
            "ID,Ja Stimmen\n9999,1\n",
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["outcome"], "rejected");
        assert!(!body["data"].as_array().unwrap().is_empty());
        assert_eq!(
            app_state
                .persistence
                .lock()
                .await
                .count_ballot_results(vote_id)
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_upload_with_unknown_format_is_bad_request() {
        let app_state: AppState = create_test_app_state();
        let vote_id: i64 = add_vote(&app_state).await;
        let app: Router = build_router(app_state);

        let (status, body) = send(
            app,
            "POST",
            &format!("/votes/{vote_id}/upload?format=sesam"),
            DEFAULT_CSV,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], true);
    }

    #[tokio::test]
    async fn test_upload_to_unowned_ballot_is_bad_request() {
        let app_state: AppState = create_test_app_state();
        let vote_id: i64 = add_vote(&app_state).await;
        let app: Router = build_router(app_state);

        let (status, _) = send(
            app,
            "POST",
            &format!("/votes/{vote_id}/upload?format=default&ballot_type=tie-breaker"),
            DEFAULT_CSV,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_vote_is_not_found() {
        let app: Router = build_router(create_test_app_state());

        let (status, _) = send(app.clone(), "GET", "/votes/42/results", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(app, "POST", "/votes/42/upload?format=default", DEFAULT_CSV).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_party_upload_and_results() {
        let app_state: AppState = create_test_app_state();
        let election_id: i64 = add_election(&app_state).await;
        let app: Router = build_router(app_state);

        let (status, body) = send(
            app.clone(),
            "POST",
            &format!("/elections/{election_id}/parties"),
            PARTY_CSV,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "accepted");

        let (status, body) = send(app, "GET", &format!("/elections/{election_id}/parties"), "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["parties"].as_array().unwrap().len(), 2);
        assert_eq!(body["panachage"].as_array().unwrap().len(), 2);
        assert_eq!(body["election"]["year"], 2022);
    }

    #[tokio::test]
    async fn test_election_upload_and_results() {
        let app_state: AppState = create_test_app_state();
        let election_id: i64 = add_proporz_election(&app_state).await;
        let app: Router = build_router(app_state);

        let (status, body) = send(
            app.clone(),
            "POST",
            &format!("/elections/{election_id}/upload?filename=candidates.csv"),
            ELECTION_CSV,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "accepted");

        let (status, body) = send(app, "GET", &format!("/elections/{election_id}/results"), "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["election"]["status"], "interim");
        let entities = body["results"]["entity_results"].as_array().unwrap();
        assert_eq!(entities.len(), 3);
        assert_eq!(entities[2]["entity_id"], 1711);
        assert_eq!(entities[2]["received_ballots"], 9000);
        assert_eq!(entities[0]["counted"], false);
        assert_eq!(body["results"]["candidates"].as_array().unwrap().len(), 2);
        assert_eq!(body["results"]["lists"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_election_upload_is_unprocessable() {
        let app_state: AppState = create_test_app_state();
        let election_id: i64 = add_proporz_election(&app_state).await;
        let app: Router = build_router(app_state.clone());

        let duplicate: String = format!(
            "{}{}",
            ELECTION_CSV,
            ELECTION_CSV.lines().nth(1).unwrap()
        );
        let (status, body) = send(
            app.clone(),
            "POST",
            &format!("/elections/{election_id}/upload"),
            &duplicate,
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["outcome"], "rejected");
        assert_eq!(
            app_state
                .persistence
                .lock()
                .await
                .count_election_results(election_id)
                .unwrap(),
            0
        );

        let (status, _) = send(app, "GET", "/elections/42/results", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_archive_endpoint() {
        let app_state: AppState = create_test_app_state();
        let vote_id: i64 = add_vote(&app_state).await;
        let root: PathBuf = app_state.archive_root.clone();
        let app: Router = build_router(app_state);

        let (status, _) = send(app.clone(), "POST", "/archive", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        send(
            app.clone(),
            "POST",
            &format!("/votes/{vote_id}/upload?format=default"),
            DEFAULT_CSV,
        )
        .await;
        let (status, body) = send(app, "POST", "/archive", "").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["files"][0], "votes/2017/steuergesetz.csv");
        assert!(root.join("archive.zip").exists());
        let _ = std::fs::remove_dir_all(&root);
    }
}
