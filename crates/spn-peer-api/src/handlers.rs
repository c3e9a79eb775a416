use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use spn_common::{Cid, Fid};
use spn_storage::merkle::Proof;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /download/{fid}` — the reconstructed file, chunks concatenated in
/// index order.
pub async fn download(
    State(state): State<AppState>,
    Path(fid): Path<String>,
) -> Result<Vec<u8>, ApiError> {
    let fid = Fid::from_raw(fid);
    let dir = spn_storage::layout::fid_dir(&state.networkfiles_root, &fid);
    if !dir.exists() {
        return Err(ApiError::NotFound);
    }

    let mut body = Vec::new();
    let mut i = 0usize;
    loop {
        let path = spn_storage::layout::chunk_path(&state.networkfiles_root, &fid, i);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                body.extend(bytes);
                i += 1;
            }
            Err(_) => break,
        }
    }
    if body.is_empty() && i == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(body)
}

#[derive(Debug, Deserialize)]
pub struct AttestRequest {
    pub cid: String,
    pub hashlist: String,
    pub item: String,
}

#[derive(Debug, Serialize)]
pub struct AttestResponse {
    pub accepted: bool,
}

/// `POST /attest` — verifies the submitted proof against the tree root this
/// node holds for `cid`'s bound fingerprint.
pub async fn attest(
    State(state): State<AppState>,
    Json(request): Json<AttestRequest>,
) -> Result<Json<AttestResponse>, ApiError> {
    let cid = Cid::from_raw(request.cid.clone());
    let fid = state
        .index
        .lookup(&cid)
        .map_err(|_| ApiError::ContractNotFound(request.cid.clone()))?;

    let proof: Proof = serde_json::from_str(&request.hashlist)
        .map_err(|e| ApiError::BadRequest(format!("invalid proof: {e}")))?;
    let chunk = hex::decode(&request.item)
        .map_err(|e| ApiError::BadRequest(format!("invalid chunk hex: {e}")))?;

    let tree = spn_storage::load_tree(&state.networkfiles_root, &fid)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let accepted = spn_storage::verify(tree.root(), proof.leaf_index, &chunk, &proof);
    if !accepted {
        return Err(ApiError::ProofRejected(request.cid));
    }
    Ok(Json(AttestResponse { accepted }))
}

pub async fn version(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "version": state.version }))
}

pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "status": "ok", "address": state.self_address }))
}
