use std::path::PathBuf;
use std::sync::Arc;

use spn_contract_index::ContractIndex;

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<ContractIndex>,
    pub networkfiles_root: PathBuf,
    pub self_address: String,
    pub version: &'static str,
}
