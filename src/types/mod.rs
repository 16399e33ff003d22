mod artifacts;
mod deploy_params;
mod identifiers;
mod stage;

pub use artifacts::{Artifact, WASM_TARGET_TRIPLE};
pub use deploy_params::{Amount, DeployParameters, JsonArgs};
pub use identifiers::{AccountId, Identity, StoredIdentity, ACCOUNT_ID_KEY, CONTRACT_ID_KEY};
pub use stage::BuildState;
