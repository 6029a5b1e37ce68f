use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePreferenceRequest {
    pub repair_id: Uuid,
    pub client_id: Uuid,
}
