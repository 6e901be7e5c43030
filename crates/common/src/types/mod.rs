use serde::{Deserialize, Serialize};

/// Storage key holding the raw identifier of the selected store.
pub const SELECTED_STORE_UUID_KEY: &str = "selectedStoreUUID";
/// Storage key holding the JSON-serialized data of the selected store.
pub const SELECTED_LOCATION_KEY: &str = "selectedLocation";
/// Name of the notification broadcast when the user picks another store.
pub const STORE_LOCATION_CHANGED_EVENT: &str = "storeLocationChanged";
/// Header carrying the store identifier on contextual requests.
pub const STORE_UUID_HEADER: &str = "X-Store-UUID";
/// Query parameter carrying the store identifier on contextual requests.
pub const STORE_UUID_QUERY_PARAM: &str = "store_uuid";

/// Payload of a `storeLocationChanged` notification.
///
/// `D` is the store description; it is opaque to this workspace and
/// defaults to untyped JSON.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoreLocationChanged<D = serde_json::Value> {
    #[serde(rename = "storeUUID")]
    pub store_uuid: String,
    #[serde(rename = "storeData")]
    pub store_data: D,
}

impl<D> StoreLocationChanged<D> {
    pub fn new(store_uuid: impl Into<String>, store_data: D) -> Self {
        Self { store_uuid: store_uuid.into(), store_data }
    }
}
