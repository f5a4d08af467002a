use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A person known to the bookkeeping system.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct User {
    /// The unique CERN identifier of this user.
    #[serde(rename = "externalId")]
    #[schema(example = 4821)]
    pub external_id: i64,
    /// The unique identifier of this entity.
    #[schema(example = 17)]
    pub id: i64,
    /// Name of the user.
    #[schema(example = "Jane Doe")]
    pub name: String,
}
