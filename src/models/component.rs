use serde::{Deserialize, Serialize};

/// A project-like entity a task can be attached to, as resolved by the
/// component directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub uuid: String,
    pub key: String,
    pub name: String,
    pub organization_id: String,
}

impl Component {
    pub fn new(
        uuid: impl Into<String>,
        key: impl Into<String>,
        name: impl Into<String>,
        organization_id: impl Into<String>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            key: key.into(),
            name: name.into(),
            organization_id: organization_id.into(),
        }
    }
}
