use crate::types::{ArtifactKind, OperationKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What a caller asked for. Built once per call and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// `artifact` holds the submitted fields as given, so attempts that never
    /// decoded into an artifact are recorded too. `id` is empty for those.
    Create {
        #[serde(rename = "artifactType")]
        artifact_type: ArtifactKind,
        id: String,
        artifact: Map<String, Value>,
    },
    Read {
        #[serde(rename = "artifactType")]
        artifact_type: ArtifactKind,
        id: String,
    },
    Update {
        #[serde(rename = "artifactType")]
        artifact_type: ArtifactKind,
        id: String,
        changes: Map<String, Value>,
    },
    Delete {
        #[serde(rename = "artifactType")]
        artifact_type: ArtifactKind,
        id: String,
    },
    Query {
        #[serde(rename = "artifactType")]
        artifact_type: ArtifactKind,
    },
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Create { .. } => OperationKind::Create,
            Operation::Read { .. } => OperationKind::Read,
            Operation::Update { .. } => OperationKind::Update,
            Operation::Delete { .. } => OperationKind::Delete,
            Operation::Query { .. } => OperationKind::Query,
        }
    }

    pub fn artifact_type(&self) -> ArtifactKind {
        match self {
            Operation::Create { artifact_type, .. }
            | Operation::Read { artifact_type, .. }
            | Operation::Update { artifact_type, .. }
            | Operation::Delete { artifact_type, .. }
            | Operation::Query { artifact_type } => *artifact_type,
        }
    }

    /// Key of the artifact this operation targets. Queries target none.
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Operation::Create { id, .. }
            | Operation::Read { id, .. }
            | Operation::Update { id, .. }
            | Operation::Delete { id, .. } => Some(id.as_str()).filter(|id| !id.is_empty()),
            Operation::Query { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serialized_with_type_tag() {
        let mut changes = Map::new();
        changes.insert("description".into(), json!("d2"));
        let op = Operation::Update {
            artifact_type: ArtifactKind::Skill,
            id: "core/x".into(),
            changes,
        };
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["type"], "update");
        assert_eq!(value["artifactType"], "skill");
        assert_eq!(value["changes"]["description"], "d2");
    }

    #[test]
    fn create_targets_artifact_id() {
        let op = Operation::Create {
            artifact_type: ArtifactKind::Skill,
            id: "core/x".into(),
            artifact: Map::new(),
        };
        assert_eq!(op.target_id(), Some("core/x"));
        assert_eq!(op.kind(), OperationKind::Create);
        let undecodable = Operation::Create {
            artifact_type: ArtifactKind::Skill,
            id: String::new(),
            artifact: Map::new(),
        };
        assert_eq!(undecodable.target_id(), None);
        let query = Operation::Query {
            artifact_type: ArtifactKind::Hook,
        };
        assert_eq!(query.target_id(), None);
    }
}
