//! Readiness - control-plane の JSON ドキュメントに対する判定
//!
//! Poller::until の predicate として使います。

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Readiness {
    /// `results[]` contains a cluster named `cluster` whose `stateName` is `state`.
    ClusterInState { cluster: String, state: String },
    /// `results[0].state` equals the value.
    ArchiveInState(String),
    /// `results[0].lastArchiveRun.endDate` is present and not null.
    ArchiveRunCompleted,
    /// The value at a JSON pointer equals `expected`.
    FieldEquals { pointer: String, expected: Value },
}

impl Readiness {
    pub fn cluster_idle(cluster: impl Into<String>) -> Self {
        Self::ClusterInState {
            cluster: cluster.into(),
            state: "IDLE".to_string(),
        }
    }

    pub fn archive_active() -> Self {
        Self::ArchiveInState("ACTIVE".to_string())
    }

    pub fn is_ready(&self, doc: &Value) -> bool {
        match self {
            Self::ClusterInState { cluster, state } => doc
                .get("results")
                .and_then(Value::as_array)
                .is_some_and(|results| {
                    results.iter().any(|c| {
                        c.get("name").and_then(Value::as_str) == Some(cluster.as_str())
                            && c.get("stateName").and_then(Value::as_str) == Some(state.as_str())
                    })
                }),
            Self::ArchiveInState(state) => {
                doc.pointer("/results/0/state").and_then(Value::as_str) == Some(state.as_str())
            }
            Self::ArchiveRunCompleted => doc
                .pointer("/results/0/lastArchiveRun/endDate")
                .is_some_and(|end| !end.is_null()),
            Self::FieldEquals { pointer, expected } => doc.pointer(pointer) == Some(expected),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::ClusterInState { cluster, state } => format!("cluster '{cluster}' is {state}"),
            Self::ArchiveInState(state) => format!("online archive is {state}"),
            Self::ArchiveRunCompleted => "archive run has completed".to_string(),
            Self::FieldEquals { pointer, expected } => format!("{pointer} == {expected}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn clusters() -> Value {
        json!({
            "results": [
                { "name": "Cluster0", "stateName": "CREATING" },
                { "name": "Cluster1", "stateName": "IDLE" }
            ]
        })
    }

    #[rstest]
    #[case::idle(Readiness::cluster_idle("Cluster1"), true)]
    #[case::still_creating(Readiness::cluster_idle("Cluster0"), false)]
    #[case::unknown_cluster(Readiness::cluster_idle("Other"), false)]
    #[case::explicit_state(
        Readiness::ClusterInState { cluster: "Cluster0".into(), state: "CREATING".into() },
        true
    )]
    fn cluster_state(#[case] readiness: Readiness, #[case] expected: bool) {
        assert_eq!(readiness.is_ready(&clusters()), expected);
    }

    #[rstest]
    #[case::active(json!({"results": [{"state": "ACTIVE"}]}), true)]
    #[case::pending(json!({"results": [{"state": "PENDING"}]}), false)]
    #[case::no_archives(json!({"results": []}), false)]
    #[case::unexpected_shape(json!({"detail": "Unauthorized"}), false)]
    fn archive_active(#[case] doc: Value, #[case] expected: bool) {
        assert_eq!(Readiness::archive_active().is_ready(&doc), expected);
    }

    #[rstest]
    #[case::finished(
        json!({"results": [{"lastArchiveRun": {"startDate": "2024-01-01T00:00:00Z", "endDate": "2024-01-01T00:05:00Z"}}]}),
        true
    )]
    #[case::running(
        json!({"results": [{"lastArchiveRun": {"startDate": "2024-01-01T00:00:00Z", "endDate": null}}]}),
        false
    )]
    #[case::never_ran(json!({"results": [{"state": "ACTIVE"}]}), false)]
    fn archive_run_completed(#[case] doc: Value, #[case] expected: bool) {
        assert_eq!(Readiness::ArchiveRunCompleted.is_ready(&doc), expected);
    }

    #[test]
    fn field_equals_compares_json_values() {
        let doc = json!({"status": {"phase": "ready", "replicas": 3}});
        let phase = Readiness::FieldEquals {
            pointer: "/status/phase".into(),
            expected: json!("ready"),
        };
        let replicas = Readiness::FieldEquals {
            pointer: "/status/replicas".into(),
            expected: json!("3"),
        };
        let missing = Readiness::FieldEquals {
            pointer: "/status/nope".into(),
            expected: Value::Null,
        };

        assert!(phase.is_ready(&doc));
        // 型まで一致しないと偽
        assert!(!replicas.is_ready(&doc));
        assert!(!missing.is_ready(&doc));
    }

    #[test]
    fn describe_names_the_condition() {
        assert_eq!(Readiness::cluster_idle("c").describe(), "cluster 'c' is IDLE");
        assert_eq!(
            Readiness::ArchiveRunCompleted.describe(),
            "archive run has completed"
        );
    }
}
