//! Node role classification from control-plane marker labels

use crate::models::{Labels, Role};

pub const CONTROL_PLANE_LABEL: &str = "node-role.kubernetes.io/control-plane";
pub const LEGACY_MASTER_LABEL: &str = "node-role.kubernetes.io/master";

/// Classifies nodes as master or worker
///
/// A node is a master when its labels contain any of the configured marker
/// keys, whatever the value. Distributions disagree on the key, so the set
/// is configuration rather than a constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleClassifier {
    markers: Vec<String>,
}

impl Default for RoleClassifier {
    fn default() -> Self {
        Self::new([CONTROL_PLANE_LABEL, LEGACY_MASTER_LABEL])
    }
}

impl RoleClassifier {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut markers: Vec<String> = markers
            .into_iter()
            .map(Into::into)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        markers.dedup();
        Self { markers }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn classify(&self, labels: &Labels) -> Role {
        if self.markers.iter().any(|m| labels.contains_key(m)) {
            Role::Master
        } else {
            Role::Worker
        }
    }
}
