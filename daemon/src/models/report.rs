//! Image change report published after an update pass

use serde::{Deserialize, Serialize};

/// One container whose freshly pulled image differs from the one it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageChange {
    pub container_name: String,
    pub image_name: String,
    /// Image id the container was started from
    pub image_id: String,
    /// Image id of the freshly pulled reference
    pub new_image_id: String,
}

/// Ordered set of image changes detected in a single pass.
///
/// Serializes to the `{"containers": [...]}` payload published on the
/// pending-images topic. An empty report is never published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageChangeReport {
    pub containers: Vec<ImageChange>,
}

impl ImageChangeReport {
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }
}
