//! Renderable reference handed to the cross-service display collaborator.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Popup {
    pub title: String,
    /// Page the display service embeds in a frame.
    pub frame_url: String,
    /// Service that asked for the popup.
    pub service_id: String,
}
