//! Inbound command parsing
//!
//! Broker messages are converted into typed commands here and delivered to
//! the dispatcher over a channel, so dispatch logic is testable without a
//! live broker.

use serde::Deserialize;
use tracing::warn;

use crate::mqtt::topics::Topics;

/// A parsed command from the message channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run an image-update pass immediately
    UpdateImages,

    /// Redeploy stacks, then stop the listed containers
    UpdateStacks(StackUpdateRequest),
}

/// Parameters of a stack-update command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StackUpdateRequest {
    /// Stacks to redeploy; `None` means all stacks
    pub stacks: Option<Vec<String>>,

    /// Containers stopped after the redeploy
    pub auto_stop_containers: Vec<String>,
}

impl Command {
    /// Parse a raw broker message into a command.
    ///
    /// A malformed or absent stack-update payload means "act on everything,
    /// stop nothing". Messages on unknown topics yield `None`.
    pub fn from_message(topic: &str, payload: &[u8]) -> Option<Command> {
        if topic == Topics::IMAGES_UPDATE {
            return Some(Command::UpdateImages);
        }

        if topic == Topics::STACKS_UPDATE {
            let request = if payload.is_empty() {
                StackUpdateRequest::default()
            } else {
                match serde_json::from_slice(payload) {
                    Ok(request) => request,
                    Err(e) => {
                        warn!("Malformed stack update payload, acting on all stacks: {}", e);
                        StackUpdateRequest::default()
                    }
                }
            };

            return Some(Command::UpdateStacks(request));
        }

        None
    }
}
