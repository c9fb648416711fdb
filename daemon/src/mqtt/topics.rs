//! MQTT topic definitions

/// MQTT topic set
pub struct Topics;

impl Topics {
    /// Published when an image-update pass found newer images
    pub const IMAGES_PENDING: &'static str = "stackward/images/pending";

    /// Subscribed; triggers an immediate image-update pass
    pub const IMAGES_UPDATE: &'static str = "stackward/images/update";

    /// Subscribed; triggers a stack update followed by container stops
    pub const STACKS_UPDATE: &'static str = "stackward/stacks/update";

    /// Topics the daemon subscribes to on connect
    pub fn subscriptions() -> [&'static str; 2] {
        [Self::IMAGES_UPDATE, Self::STACKS_UPDATE]
    }

    /// Check if topic is one of the inbound command topics
    pub fn is_command_topic(topic: &str) -> bool {
        topic == Self::IMAGES_UPDATE || topic == Self::STACKS_UPDATE
    }
}
