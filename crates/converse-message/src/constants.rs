/// Sentinel message id for messages not yet acknowledged by the server.
pub const UNASSIGNED_MESSAGE_ID: i64 = 0;

/// Sentinel parent id for top-level messages (not a threaded reply).
pub const NO_PARENT_MESSAGE_ID: i64 = 0;

/// Survival value meaning the message never expires.
pub const SURVIVAL_FOREVER: i32 = -1;

/// Channel type string for open channels, as carried on the wire.
pub const CHANNEL_TYPE_OPEN: &str = "open";

/// Channel type string for group channels, as carried on the wire.
pub const CHANNEL_TYPE_GROUP: &str = "group";
