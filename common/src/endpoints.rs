pub const PATH_TURN_ON: &str = "/ONN";
pub const PATH_TURN_OFF: &str = "/OFF";
pub const PATH_DISCONNECT: &str = "/DIS";
pub const PATH_HEARTBEAT: &str = "/HI!";

pub const PATH_SET_SCHEDULE: &str = "/SCH";
pub const PATH_SET_TIME: &str = "/TIM";

// Older firmware revisions.
pub const PATH_LEGACY_SET_TIMESTAMP: &str = "/SET_TIMESTAMP";
pub const PATH_LEGACY_SET_SCHEDULE: &str = "/SET_SCHEDULE";
