/// Deepest a zoning strip can extend from its road, in cells. Also the
/// "no restriction" value for both sides of an unconfigured segment.
pub const MAX_DEPTH: u8 = 6;
/// Edge length of one zoning cell in world units.
pub const CELL_SIZE: f32 = 8.0;

/// Activation attempts (one per frame) before the overlay gives up waiting
/// for its host collaborators. ~10 seconds at 60fps.
pub const MAX_ACTIVATION_ATTEMPTS: u32 = 600;
/// Log a "still waiting" diagnostic every N failed activation attempts.
pub const ACTIVATION_LOG_INTERVAL: u32 = 60;
