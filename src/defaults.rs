pub const DEFAULT_SERVICE_DURATION_MINUTES: u32 = 30;

/// Used when a request does not cap the route duration
pub const DEFAULT_MAX_ROUTE_DURATION_MINUTES: u32 = 24 * 60;

/// Most stops the routing provider accepts in one sequential-leg request
pub const DEFAULT_MAX_WAYPOINTS: usize = 25;

pub const DEFAULT_SOLVER_TIME_LIMIT_SECONDS: u64 = 10;

/// Cost of dropping an optional stop, in meters of route distance
pub const DEFAULT_DROP_PENALTY: i64 = 10_000_000;

pub const DEFAULT_TIGHT_WINDOW_HOURS: i64 = 4;

pub const DEFAULT_TIGHT_DEADLINE_HOURS: i64 = 3;

/// Positions tried per problematic stop by the reordering strategy
pub const DEFAULT_PIN_SLOTS: usize = 3;

pub const DEFAULT_VALHALLA_TIMEOUT_SECONDS: u64 = 30;
