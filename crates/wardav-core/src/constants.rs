/// Route component constants shared across crates
pub const API_ROUTE_COMPONENT: &str = "api";
pub const APP_ROUTE_COMPONENT: &str = "app";
pub const HEALTHCHECK_ROUTE_COMPONENT: &str = "healthcheck";
pub const HEALTHCHECK_ROUTE: &str = const_str::concat!(
    "/",
    API_ROUTE_COMPONENT,
    "/",
    APP_ROUTE_COMPONENT,
    "/",
    HEALTHCHECK_ROUTE_COMPONENT
);

/// Identity service REST layout: `{server}/api/v0/{resource}`
pub const IDENTITY_API_SEGMENTS: [&str; 2] = ["api", "v0"];
pub const IDENTITY_TICKET_RESOURCE: &str = "auth";
pub const IDENTITY_USERS_RESOURCE: &str = "users";

/// Header carrying the ticket on principal lookups.
pub const TICKET_HEADER: &str = "doob-tkt";

/// WebDAV header naming the target of MOVE/COPY.
pub const DESTINATION_HEADER: &str = "destination";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CACHE_BUCKET_SECS: u64 = 30;
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 10_000;
pub const DEFAULT_REALM: &str = "wardav";
