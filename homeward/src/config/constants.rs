// Directions Provider Constants
pub const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org/";
pub const DIRECTIONS_PATH: &str = "v2/directions/driving-car";
pub const REQUEST_TIMEOUT_SECS: u64 = 15;
pub const API_KEY_ENV_VAR: &str = "ORS_API_KEY";

// Coordinate Bounds
pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

// Location Cadence
pub const DESIRED_UPDATE_INTERVAL_MS: u64 = 10_000;  // Provider target
pub const FASTEST_UPDATE_INTERVAL_MS: u64 = 8_000;   // Never deliver faster than this

// Map View Constants
pub const CLOSE_ZOOM_LEVEL: f64 = 17.5;              // First-fix auto-center zoom

// Route Line Style
pub const ROUTE_LINE_COLOR: &str = "#00FF00";
pub const ROUTE_LINE_WIDTH: f32 = 10.0;

// Marker Titles
pub const SELF_MARKER_TITLE: &str = "Your location";
pub const HOME_MARKER_TITLE: &str = "Home";

// Persisted Home Keys
pub const HOME_LAT_KEY: &str = "house_lat";
pub const HOME_LON_KEY: &str = "house_lon";
pub const DEFAULT_HOME_STORE_PATH: &str = "home.json";

// User-visible Messages
pub const NO_ROUTE_FOUND_MESSAGE: &str = "no route found";
pub const NETWORK_ERROR_MESSAGE: &str = "network error";
pub const PERMISSION_DENIED_MESSAGE: &str = "Location permission not granted.";
pub const SELECT_HOME_NOTICE: &str = "Long-press the map to select your home";
pub const HOME_DELETED_NOTICE: &str = "Home deleted";

// Session Channel Capacities
pub const EVENT_CHANNEL_CAPACITY: usize = 64;
pub const LOCATION_CHANNEL_CAPACITY: usize = 8;
