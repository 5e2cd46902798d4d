pub const PATH_CONFIG: &str = "/config";
pub const PATH_BLINK: &str = "/blink";

pub const QUERY_NAME: &str = "name";
pub const QUERY_VALUE: &str = "value";

pub const DEFAULT_BASE_URL: &str = "http://192.168.4.1";
pub const STORAGE_KEY_BASE_URL: &str = "controllerBaseUrl";
