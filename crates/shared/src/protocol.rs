pub const PREDICT_ROUTE: &str = "/predict";
/// Path the original web front end posted to; served as an alias.
pub const API_PREDICT_ROUTE: &str = "/api/predict";
pub const HEALTH_ROUTE: &str = "/healthz";

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Joins a base URL and a route without doubling the separator.
pub fn endpoint(base: &str, route: &str) -> String {
    format!("{}{route}", base.trim_end_matches('/'))
}
