use reqwest::Client;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) http: Client,
    /// Normalized upstream origin, without a trailing slash.
    pub(crate) upstream_base: String,
}
