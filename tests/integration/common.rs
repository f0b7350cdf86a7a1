use quarry_sf_auth::SalesforceCredentials;

/// Credentials for the org under test, or `None` when `SF_INSTANCE_URL` is
/// not set. Any other configuration problem fails the test.
pub fn require_credentials() -> Option<SalesforceCredentials> {
    if std::env::var("SF_INSTANCE_URL").map_or(true, |v| v.is_empty()) {
        eprintln!("SF_INSTANCE_URL not set; skipping live-org test");
        return None;
    }
    match SalesforceCredentials::from_env() {
        Ok(creds) => Some(creds),
        Err(e) => panic!("SF_INSTANCE_URL is set but the credentials are unusable: {e}"),
    }
}
