use crate::crd::AuthMode;
use crate::preprocess::InvalidConfig;
use std::collections::BTreeMap;

fn populated(data: &BTreeMap<String, String>, key: &str) -> bool {
    data.get(key).is_some_and(|value| !value.trim().is_empty())
}

/// Exactly one credential style must be present in the token secret
pub fn detect_auth_mode(
    secret: &str,
    data: &BTreeMap<String, String>,
) -> Result<AuthMode, InvalidConfig> {
    let mut modes = Vec::new();
    if populated(data, "token") {
        modes.push(AuthMode::ApiToken);
    }
    if populated(data, "csp-api-token") {
        modes.push(AuthMode::CspApiToken);
    }
    if populated(data, "csp-app-id") && populated(data, "csp-app-secret") {
        modes.push(AuthMode::CspAppOAuth);
    }

    match modes.as_slice() {
        [mode] => Ok(*mode),
        [] => Err(InvalidConfig::Auth {
            secret: secret.to_string(),
            reason: "missing Wavefront API token or CSP credentials".to_string(),
        }),
        _ => Err(InvalidConfig::Auth {
            secret: secret.to_string(),
            reason: format!(
                "only one authentication type is allowed, found {}",
                modes.iter().map(AuthMode::as_str).collect::<Vec<_>>().join(", ")
            ),
        }),
    }
}
