use crate::crd::HttpProxySettings;
use crate::preprocess::InvalidConfig;
use std::collections::BTreeMap;

/// Read outbound proxy settings from the `httpProxy` secret data
pub fn parse_http_proxy(
    secret: &str,
    data: &BTreeMap<String, String>,
) -> Result<HttpProxySettings, InvalidConfig> {
    let invalid = |reason: String| InvalidConfig::HttpProxy {
        secret: secret.to_string(),
        reason,
    };

    let raw = data
        .get("http-url")
        .map(|url| url.trim())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| invalid("missing key 'http-url'".to_string()))?;
    let url = reqwest::Url::parse(raw).map_err(|e| invalid(format!("invalid http-url: {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| invalid("http-url has no host".to_string()))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| invalid("http-url has no port".to_string()))?;

    Ok(HttpProxySettings {
        host: host.to_string(),
        port,
        user: data.get("basic-auth-username").cloned().unwrap_or_default(),
        password: data.get("basic-auth-password").cloned().unwrap_or_default(),
        use_ca_bundle: data.contains_key("tls-root-ca-bundle"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_settings() {
        let data = BTreeMap::from([
            ("http-url".to_string(), "https://proxy.internal:3128".to_string()),
            ("basic-auth-username".to_string(), "user".to_string()),
            ("basic-auth-password".to_string(), "pass".to_string()),
            ("tls-root-ca-bundle".to_string(), "-----BEGIN CERTIFICATE-----".to_string()),
        ]);
        let settings = parse_http_proxy("proxy-secret", &data).unwrap();
        assert_eq!(settings.host, "proxy.internal");
        assert_eq!(settings.port, 3128);
        assert_eq!(settings.user, "user");
        assert!(settings.use_ca_bundle);
    }

    #[test]
    fn test_scheme_default_port() {
        let data = BTreeMap::from([("http-url".to_string(), "http://squid".to_string())]);
        let settings = parse_http_proxy("proxy-secret", &data).unwrap();
        assert_eq!(settings.port, 80);
        assert!(!settings.use_ca_bundle);
    }

    #[test]
    fn test_missing_url_names_secret() {
        let err = parse_http_proxy("proxy-secret", &BTreeMap::new()).unwrap_err();
        assert!(err.to_string().contains("proxy-secret"));
    }
}
