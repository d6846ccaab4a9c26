use crate::crd::Resources;
use crate::validation::ValidationResult;
use regex::Regex;
use std::sync::LazyLock;

static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+))(Ki|Mi|Gi|Ti|Pi|Ei|m|k|M|G|T|P|E|[eE][+-]?[0-9]+)?$")
        .expect("quantity regex is valid")
});

/// Parse a Kubernetes quantity ("500m", "1.5Gi", "2e3") into base units
pub fn parse_quantity(quantity: &str) -> Option<f64> {
    let captures = QUANTITY.captures(quantity.trim())?;
    let number: f64 = captures.get(1)?.as_str().parse().ok()?;
    let multiplier = match captures.get(2).map(|m| m.as_str()) {
        None => 1.0,
        Some("m") => return Some(number / 1000.0),
        Some("k") => 1e3,
        Some("M") => 1e6,
        Some("G") => 1e9,
        Some("T") => 1e12,
        Some("P") => 1e15,
        Some("E") => 1e18,
        Some("Ki") => 1024.0,
        Some("Mi") => 1024f64.powi(2),
        Some("Gi") => 1024f64.powi(3),
        Some("Ti") => 1024f64.powi(4),
        Some("Pi") => 1024f64.powi(5),
        Some("Ei") => 1024f64.powi(6),
        Some(exponent) => 10f64.powi(exponent[1..].parse().ok()?),
    };
    Some(number * multiplier)
}

/// Check every quantity in a resources block parses and no request exceeds its limit
pub fn validate_resources(path: &str, resources: &Resources) -> ValidationResult {
    let mut result = ValidationResult::new();
    let requests = resources.requests.fields();
    let limits = resources.limits.fields();

    for ((field, request), (_, limit)) in requests.iter().zip(limits.iter()) {
        let parsed_request = parse_field(&mut result, path, "requests", field, request);
        let parsed_limit = parse_field(&mut result, path, "limits", field, limit);
        if let (Some(r), Some(l)) = (parsed_request, parsed_limit) {
            if r > l {
                result.add_error(format!(
                    "invalid {path}.resources: {field} request {request} must be less than or equal to limit {limit}"
                ));
            }
        }
    }
    result
}

fn parse_field(
    result: &mut ValidationResult,
    path: &str,
    level: &str,
    field: &str,
    value: &str,
) -> Option<f64> {
    if value.is_empty() {
        return None;
    }
    let parsed = parse_quantity(value);
    if parsed.is_none() {
        result.add_error(format!(
            "invalid {path}.resources.{level}.{field}: '{value}' is not a valid quantity"
        ));
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::ResourceQuantities;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("500m"), Some(0.5));
        assert_eq!(parse_quantity("2"), Some(2.0));
        assert_eq!(parse_quantity("1Ki"), Some(1024.0));
        assert_eq!(parse_quantity("1.5Gi"), Some(1.5 * 1024.0 * 1024.0 * 1024.0));
        assert_eq!(parse_quantity("2e3"), Some(2000.0));
        assert_eq!(parse_quantity("1G"), Some(1e9));
        assert_eq!(parse_quantity("lots"), None);
        assert_eq!(parse_quantity("1Gb"), None);
        assert_eq!(parse_quantity(""), None);
    }

    #[test]
    fn test_mixed_units_compare_by_value() {
        let resources = Resources::new(
            ResourceQuantities::new("0.5", "1024Mi"),
            ResourceQuantities::new("500m", "1Gi"),
        );
        assert!(validate_resources("proxy", &resources).is_valid());
    }

    #[test]
    fn test_request_above_limit_is_an_error() {
        let resources = Resources::new(
            ResourceQuantities::new("2", ""),
            ResourceQuantities::new("1", ""),
        );
        let result = validate_resources("dataExport.wavefrontProxy", &resources);
        assert!(result.is_error());
        assert!(result.message().contains("cpu request 2"));
    }

    #[test]
    fn test_every_bad_quantity_is_reported() {
        let resources = Resources::new(
            ResourceQuantities::new("fast", "big"),
            ResourceQuantities::default(),
        );
        assert_eq!(validate_resources("logging", &resources).errors().len(), 2);
    }
}
