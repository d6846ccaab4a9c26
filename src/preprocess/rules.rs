//! User preprocessor rules: parsing and reserved-tag enforcement

use crate::constants::{GLOBAL_RULES_SCOPE, PREPROCESSOR_RULES_KEY, RESERVED_IDENTITY_TAGS};
use crate::preprocess::InvalidConfig;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Which kind of data point a rule action touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    Metric,
    Span,
}

impl fmt::Display for RuleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleScope::Metric => f.write_str("metric"),
            RuleScope::Span => f.write_str("span"),
        }
    }
}

/// Rules split by port, with the `global` scope separated out
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRules {
    pub port_rules: BTreeMap<String, Vec<Value>>,
    pub global_rules: Vec<Value>,
}

/// Tag-setting actions and the field naming the tag they set
fn tag_field(action: &str) -> Option<(RuleScope, &'static str)> {
    match action {
        "addTag" | "addTagIfNotExists" => Some((RuleScope::Metric, "tag")),
        "spanAddTag" | "spanAddTagIfNotExists" => Some((RuleScope::Span, "key")),
        _ => None,
    }
}

/// Parse `rules.yaml` from the ConfigMap data and reject rules touching reserved tags
pub fn parse_user_rules(
    configmap: &str,
    data: &BTreeMap<String, String>,
) -> Result<UserRules, InvalidConfig> {
    let malformed = |reason: String| InvalidConfig::MalformedRules {
        configmap: configmap.to_string(),
        reason,
    };

    let Some(document) = data.get(PREPROCESSOR_RULES_KEY) else {
        return Err(malformed(format!("missing key '{PREPROCESSOR_RULES_KEY}'")));
    };
    let parsed: serde_yaml::Value =
        serde_yaml::from_str(document).map_err(|e| malformed(e.to_string()))?;
    let mapping = match parsed {
        serde_yaml::Value::Null => return Ok(UserRules::default()),
        serde_yaml::Value::Mapping(mapping) => mapping,
        _ => return Err(malformed("expected a map of port to rules".to_string())),
    };

    let mut rules = UserRules::default();
    for (key, value) in mapping {
        let port = match key {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            other => return Err(malformed(format!("unexpected key {other:?}"))),
        };
        if port != GLOBAL_RULES_SCOPE && port.parse::<u16>().is_err() {
            return Err(malformed(format!(
                "'{port}' is neither a port nor '{GLOBAL_RULES_SCOPE}'"
            )));
        }

        let port_rules: Vec<Value> = match serde_json::to_value(value)
            .map_err(|e| malformed(e.to_string()))?
        {
            Value::Null => Vec::new(),
            Value::Array(list) => list,
            _ => return Err(malformed(format!("rules for '{port}' must be a list"))),
        };

        for rule in &port_rules {
            check_reserved_tags(configmap, &port, rule)?;
        }

        if port == GLOBAL_RULES_SCOPE {
            rules.global_rules = port_rules;
        } else {
            rules.port_rules.insert(port, port_rules);
        }
    }
    Ok(rules)
}

fn check_reserved_tags(configmap: &str, port: &str, rule: &Value) -> Result<(), InvalidConfig> {
    let Some(fields) = rule.as_object() else {
        return Err(InvalidConfig::MalformedRules {
            configmap: configmap.to_string(),
            reason: format!("rule on '{port}' is not a map"),
        });
    };
    let Some((scope, field)) = fields
        .get("action")
        .and_then(Value::as_str)
        .and_then(tag_field)
    else {
        return Ok(());
    };
    let Some(tag) = fields.get(field).and_then(Value::as_str) else {
        return Ok(());
    };
    if RESERVED_IDENTITY_TAGS.contains(&tag) {
        return Err(InvalidConfig::DisallowedTag {
            configmap: configmap.to_string(),
            port: port.to_string(),
            scope,
            tag: tag.to_string(),
        });
    }
    Ok(())
}
