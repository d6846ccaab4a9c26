//! # Validation
//!
//! Accumulating validation results plus the checks shared by several
//! components. Validation never short-circuits: every problem in a pass is
//! collected so the status message lists all of them at once.
//!
//! ## Module Structure
//!
//! - `quantity.rs` - Kubernetes quantity parsing and request/limit checks
//! - `legacy.rs` - Detection of manually installed collectors and proxies
//! - `overrides.rs` - `ResourceOverrideSet` and `workloadResources` checks

mod legacy;
mod overrides;
mod quantity;

pub use legacy::{detect_legacy_installs, validate_legacy_installs, LEGACY_INSTALLS};
pub use overrides::{validate_override_set, validate_workload_resources};
pub use quantity::{parse_quantity, validate_resources};

/// Errors and warnings found during one validation pass
///
/// Errors block applying resources; warnings are reported but resources are
/// still applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// No errors and no warnings
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Warnings only
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.errors.is_empty() && !self.warnings.is_empty()
    }

    /// Errors joined with `; ` when there are any, otherwise the warnings
    #[must_use]
    pub fn message(&self) -> String {
        if self.is_error() {
            self.errors.join("; ")
        } else {
            self.warnings.join("; ")
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

impl FromIterator<ValidationResult> for ValidationResult {
    fn from_iter<I: IntoIterator<Item = ValidationResult>>(iter: I) -> Self {
        let mut merged = ValidationResult::new();
        for result in iter {
            merged.merge(result);
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_is_valid() {
        let result = ValidationResult::new();
        assert!(result.is_valid());
        assert!(!result.is_error());
        assert!(!result.is_warning());
        assert_eq!(result.message(), "");
    }

    #[test]
    fn test_errors_take_precedence_in_message() {
        let mut result = ValidationResult::new();
        result.add_warning("unknown workload 'foo'");
        result.add_error("missing wavefrontUrl");
        result.add_error("missing clusterName");
        assert!(result.is_error());
        assert!(!result.is_warning());
        assert_eq!(result.message(), "missing wavefrontUrl; missing clusterName");
    }

    #[test]
    fn test_warning_only() {
        let mut result = ValidationResult::new();
        result.add_warning("legacy install");
        assert!(result.is_warning());
        assert!(!result.is_valid());
        assert_eq!(result.message(), "legacy install");
    }

    #[test]
    fn test_collect_merges_everything() {
        let mut a = ValidationResult::new();
        a.add_error("a");
        let mut b = ValidationResult::new();
        b.add_warning("b");
        let merged: ValidationResult = vec![a, b].into_iter().collect();
        assert_eq!(merged.errors(), ["a"]);
        assert_eq!(merged.warnings(), ["b"]);
    }
}
