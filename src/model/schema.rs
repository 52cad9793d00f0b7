use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::value::{PrefMap, PrefValue};

/// Dotted location of a field inside a preference tree.
///
/// The root has no segments and renders as `$`. The text form joins
/// segments with `.` and parsing splits on it, so a key that itself contains
/// a dot does not survive a trip through the string form (JSON reports,
/// policy keys given as `&str`). Build such paths with [`FieldPath::child`]
/// and compare them as values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn root() -> Self {
        FieldPath(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of a direct child field.
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(key.to_string());
        FieldPath(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Dotted form without the root marker (`""` for the root).
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("$")
        } else {
            f.write_str(&self.dotted())
        }
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        if s.is_empty() || s == "$" {
            return FieldPath::root();
        }
        FieldPath(s.split('.').map(str::to_string).collect())
    }
}

impl From<String> for FieldPath {
    fn from(s: String) -> Self {
        FieldPath::from(s.as_str())
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

/// How the reconciler treats one named field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldPolicy {
    /// Fill when missing, migrate when the shape is stale, keep otherwise.
    #[default]
    Generic,
    /// Managed entirely by the user. Passed through verbatim, never defaulted.
    UserOwned,
    /// Kept as-is once it differs from `baseline`; otherwise replaced by the
    /// schema's current default. `baseline` is the factory value shipped with
    /// the schema this binary was built against.
    PreserveIfDiverged { baseline: PrefValue },
}

impl FieldPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            FieldPolicy::Generic => "generic",
            FieldPolicy::UserOwned => "user-owned",
            FieldPolicy::PreserveIfDiverged { .. } => "preserve-if-diverged",
        }
    }
}

/// The current, code-defined shape and default values of the preference tree,
/// together with the per-field exceptions to the generic migration rule.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSchema {
    defaults: PrefMap,
    policies: IndexMap<FieldPath, FieldPolicy>,
}

impl CanonicalSchema {
    pub fn new(defaults: PrefMap) -> Self {
        CanonicalSchema {
            defaults,
            policies: IndexMap::new(),
        }
    }

    /// Register an exception for the field at `path` (dotted).
    pub fn with_policy(mut self, path: impl Into<FieldPath>, policy: FieldPolicy) -> Self {
        self.policies.insert(path.into(), policy);
        self
    }

    pub fn defaults(&self) -> &PrefMap {
        &self.defaults
    }

    /// The defaults as a standalone tree (a deep copy).
    pub fn default_tree(&self) -> PrefValue {
        PrefValue::Object(self.defaults.clone())
    }

    pub fn policy_for(&self, path: &FieldPath) -> &FieldPolicy {
        static GENERIC: FieldPolicy = FieldPolicy::Generic;
        self.policies.get(path).unwrap_or(&GENERIC)
    }

    pub fn policies(&self) -> impl Iterator<Item = (&FieldPath, &FieldPolicy)> {
        self.policies.iter()
    }
}
