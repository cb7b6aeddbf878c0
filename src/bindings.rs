// SPDX-License-Identifier: Apache-2.0
use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::error::ResolveError;

/// Environment variable prefix for endpoint bindings
pub const BINDING_PREFIX: &str = "WAYPOST_ENDPOINT__";
/// Environment variable suffix marking a REST binding
pub const BINDING_SUFFIX: &str = "____REST";
// Separator used between service key segments after normalization
const KEY_SEPARATOR: &str = "__";

/// Normalize a logical service key for table lookup.
///
/// Path separators become the internal segment separator and the whole
/// key is upper-cased, so `iam/people` and `IAM__PEOPLE` refer to the
/// same binding.
pub fn normalize_key(service_key: &str) -> String {
    service_key.replace('/', KEY_SEPARATOR).to_ascii_uppercase()
}

/// Immutable table of logical service key -> base URL bindings.
///
/// Built once at startup from the process environment and shared
/// read-only afterwards. Variables of the form
/// `WAYPOST_ENDPOINT__<SEGMENTS>____REST=<base url>` contribute one
/// binding each; everything else is ignored.
#[derive(Debug, Clone, Default)]
pub struct EndpointBindings {
    table: HashMap<String, String>,
}

impl EndpointBindings {
    /// Build the binding table from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build the binding table from an explicit key/value sequence.
    ///
    /// Later entries overwrite earlier ones when two keys normalize to
    /// the same binding name. Entries with an empty address are dropped,
    /// since an empty binding is indistinguishable from a missing one
    /// at call time.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut table = HashMap::new();
        for (key, value) in vars {
            let key = key.as_ref().to_ascii_uppercase();
            let Some(rest) = key.strip_prefix(BINDING_PREFIX) else {
                continue;
            };
            let Some(name) = rest.strip_suffix(BINDING_SUFFIX) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            let value: String = value.into();
            if value.trim().is_empty() {
                warn!(service = %name, "ignoring empty endpoint binding");
                continue;
            }
            debug!(service = %name, address = %value, "registered endpoint binding");
            table.insert(name.to_string(), value);
        }
        Self { table }
    }

    /// Resolve a logical service key and path suffix into a callable URL.
    ///
    /// The suffix is normalized to start with `/` before concatenation.
    /// A missing binding is a configuration problem, not a transient
    /// failure, and is reported as [`ResolveError::UnknownService`].
    pub fn resolve(&self, service_key: &str, path_suffix: &str) -> Result<String, ResolveError> {
        let normalized = normalize_key(service_key);
        let base = self
            .table
            .get(&normalized)
            .ok_or_else(|| ResolveError::UnknownService(service_key.to_string()))?;
        if path_suffix.starts_with('/') {
            Ok(format!("{base}{path_suffix}"))
        } else {
            Ok(format!("{base}/{path_suffix}"))
        }
    }

    /// All bindings, ordered by service key.
    pub fn entries(&self) -> BTreeMap<&str, &str> {
        self.table
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
