// SPDX-License-Identifier: Apache-2.0
use serde::Serialize;

/// Environment variable names for gateway configuration
pub const LISTEN_ADDR_ENV: &str = "WAYPOST_LISTEN_ADDR";
pub const PROTECTED_SERVICE_ENV: &str = "WAYPOST_PROTECTED_SERVICE";
pub const PROTECTED_ROUTE_ENV: &str = "WAYPOST_PROTECTED_ROUTE";
pub const PUBLIC_SERVICE_ENV: &str = "WAYPOST_PUBLIC_SERVICE";
pub const PUBLIC_ROUTE_ENV: &str = "WAYPOST_PUBLIC_ROUTE";

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:7880";
const DEFAULT_PROTECTED_SERVICE: &str = "iam/people";
const DEFAULT_PROTECTED_ROUTE: &str = "/me";
const DEFAULT_PUBLIC_SERVICE: &str = "api/gateway";
const DEFAULT_PUBLIC_ROUTE: &str = "/version";

/// A logical service route the gateway fetches on behalf of callers.
#[derive(Debug, Clone, Serialize)]
pub struct RouteTarget {
    pub service: String,
    pub path: String,
}

/// Gateway configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: String,
    /// Target for `/api/protected` (bearer token required).
    pub protected_target: RouteTarget,
    /// Target for `/api/public` (no token attached).
    pub public_target: RouteTarget,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            protected_target: RouteTarget {
                service: DEFAULT_PROTECTED_SERVICE.to_string(),
                path: DEFAULT_PROTECTED_ROUTE.to_string(),
            },
            public_target: RouteTarget {
                service: DEFAULT_PUBLIC_SERVICE.to_string(),
                path: DEFAULT_PUBLIC_ROUTE.to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load gateway configuration from environment variables, falling
    /// back to defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            listen_addr: env_or(LISTEN_ADDR_ENV, defaults.listen_addr),
            protected_target: RouteTarget {
                service: env_or(PROTECTED_SERVICE_ENV, defaults.protected_target.service),
                path: env_or(PROTECTED_ROUTE_ENV, defaults.protected_target.path),
            },
            public_target: RouteTarget {
                service: env_or(PUBLIC_SERVICE_ENV, defaults.public_target.service),
                path: env_or(PUBLIC_ROUTE_ENV, defaults.public_target.path),
            },
        }
    }
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}
