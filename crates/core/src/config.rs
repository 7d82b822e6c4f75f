use std::time::Duration;

/// Client-wide tunables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Administratively disable fanout lists (recently added, on deck, ...).
    pub hide_fanouts: bool,
    /// Show rotating fanart behind the home screen.
    pub global_slideshow: bool,
    /// Memory-constrained platform: request only the first page of listings.
    pub constrained: bool,
    /// Number of workers fetching section lists.
    pub workers: usize,
    /// How long `resolve` waits silently before showing a busy indicator.
    pub grace_period: Duration,
    /// Upper bound on indirect hops followed while resolving one item.
    pub max_indirect_depth: usize,
    /// Path of the settings database.
    pub db_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hide_fanouts: false,
            global_slideshow: true,
            constrained: false,
            workers: 4,
            grace_period: Duration::from_millis(100),
            max_indirect_depth: 10,
            db_path: "rustplex.db".to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `RUSTPLEX_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|v| matches!(v.trim(), "1" | "true" | "yes" | "on"))
                .unwrap_or(default)
        };
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            hide_fanouts: flag("RUSTPLEX_HIDE_FANOUTS", defaults.hide_fanouts),
            global_slideshow: flag("RUSTPLEX_GLOBAL_SLIDESHOW", defaults.global_slideshow),
            constrained: flag("RUSTPLEX_CONSTRAINED", defaults.constrained),
            workers: number("RUSTPLEX_WORKERS")
                .map(|n| n.max(1) as usize)
                .unwrap_or(defaults.workers),
            grace_period: number("RUSTPLEX_GRACE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.grace_period),
            max_indirect_depth: number("RUSTPLEX_MAX_INDIRECT")
                .map(|n| n as usize)
                .unwrap_or(defaults.max_indirect_depth),
            db_path: lookup("RUSTPLEX_DB").unwrap_or(defaults.db_path),
        }
    }
}
