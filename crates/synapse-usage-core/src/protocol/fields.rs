//! Built-in field lists reported by Synapse's phone-home stats.

/// Prefix applied to every measurement when exposed.
pub const DEFAULT_METRICS_PREFIX: &str = "synapse_usage_";

/// Measurements exposed as gauges.
pub const DEFAULT_GAUGES: &[&str] = &[
    "memory_rss",
    "cpu_average",
    "timestamp",
    "uptime_seconds",
    "total_users",
    "total_nonbridged_users",
    "daily_user_type_native",
    "daily_user_type_guest",
    "daily_user_type_bridged",
    "total_room_count",
    "daily_active_users",
    "monthly_active_users",
    "daily_active_rooms",
    "daily_active_e2ee_rooms",
    "daily_messages",
    "daily_e2ee_messages",
    "daily_sent_messages",
    "daily_sent_e2ee_messages",
    "r30v2_users_all",
    "r30v2_users_android",
    "r30v2_users_ios",
    "r30v2_users_electron",
    "r30v2_users_web",
    "cache_factor",
    "event_cache_size",
];

/// Identity fields used as labels, in label order.
pub const DEFAULT_LABEL_FIELDS: &[&str] = &[
    "homeserver",
    "server_context",
    "python_version",
    "database_engine",
    "database_server_version",
    "log_level",
];

/// Prometheus metric name: `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Prometheus label name: `[a-zA-Z_][a-zA-Z0-9_]*`, `__` prefix reserved.
pub fn is_valid_label_name(name: &str) -> bool {
    if name.starts_with("__") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
