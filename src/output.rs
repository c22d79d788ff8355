use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// Human-facing chatter is suppressed when `HARVEST_QUIET` is set
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("HARVEST_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}
