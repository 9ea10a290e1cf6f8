use std::sync::atomic::{AtomicU64, Ordering};

static VISITS_RECORDED: AtomicU64 = AtomicU64::new(0);
static COUNTRY_LOOKUPS_UNMATCHED: AtomicU64 = AtomicU64::new(0);
static USERS_CREATED: AtomicU64 = AtomicU64::new(0);
static USER_SWITCHES: AtomicU64 = AtomicU64::new(0);
static SESSIONS_OPENED: AtomicU64 = AtomicU64::new(0);
static REQUESTS_FAILED: AtomicU64 = AtomicU64::new(0);

/// Process-wide counters exposed at `/metrics`.
pub struct Metrics;

impl Metrics {
    pub fn visit_recorded() {
        VISITS_RECORDED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn country_unmatched() {
        COUNTRY_LOOKUPS_UNMATCHED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn user_created() {
        USERS_CREATED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn user_switched() {
        USER_SWITCHES.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_opened() {
        SESSIONS_OPENED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_failed() {
        REQUESTS_FAILED.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn format_prometheus(uptime_seconds: u64, active_sessions: usize) -> String {
    let visits = VISITS_RECORDED.load(Ordering::Relaxed);
    let unmatched = COUNTRY_LOOKUPS_UNMATCHED.load(Ordering::Relaxed);
    let users_created = USERS_CREATED.load(Ordering::Relaxed);
    let user_switches = USER_SWITCHES.load(Ordering::Relaxed);
    let sessions_opened = SESSIONS_OPENED.load(Ordering::Relaxed);
    let requests_failed = REQUESTS_FAILED.load(Ordering::Relaxed);

    let total_lookups = visits + unmatched;
    let match_rate = if total_lookups > 0 {
        (visits as f64 / total_lookups as f64) * 100.0
    } else {
        0.0
    };

    format!(
        r#"# HELP tracker_uptime_seconds Number of seconds the tracker has been running
# TYPE tracker_uptime_seconds gauge
tracker_uptime_seconds {}

# HELP tracker_visits_recorded_total Number of visits recorded
# TYPE tracker_visits_recorded_total counter
tracker_visits_recorded_total {}

# HELP tracker_country_lookups_unmatched_total Number of country inputs that matched nothing
# TYPE tracker_country_lookups_unmatched_total counter
tracker_country_lookups_unmatched_total {}

# HELP tracker_country_match_rate_percent Share of country inputs that matched a country
# TYPE tracker_country_match_rate_percent gauge
tracker_country_match_rate_percent {}

# HELP tracker_users_created_total Number of family members created
# TYPE tracker_users_created_total counter
tracker_users_created_total {}

# HELP tracker_user_switches_total Number of current-user switches
# TYPE tracker_user_switches_total counter
tracker_user_switches_total {}

# HELP tracker_sessions_opened_total Number of sessions minted
# TYPE tracker_sessions_opened_total counter
tracker_sessions_opened_total {}

# HELP tracker_sessions_active Number of sessions bound to a non-default user
# TYPE tracker_sessions_active gauge
tracker_sessions_active {}

# HELP tracker_requests_failed_total Number of requests answered with an error page
# TYPE tracker_requests_failed_total counter
tracker_requests_failed_total {}
"#,
        uptime_seconds,
        visits,
        unmatched,
        match_rate,
        users_created,
        user_switches,
        sessions_opened,
        active_sessions,
        requests_failed,
    )
}
