use std::{sync::OnceLock, time::Duration};

// Requests to GitHub or a file host that cannot connect within this period are failed.
const CONNECT_TIMEOUT_SECS: u64 = 30;
// Downloads that stall for this period (reading or writing) are failed.
const STALL_TIMEOUT_SECS: u64 = 20;

static AGENT: OnceLock<ureq::Agent> = OnceLock::new();

/// The agent shared by the release lookups and file downloads of a run, so connections are pooled between them.
/// Plain HTTP is allowed since extra files may be hosted anywhere.
pub fn get_agent() -> &'static ureq::Agent {
    AGENT.get_or_init(|| {
        ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout_read(Duration::from_secs(STALL_TIMEOUT_SECS))
            .timeout_write(Duration::from_secs(STALL_TIMEOUT_SECS))
            .try_proxy_from_env(true)
            .user_agent(&format!("patchbot/{}", env!("CARGO_PKG_VERSION")))
            .build()
    })
}
