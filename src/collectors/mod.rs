pub mod system;

/// Immutable aggregate of all collected metrics for one report invocation.
///
/// Each probed field is an explicit `Option`: a failed probe leaves `None`
/// rather than a zero that could be mistaken for a real reading.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub memory: Option<MemoryStat>,
    pub cpu_percent: Option<f64>,
    pub disk: Option<DiskStat>,
    pub hostname: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub platform: String,
}

#[derive(Debug, Clone, Copy)]
pub struct MemoryStat {
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub used_bytes: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct DiskStat {
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub used_percent: f64,
}
