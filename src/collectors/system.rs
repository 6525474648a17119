use crate::collectors::{DiskStat, MemoryStat, Snapshot};
use std::path::Path;
use std::time::Duration;
use sysinfo::{CpuExt, DiskExt, System, SystemExt};
use tracing::debug;

/// Window between the two CPU refreshes. A blocking one-second sample gives a
/// meaningful instantaneous reading instead of an average-since-boot figure.
const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// Runs every probe against a fresh `System` and assembles one [`Snapshot`].
///
/// Best-effort by contract: a failed probe degrades its own field and never
/// aborts the rest of the collection.
pub async fn collect_snapshot() -> Snapshot {
    let mut system = System::new();

    system.refresh_memory();
    system.refresh_disks_list();
    system.refresh_disks();

    system.refresh_cpu();
    tokio::time::sleep(CPU_SAMPLE_WINDOW).await;
    system.refresh_cpu();

    let memory = collect_memory(&system);
    let cpu_percent = collect_cpu(&system);
    let disk = collect_disk(&system);
    let hostname = resolve_hostname(system.host_name(), basic_hostname());
    let uptime_seconds = system.uptime();

    debug!(
        memory_ok = memory.is_some(),
        cpu_ok = cpu_percent.is_some(),
        disk_ok = disk.is_some(),
        hostname = %hostname,
        uptime_seconds,
        "snapshot collected"
    );

    Snapshot {
        memory,
        cpu_percent,
        disk,
        hostname,
        uptime_seconds,
        version: env!("CARGO_PKG_VERSION").to_string(),
        platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
    }
}

fn collect_memory(system: &System) -> Option<MemoryStat> {
    let total_bytes = system.total_memory();
    if total_bytes == 0 {
        return None;
    }

    let available_bytes = system.available_memory();
    let used_bytes = system.used_memory();
    Some(MemoryStat {
        total_bytes,
        available_bytes,
        used_bytes,
        used_percent: (used_bytes as f64 / total_bytes as f64) * 100.0,
    })
}

fn collect_cpu(system: &System) -> Option<f64> {
    let cpus = system.cpus();
    if cpus.is_empty() {
        return None;
    }

    let sum: f32 = cpus.iter().map(|c| c.cpu_usage()).sum();
    Some((sum / cpus.len() as f32) as f64)
}

fn collect_disk(system: &System) -> Option<DiskStat> {
    let root = root_path(std::env::consts::OS, system_drive_env().as_deref());
    let disk = system
        .disks()
        .iter()
        .find(|d| d.mount_point() == Path::new(&root))?;

    let total_bytes = disk.total_space();
    if total_bytes == 0 {
        return None;
    }
    let used_bytes = total_bytes.saturating_sub(disk.available_space());
    Some(DiskStat {
        used_bytes,
        total_bytes,
        used_percent: (used_bytes as f64 / total_bytes as f64) * 100.0,
    })
}

/// Resolves the platform-appropriate filesystem root to probe for disk usage.
///
/// Pure so the platform split is testable without touching the filesystem.
pub fn root_path(os: &str, system_drive: Option<&str>) -> String {
    if os == "windows" {
        let drive = system_drive
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or("C:");
        format!("{drive}\\")
    } else {
        "/".to_string()
    }
}

fn system_drive_env() -> Option<String> {
    std::env::var("SystemDrive").ok()
}

/// Picks the first non-empty name out of the rich and basic lookups,
/// falling back to the literal `"unknown"`. Never returns an empty string.
pub fn resolve_hostname(rich: Option<String>, basic: Option<String>) -> String {
    rich.filter(|name| !name.trim().is_empty())
        .or_else(|| basic.filter(|name| !name.trim().is_empty()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn basic_hostname() -> Option<String> {
    hostname::get()
        .ok()
        .map(|name| name.to_string_lossy().to_string())
}
