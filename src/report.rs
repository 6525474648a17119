use crate::collectors::Snapshot;
use crate::format::{format_bytes, format_duration};

pub const TITLE: &str = "System Statistics!";
pub const ACCENT_COLOR: u32 = 0x5865F2;
pub const THUMBNAIL_URL: &str = "https://avatars.githubusercontent.com/u/59181303?v=4";
pub const FOOTER: &str = "statsbot · on-demand host report";

/// Rendered, display-ready form of a [`Snapshot`]: one report per invocation.
#[derive(Debug, Clone)]
pub struct Report {
    pub title: String,
    pub color: u32,
    pub author: String,
    pub thumbnail_url: String,
    pub fields: Vec<ReportField>,
    pub footer: String,
}

#[derive(Debug, Clone)]
pub struct ReportField {
    pub name: &'static str,
    pub value: String,
    pub inline: bool,
}

/// Maps a [`Snapshot`] to a [`Report`]. Pure and deterministic.
///
/// Unavailable fields render `"n/a"`; a zero reading is a legitimate value and
/// is never shown as unavailable.
pub fn render(snapshot: &Snapshot) -> Report {
    let fields = vec![
        field("Total Memory", bytes_or_na(snapshot.memory.map(|m| m.total_bytes))),
        field("Free Memory", bytes_or_na(snapshot.memory.map(|m| m.available_bytes))),
        field("Used Memory", bytes_or_na(snapshot.memory.map(|m| m.used_bytes))),
        field("Memory %", percent_or_na(snapshot.memory.map(|m| m.used_percent))),
        field("CPU Usage", percent_or_na(snapshot.cpu_percent)),
        field("Disk Used", disk_value(snapshot)),
        field(
            "Platform",
            format!("v{} / {}", snapshot.version, snapshot.platform),
        ),
        field(
            "Uptime",
            format_duration(snapshot.uptime_seconds).unwrap_or_else(|| "n/a".to_string()),
        ),
    ];

    Report {
        title: TITLE.to_string(),
        color: ACCENT_COLOR,
        author: author_line(&snapshot.hostname),
        thumbnail_url: THUMBNAIL_URL.to_string(),
        fields,
        footer: FOOTER.to_string(),
    }
}

fn field(name: &'static str, value: String) -> ReportField {
    ReportField {
        name,
        value,
        inline: true,
    }
}

fn bytes_or_na(bytes: Option<u64>) -> String {
    bytes.map(format_bytes).unwrap_or_else(|| "n/a".to_string())
}

fn percent_or_na(pct: Option<f64>) -> String {
    pct.map(|v| format!("{v:.1}%"))
        .unwrap_or_else(|| "n/a".to_string())
}

fn disk_value(snapshot: &Snapshot) -> String {
    match snapshot.disk {
        Some(disk) => format!(
            "{} / {} ({:.1}%)",
            format_bytes(disk.used_bytes),
            format_bytes(disk.total_bytes),
            disk.used_percent
        ),
        None => "n/a".to_string(),
    }
}

fn author_line(hostname: &str) -> String {
    format!("{} (@{})", title_case(hostname), hostname.to_lowercase())
}

fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
