use crate::collectors::system::collect_snapshot;
use crate::config::Config;
use crate::report::{render, Report};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use teloxide::prelude::*;
use teloxide::types::{ChatId, Me, ParseMode};
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

#[derive(Clone)]
struct BotRuntime {
    trigger: String,
    allowed_chats: HashSet<i64>,
    limiter: Arc<Mutex<RateLimiter>>,
}

pub async fn run_bot(bot: Bot, cfg: Config, mut shutdown: watch::Receiver<bool>) {
    let runtime = BotRuntime {
        trigger: cfg.trigger(),
        allowed_chats: cfg.telegram.allowed_chat_ids.iter().copied().collect(),
        limiter: Arc::new(Mutex::new(RateLimiter::new(
            cfg.telegram.rate_limit_per_minute,
        ))),
    };

    announce_status(&bot, &cfg).await;

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_message));

    // Every update gets its own task: a slow report (the one-second CPU
    // sample) must not stall delivery of other incoming commands.
    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![runtime])
        .distribution_function(|_| None::<std::convert::Infallible>)
        .build();

    let mut dispatch_handle = tokio::spawn(async move {
        dispatcher.dispatch().await;
    });

    tokio::select! {
        _ = shutdown.changed() => {
            dispatch_handle.abort();
            let _ = (&mut dispatch_handle).await;
            info!("telegram bot stopped");
        }
        result = &mut dispatch_handle => {
            match result {
                Ok(()) => {}
                Err(join_err) if join_err.is_cancelled() => {}
                Err(join_err) => {
                    warn!(error = %join_err, "telegram dispatch task failed");
                }
            }
        }
    }
}

/// One-shot presence announcement. Failures are logged and swallowed: the bot
/// is useful without it.
async fn announce_status(bot: &Bot, cfg: &Config) {
    let Some(status) = cfg.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return;
    };

    for chat_id in &cfg.telegram.allowed_chat_ids {
        if let Err(err) = bot.send_message(ChatId(*chat_id), status).await {
            warn!(chat_id = *chat_id, error = %err, "failed to announce status");
        }
    }
}

async fn handle_message(bot: Bot, me: Me, msg: Message, runtime: BotRuntime) -> ResponseResult<()> {
    let author_is_self = msg.from().map(|user| user.id) == Some(me.user.id);
    if !should_trigger(author_is_self, msg.text(), &runtime.trigger) {
        return Ok(());
    }

    let chat_id = msg.chat.id.0;
    if !should_handle_chat(msg.chat.is_private(), chat_id, &runtime.allowed_chats) {
        return Ok(());
    }
    if !consume_rate_limit(&runtime, chat_id).await {
        bot.send_message(msg.chat.id, "Too many requests. Try again in a minute.")
            .await?;
        return Ok(());
    }

    let snapshot = collect_snapshot().await;
    let report = render(&snapshot);

    // Reports are ephemeral: a failed delivery is logged, never retried, and
    // never surfaced back to the chat.
    if let Err(err) = bot
        .send_message(msg.chat.id, report_html(&report))
        .parse_mode(ParseMode::Html)
        .await
    {
        warn!(chat_id, error = %err, "failed to deliver report");
    }

    Ok(())
}

/// A qualifying message comes from someone other than the bot itself and
/// matches the configured trigger exactly.
pub fn should_trigger(author_is_self: bool, text: Option<&str>, trigger: &str) -> bool {
    !author_is_self && text == Some(trigger)
}

pub fn should_handle_chat(is_private: bool, chat_id: i64, allowed: &HashSet<i64>) -> bool {
    is_private && allowed.contains(&chat_id)
}

async fn consume_rate_limit(runtime: &BotRuntime, chat_id: i64) -> bool {
    let now = now_unix();
    let mut limiter = runtime.limiter.lock().await;
    limiter.allow(chat_id, now)
}

fn report_html(report: &Report) -> String {
    let mut lines = Vec::with_capacity(report.fields.len() + 4);
    lines.push(format!("<b>{}</b>", report.title));
    lines.push(report.author.clone());
    lines.push(String::new());
    for field in &report.fields {
        lines.push(format!("{}: <code>{}</code>", field.name, field.value));
    }
    lines.push(String::new());
    lines.push(report.footer.clone());
    lines.join("\n")
}

#[derive(Debug)]
struct RateLimiter {
    limit_per_minute: u32,
    timestamps_by_chat: HashMap<i64, VecDeque<i64>>,
}

impl RateLimiter {
    fn new(limit_per_minute: u32) -> Self {
        Self {
            limit_per_minute,
            timestamps_by_chat: HashMap::new(),
        }
    }

    fn allow(&mut self, chat_id: i64, now_unix: i64) -> bool {
        let queue = self.timestamps_by_chat.entry(chat_id).or_default();
        while let Some(ts) = queue.front().copied() {
            if now_unix - ts >= 60 {
                queue.pop_front();
            } else {
                break;
            }
        }

        if queue.len() >= self.limit_per_minute as usize {
            return false;
        }

        queue.push_back(now_unix);
        true
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::{MemoryStat, Snapshot};

    #[test]
    fn own_messages_never_trigger() {
        assert!(!should_trigger(true, Some("!stats"), "!stats"));
        assert!(!should_trigger(true, Some("anything"), "!stats"));
        assert!(!should_trigger(true, None, "!stats"));
    }

    #[test]
    fn trigger_requires_exact_text_match() {
        assert!(should_trigger(false, Some("!stats"), "!stats"));
        assert!(!should_trigger(false, Some("!stats "), "!stats"));
        assert!(!should_trigger(false, Some("!Stats"), "!stats"));
        assert!(!should_trigger(false, Some("please !stats"), "!stats"));
        assert!(!should_trigger(false, None, "!stats"));
    }

    #[test]
    fn authorization_ignores_non_private_and_not_allowed() {
        let allowed: HashSet<i64> = [100].into_iter().collect();

        assert!(!should_handle_chat(false, 100, &allowed));
        assert!(!should_handle_chat(true, 101, &allowed));
        assert!(should_handle_chat(true, 100, &allowed));
    }

    #[test]
    fn rate_limiter_enforces_limit() {
        let mut limiter = RateLimiter::new(2);
        assert!(limiter.allow(1, 10));
        assert!(limiter.allow(1, 20));
        assert!(!limiter.allow(1, 30));
        assert!(limiter.allow(1, 71));
    }

    #[test]
    fn rate_limiter_tracks_chats_independently() {
        let mut limiter = RateLimiter::new(1);
        assert!(limiter.allow(1, 10));
        assert!(limiter.allow(2, 10));
        assert!(!limiter.allow(1, 11));
    }

    #[test]
    fn report_html_lists_fields_in_order() {
        let snapshot = Snapshot {
            memory: Some(MemoryStat {
                total_bytes: 8_589_934_592,
                available_bytes: 4_294_967_296,
                used_bytes: 4_294_967_296,
                used_percent: 50.0,
            }),
            cpu_percent: Some(23.4),
            disk: None,
            hostname: "box1".to_string(),
            uptime_seconds: 90_000,
            version: "0.1.0".to_string(),
            platform: "linux-x86_64".to_string(),
        };

        let html = report_html(&render(&snapshot));
        assert!(html.starts_with("<b>System Statistics!</b>\nBox1 (@box1)"));
        assert!(html.contains("Total Memory: <code>8.0GiB</code>"));
        assert!(html.contains("Disk Used: <code>n/a</code>"));
        assert!(html.contains("Uptime: <code>1d 1h</code>"));

        let total_pos = html.find("Total Memory").unwrap();
        let cpu_pos = html.find("CPU Usage").unwrap();
        let uptime_pos = html.find("Uptime").unwrap();
        assert!(total_pos < cpu_pos && cpu_pos < uptime_pos);
    }
}
