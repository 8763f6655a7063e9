use crate::alerts::batch::{AlertBatch, Level};
use crate::config::ReportConfig;
use chrono::NaiveDateTime;

/// Maximum number of alert lines listed in a single digest message
pub const DIGEST_LIMIT: usize = 5;

/// Timestamp layout used in the summary header
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Marker printed when no warnings or emergencies were raised
pub const NO_ISSUES_MARKER: &str = "✨ 특이사항 없음";

const SUMMARY_TITLE: &str = "📊 원자재/통화 모니터링 요약";
const WARNING_HEADER: &str = "⚠️ 주의 알림";
const EMERGENCY_HEADER: &str = "🚨 긴급 알림";
const DIVIDER_WIDTH: usize = 30;

fn divider() -> String {
    "─".repeat(DIVIDER_WIDTH)
}

/// Format the daily summary message
///
/// The summary carries counts only. Individual alert lines go out in the
/// per-tier digests built by [`format_digest`].
///
/// # Arguments
///
/// * `alerts` - The batch to summarize
/// * `now` - Local time stamped into the header
/// * `report` - Data locations listed in the footer
pub fn format_summary(alerts: &AlertBatch, now: NaiveDateTime, report: &ReportConfig) -> String {
    let total_assets = alerts.count(Level::Level1);
    let warning_count = alerts.count(Level::Level2);
    let emergency_count = alerts.count(Level::Level3);

    let mut message = String::new();
    message.push_str(&format!("{}\n", SUMMARY_TITLE));
    message.push_str(&format!("🕐 {}\n", now.format(TIMESTAMP_FORMAT)));
    message.push_str(&format!("{}\n\n", divider()));

    message.push_str(&format!("✅ 모니터링 자산: {}개\n", total_assets));

    if warning_count > 0 {
        message.push_str(&format!("{}: {}건\n", WARNING_HEADER, warning_count));
    }

    if emergency_count > 0 {
        message.push_str(&format!("{}: {}건\n", EMERGENCY_HEADER, emergency_count));
    }

    if alerts.is_quiet() {
        message.push_str(&format!("{}\n", NO_ISSUES_MARKER));
    }

    message.push_str(&format!("\n{}", divider()));
    message.push_str(&format!("\n📁 상세 데이터: {}", report.data_dir));
    message.push_str(&format!("\n📄 분석 리포트: {}", report.reports_dir));
    message.push_str("\n📊 엑셀 파일 참조");

    message
}

/// Format the digest message for one tier
///
/// Returns `None` for tiers that never get a digest of their own (level 1)
/// and for empty tiers. At most [`DIGEST_LIMIT`] lines are listed; the rest
/// are reported as a count.
pub fn format_digest(alerts: &AlertBatch, level: Level) -> Option<String> {
    let header = match level {
        Level::Level1 => return None,
        Level::Level2 => WARNING_HEADER,
        Level::Level3 => EMERGENCY_HEADER,
    };

    let entries = alerts.entries(level);
    if entries.is_empty() {
        return None;
    }

    let shown: Vec<&str> = entries
        .iter()
        .take(DIGEST_LIMIT)
        .map(String::as_str)
        .collect();
    let mut message = format!("{}\n\n{}", header, shown.join("\n"));

    if entries.len() > DIGEST_LIMIT {
        message.push_str(&format!("\n\n... 외 {}건", entries.len() - DIGEST_LIMIT));
    }

    Some(message)
}

/// Wrap an error description in the system-failure template
pub fn format_error_alert(error_message: &str) -> String {
    format!(
        "🚨 시스템 오류 발생\n\n{}\n\n자세한 내용은 GitHub Actions 로그를 확인하세요.",
        error_message
    )
}
