//! Aggregate result buckets and end-of-run reduction.

use crate::core::outcome::{ErrorKind, TaskStatus};
use crate::exit_codes;

/// Overall batch status after reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overall {
    /// Every account succeeded or was intentionally skipped.
    Clean,
    /// At least one account failed or errored.
    Attention,
    /// No failures, but at least one account waits on a manual captcha.
    CaptchaPending,
}

impl Overall {
    /// Status code pushed to the notifier; also the process exit code.
    pub fn code(self) -> i32 {
        match self {
            Self::Clean => exit_codes::OK,
            Self::Attention => exit_codes::ATTENTION,
            Self::CaptchaPending => exit_codes::CAPTCHA_PENDING,
        }
    }
}

/// Per-outcome buckets accumulated over one batch run.
///
/// Accumulation is strictly sequential; each processed file lands in exactly
/// one bucket, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateReport {
    /// Number of config files the batch was started with.
    pub total: usize,
    pub success: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
    pub captcha: Vec<String>,
    /// Entries formatted as `"<file>: <error label>"`.
    pub errors: Vec<String>,
}

impl AggregateReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Record a classified status code outcome.
    pub fn record_status(&mut self, file_name: &str, status: TaskStatus) {
        let bucket = match status {
            TaskStatus::Success => &mut self.success,
            TaskStatus::Skipped => &mut self.skipped,
            TaskStatus::Captcha => &mut self.captcha,
            TaskStatus::Failed(_) => &mut self.failed,
        };
        bucket.push(file_name.to_string());
    }

    /// Record a tagged engine error.
    pub fn record_error(&mut self, file_name: &str, kind: ErrorKind) {
        self.errors.push(format!("{file_name}: {}", kind.label()));
    }

    /// Reduce the buckets to the overall batch status.
    ///
    /// Errors and failures dominate; captcha-only runs are partial, not
    /// failed.
    pub fn overall(&self) -> Overall {
        if !self.errors.is_empty() || !self.failed.is_empty() {
            Overall::Attention
        } else if !self.captcha.is_empty() {
            Overall::CaptchaPending
        } else {
            Overall::Clean
        }
    }

    /// Render the end-of-run summary handed to the notifier.
    ///
    /// Counts first, then one list line per non-empty bucket. The text stays
    /// in the product's original language.
    pub fn render(&self) -> String {
        let mut out = format!(
            "🏁 任务执行完成\n\
             📋 配置文件总数: {}\n\
             ✅ 成功: {}\n\
             ⚠️ 跳过: {}\n\
             ❌ 失败: {}\n\
             🔒 需要验证码: {}\n\
             ❗ 错误: {}\n",
            self.total,
            self.success.len(),
            self.skipped.len(),
            self.failed.len(),
            self.captcha.len(),
            self.errors.len(),
        );
        if !self.success.is_empty() {
            out.push_str(&format!("\n✅ 成功列表: {}\n", self.success.join(", ")));
        }
        if !self.skipped.is_empty() {
            out.push_str(&format!("\n⚠️ 跳过列表: {}\n", self.skipped.join(", ")));
        }
        if !self.failed.is_empty() {
            out.push_str(&format!("\n❌ 失败列表: {}\n", self.failed.join(", ")));
        }
        if !self.captcha.is_empty() {
            out.push_str(&format!("\n🔒 验证码列表: {}\n", self.captcha.join(", ")));
        }
        if !self.errors.is_empty() {
            out.push_str(&format!("\n❗ 错误列表:\n - {}", self.errors.join("\n - ")));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_prefers_attention_over_captcha() {
        let mut report = AggregateReport::new(2);
        report.record_status("a.yml", TaskStatus::Captcha);
        report.record_status("b.yml", TaskStatus::Failed(9));
        assert_eq!(report.overall(), Overall::Attention);
        assert_eq!(report.overall().code(), exit_codes::ATTENTION);
    }

    #[test]
    fn overall_captcha_pending_when_only_captcha() {
        let mut report = AggregateReport::new(2);
        report.record_status("a.yml", TaskStatus::Success);
        report.record_status("b.yml", TaskStatus::Captcha);
        assert_eq!(report.overall(), Overall::CaptchaPending);
        assert_eq!(report.overall().code(), exit_codes::CAPTCHA_PENDING);
    }

    #[test]
    fn overall_clean_for_success_and_skips() {
        let mut report = AggregateReport::new(2);
        report.record_status("a.yml", TaskStatus::Success);
        report.record_status("b.yml", TaskStatus::Skipped);
        assert_eq!(report.overall(), Overall::Clean);
        assert_eq!(report.overall().code(), exit_codes::OK);
    }

    #[test]
    fn errors_alone_are_attention() {
        let mut report = AggregateReport::new(1);
        report.record_error("a.yml", ErrorKind::Stoken);
        assert_eq!(report.errors, vec!["a.yml: Stoken错误".to_string()]);
        assert_eq!(report.overall(), Overall::Attention);
    }

    #[test]
    fn render_lists_only_non_empty_buckets() {
        let mut report = AggregateReport::new(3);
        report.record_status("a.yml", TaskStatus::Success);
        report.record_status("b.yml", TaskStatus::Captcha);
        report.record_error("c.yml", ErrorKind::Cookie);

        let text = report.render();
        assert!(text.contains("配置文件总数: 3"));
        assert!(text.contains("成功列表: a.yml"));
        assert!(text.contains("验证码列表: b.yml"));
        assert!(text.contains(" - c.yml: Cookie错误"));
        assert!(!text.contains("跳过列表"));
        assert!(!text.contains("失败列表"));
    }
}
