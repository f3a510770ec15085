// ==========================================
// 甜甜圈成本核算系统 - 应用状态指示器
// ==========================================
// 说明: 面向 UI 的单例指示器，反映最近一次持久化操作的结果
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppStatus {
    pub message: String,
    pub is_busy: bool,
    pub is_error: bool,
    pub last_updated: DateTime<Utc>,
}

impl Default for AppStatus {
    fn default() -> Self {
        Self {
            message: crate::i18n::t("status.ready"),
            is_busy: false,
            is_error: false,
            last_updated: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_ready() {
        let status = AppStatus::default();
        assert_eq!(status.message, "Siap digunakan.");
        assert!(!status.is_busy);
        assert!(!status.is_error);
    }
}
