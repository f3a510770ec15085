// ==========================================
// 甜甜圈成本核算系统 - 状态引擎配置
// ==========================================
// 说明: 防抖延迟与变体命名策略集中于此，测试可调小延迟
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateEngineConfig {
    /// 防抖延迟（毫秒），同键连续编辑只落一次库
    pub debounce_delay_ms: u64,
    /// 首次初始化时创建的默认变体名
    pub default_variant_name: String,
    /// 复制变体时追加的名称后缀
    pub copy_suffix: String,
}

impl Default for StateEngineConfig {
    fn default() -> Self {
        Self {
            debounce_delay_ms: 250,
            default_variant_name: "Default".to_string(),
            copy_suffix: " Copy".to_string(),
        }
    }
}
