// ==========================================
// 甜甜圈成本核算系统 - 配料领域模型
// ==========================================
// 对齐: Topping 表
// 说明: 配料与配方变体无关，全局共享；仅激活的配料计入成本
// ==========================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topping {
    pub id: i64,
    pub nama_topping: String,     // 配料名称（非空）
    pub biaya_per_donat: Decimal, // 每个成品的配料成本（>=0）
    pub is_active: bool,          // 仅激活时计入成本
}

impl Topping {
    /// 新建配料的占位默认值
    pub fn baru() -> Self {
        Self {
            id: 0,
            nama_topping: "Topping Baru".to_string(),
            biaya_per_donat: Decimal::ZERO,
            is_active: true,
        }
    }
}
