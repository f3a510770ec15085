// ==========================================
// 甜甜圈成本核算系统 - 计算输出模型
// ==========================================
// 说明: 纯派生输出，不持久化；任何相关输入变化后整体重算覆盖
// 不变量: 观察者看到的始终是一次重算的完整结果，不出现新旧混合
// ==========================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationOutput {
    pub total_modal_adonan: Decimal, // 面团（整批）总成本
    pub hpp_donat: Decimal,          // 单个 HPP（未计配料）
    pub total_topping: Decimal,      // 激活配料成本合计
    pub hpp_final: Decimal,          // 最终单个 HPP（含配料）
    pub produksi_efektif: Decimal,   // 扣除损耗后的有效产量
    pub hpp_setelah_waste: Decimal,  // 按有效产量折算的单个成本
    pub harga_jual: Decimal,         // 建议售价（向上取整到百位）
    pub profit_per_donat: Decimal,   // 单个利润（可为负，不截断）
    pub total_profit: Decimal,       // 整批利润
    pub estimasi_harian: Decimal,    // 日利润估算（= 整批利润）
    pub estimasi_bulanan: Decimal,   // 月利润估算
}
