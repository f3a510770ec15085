// ==========================================
// 甜甜圈成本核算系统 - 展示辅助
// ==========================================
// 说明: 印尼盾格式化（id-ID 习惯: Rp 前缀、千分位用句点、无小数）
// ==========================================

use rust_decimal::{Decimal, RoundingStrategy};

/// 格式化为印尼盾文案，如 1300000 -> "Rp1.300.000"
pub fn format_rupiah(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded < Decimal::ZERO;
    let digits = rounded.abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if negative {
        format!("-Rp{grouped}")
    } else {
        format!("Rp{grouped}")
    }
}
