// ==========================================
// 甜甜圈成本核算系统 - 输入规范化
// ==========================================
// 职责: 把任意输入收敛到合法域；所有函数幂等
// 约定: 状态引擎在写入内存镜像与落库之前统一调用，
//       矫正发生在任何通知之前，观察者只见合法值
// ==========================================

use crate::domain::Satuan;
use rust_decimal::Decimal;

/// 名称规范化: trim 后为空则回退占位名
pub fn normalize_name(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// 单位规范化: 非法输入回退 gram
pub fn normalize_satuan(value: &str) -> Satuan {
    Satuan::parse(value)
}

/// 负值归零
pub fn clamp_non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// 非正值回退给定默认值
pub fn clamp_positive(value: Decimal, fallback: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        fallback
    } else {
        value
    }
}

/// 区间钳制（含端点）
pub fn clamp(value: Decimal, min: Decimal, max: Decimal) -> Decimal {
    value.clamp(min, max)
}

/// 整数区间钳制（含端点）
pub fn clamp_i64(value: i64, min: i64, max: i64) -> i64 {
    value.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Tepung ", "Bahan Baru"), "Tepung");
        assert_eq!(normalize_name("   ", "Bahan Baru"), "Bahan Baru");
        assert_eq!(normalize_name("", "Bahan Baru"), "Bahan Baru");
    }

    #[test]
    fn test_normalize_satuan() {
        assert_eq!(normalize_satuan(" KG "), Satuan::Kg);
        assert_eq!(normalize_satuan("ons"), Satuan::Gram);
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(clamp_non_negative(Decimal::from(-5)), Decimal::ZERO);
        assert_eq!(clamp_non_negative(Decimal::from(5)), Decimal::from(5));
    }

    #[test]
    fn test_clamp_positive() {
        assert_eq!(
            clamp_positive(Decimal::ZERO, Decimal::from(1000)),
            Decimal::from(1000)
        );
        assert_eq!(
            clamp_positive(Decimal::from(-3), Decimal::from(1000)),
            Decimal::from(1000)
        );
        assert_eq!(
            clamp_positive(Decimal::from(250), Decimal::from(1000)),
            Decimal::from(250)
        );
    }

    #[test]
    fn test_clamp_ranges() {
        assert_eq!(
            clamp(Decimal::from(120), Decimal::ZERO, Decimal::from(99)),
            Decimal::from(99)
        );
        assert_eq!(clamp_i64(0, 1, 31), 1);
        assert_eq!(clamp_i64(40, 1, 31), 31);
        assert_eq!(clamp_i64(26, 1, 31), 26);
    }

    #[test]
    fn test_idempotence() {
        let once = clamp(Decimal::from(150), Decimal::ZERO, Decimal::from(99));
        assert_eq!(clamp(once, Decimal::ZERO, Decimal::from(99)), once);

        let name = normalize_name("  Gula  ", "Bahan Baru");
        assert_eq!(normalize_name(&name, "Bahan Baru"), name);
    }
}
