// ==========================================
// 甜甜圈成本核算系统 - 成本/产量/利润计算引擎
// ==========================================
// 红线: 全部使用十进制精确运算（rust_decimal），禁止二进制浮点
// 红线: 非法操作数（<=0）一律按零成本处理，不抛错
// 业务规则: 售价向上取整到百位（当地货币报价习惯）
// ==========================================

use crate::domain::{ResepItem, Topping};
use rust_decimal::Decimal;

/// 0.99 —— 损耗率上限（封顶 99%，避免下游除数趋零）
fn max_waste_ratio() -> Decimal {
    Decimal::new(99, 2)
}

// ==========================================
// CostEngine - 成本计算
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CostEngine;

impl CostEngine {
    pub fn new() -> Self {
        Self
    }

    /// 单行原料成本: (用量 / 每包净含量) * 每包价格
    ///
    /// 任一操作数 <= 0 时返回 0（净含量非法视为零成本行，而非除零错误）
    pub fn modal_bahan(&self, jumlah_dipakai: Decimal, netto_per_pack: Decimal, harga_per_pack: Decimal) -> Decimal {
        if jumlah_dipakai <= Decimal::ZERO
            || netto_per_pack <= Decimal::ZERO
            || harga_per_pack <= Decimal::ZERO
        {
            return Decimal::ZERO;
        }

        jumlah_dipakai / netto_per_pack * harga_per_pack
    }

    /// 面团总成本: 当前变体所有用量行成本之和
    pub fn total_modal_adonan(&self, resep_items: &[ResepItem]) -> Decimal {
        resep_items
            .iter()
            .map(|item| self.modal_bahan(item.jumlah_dipakai, item.netto_per_pack, item.harga_per_pack))
            .sum()
    }

    /// 单个 HPP（未计配料）: 总成本 / 批产量
    pub fn hpp_donat(&self, total_modal_adonan: Decimal, jumlah_donat_dihasilkan: Decimal) -> Decimal {
        if total_modal_adonan <= Decimal::ZERO || jumlah_donat_dihasilkan <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        total_modal_adonan / jumlah_donat_dihasilkan
    }

    /// 激活配料成本合计（未激活不计，负值按 0 计）
    pub fn total_topping(&self, toppings: &[Topping]) -> Decimal {
        toppings
            .iter()
            .filter(|topping| topping.is_active)
            .map(|topping| {
                if topping.biaya_per_donat < Decimal::ZERO {
                    Decimal::ZERO
                } else {
                    topping.biaya_per_donat
                }
            })
            .sum()
    }

    /// 最终单个 HPP: max(hpp,0) + max(topping,0)
    pub fn hpp_final(&self, hpp_donat: Decimal, total_topping: Decimal) -> Decimal {
        let hpp_dasar = hpp_donat.max(Decimal::ZERO);
        let topping = total_topping.max(Decimal::ZERO);
        hpp_dasar + topping
    }
}

// ==========================================
// ProductionEngine - 产量计算
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ProductionEngine;

impl ProductionEngine {
    pub fn new() -> Self {
        Self
    }

    /// 有效产量: 批产量 * (1 - clamp(损耗率/100, 0, 0.99))
    pub fn produksi_efektif(&self, jumlah_donat_dihasilkan: Decimal, waste_persen: Decimal) -> Decimal {
        if jumlah_donat_dihasilkan <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let waste_ratio = (waste_persen / Decimal::ONE_HUNDRED)
            .clamp(Decimal::ZERO, max_waste_ratio());
        jumlah_donat_dihasilkan * (Decimal::ONE - waste_ratio)
    }

    /// 折算损耗后的单个成本: 总成本 / 有效产量
    pub fn hpp_setelah_waste(&self, total_modal_adonan: Decimal, produksi_efektif: Decimal) -> Decimal {
        if total_modal_adonan <= Decimal::ZERO || produksi_efektif <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        total_modal_adonan / produksi_efektif
    }
}

// ==========================================
// ProfitEngine - 利润计算
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ProfitEngine;

impl ProfitEngine {
    pub fn new() -> Self {
        Self
    }

    /// 建议售价: hpp_final / (1 - 目标利润率/100)，向上取整到百位
    ///
    /// 目标利润率 >= 100% 不可行（分母 <= 0），返回 0
    pub fn harga_jual(&self, hpp_final: Decimal, target_profit_persen: Decimal) -> Decimal {
        if hpp_final <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let denominator = Decimal::ONE - target_profit_persen / Decimal::ONE_HUNDRED;
        if denominator <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        self.round_up_to_hundreds(hpp_final / denominator)
    }

    /// 向上取整到百位: ceil(x/100)*100（精确十进制，不走浮点）
    pub fn round_up_to_hundreds(&self, value: Decimal) -> Decimal {
        if value <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        (value / Decimal::ONE_HUNDRED).ceil() * Decimal::ONE_HUNDRED
    }

    /// 单个利润: 售价 - hpp_final（不可行时可为负，不截断）
    pub fn profit_per_donat(&self, harga_jual: Decimal, hpp_final: Decimal) -> Decimal {
        harga_jual - hpp_final
    }

    /// 整批利润: 单个利润 * 有效产量（任一 <= 0 则为 0）
    pub fn total_profit(&self, profit_per_donat: Decimal, produksi_efektif: Decimal) -> Decimal {
        if profit_per_donat <= Decimal::ZERO || produksi_efektif <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        profit_per_donat * produksi_efektif
    }

    /// 月利润估算: 整批利润 * 每月生产天数（任一 <= 0 则为 0）
    pub fn estimasi_bulanan(&self, total_profit: Decimal, hari_produksi_per_bulan: i64) -> Decimal {
        if total_profit <= Decimal::ZERO || hari_produksi_per_bulan <= 0 {
            return Decimal::ZERO;
        }

        total_profit * Decimal::from(hari_produksi_per_bulan)
    }
}
