// ==========================================
// 甜甜圈成本核算系统 - 重算管线
// ==========================================
// 红线: 纯算术，永不失败；步骤顺序不可调换（后步依赖前步）
// 红线: 结果在一次镜像锁持有期内整体写入，
//       观察者不会看到新旧混合的派生值
// ==========================================

use super::{AppStateService, StateInner};
use crate::i18n::t;
use rust_decimal::Decimal;

impl AppStateService {
    /// 对当前镜像做一次全量重算（调用方已持有镜像锁）
    ///
    /// 步骤:
    /// 1. 逐行算成本与校验文案
    /// 2. 汇总面团总成本
    /// 3. 逐行算占比
    /// 4. 依链条推导单个成本/售价/利润各项
    /// 5. 整体覆盖 CalculationOutput
    pub(crate) fn recalculate_locked(&self, inner: &mut StateInner) {
        // 1. 行成本 + 校验文案
        for item in inner.resep_items.iter_mut() {
            item.modal_bahan = self.cost_engine.modal_bahan(
                item.jumlah_dipakai,
                item.netto_per_pack,
                item.harga_per_pack,
            );
            item.validation_message = Self::validate_item(
                item.netto_per_pack,
                item.harga_per_pack,
                item.jumlah_dipakai,
            );
        }

        // 2. 面团总成本
        let total_modal_adonan: Decimal = inner.resep_items.iter().map(|i| i.modal_bahan).sum();

        // 3. 行占比（总成本为 0 时全部记 0）
        for item in inner.resep_items.iter_mut() {
            item.kontribusi_persen = if total_modal_adonan > Decimal::ZERO {
                item.modal_bahan / total_modal_adonan * Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            };
        }

        // 4. 推导链
        let setting = &inner.setting;
        let hpp_donat = self
            .cost_engine
            .hpp_donat(total_modal_adonan, setting.jumlah_donat_dihasilkan);
        let total_topping = self.cost_engine.total_topping(&inner.toppings);
        let hpp_final = self.cost_engine.hpp_final(hpp_donat, total_topping);

        let produksi_efektif = self
            .production_engine
            .produksi_efektif(setting.jumlah_donat_dihasilkan, setting.waste_persen);
        let hpp_setelah_waste = self
            .production_engine
            .hpp_setelah_waste(total_modal_adonan, produksi_efektif);

        let harga_jual = self
            .profit_engine
            .harga_jual(hpp_final, setting.target_profit_persen);
        let profit_per_donat = self.profit_engine.profit_per_donat(harga_jual, hpp_final);
        let total_profit = self
            .profit_engine
            .total_profit(profit_per_donat, produksi_efektif);
        let estimasi_bulanan = self
            .profit_engine
            .estimasi_bulanan(total_profit, setting.hari_produksi_per_bulan);

        // 5. 整体覆盖
        inner.calculation = crate::domain::CalculationOutput {
            total_modal_adonan,
            hpp_donat,
            total_topping,
            hpp_final,
            produksi_efektif,
            hpp_setelah_waste,
            harga_jual,
            profit_per_donat,
            total_profit,
            estimasi_harian: total_profit,
            estimasi_bulanan,
        };
    }

    /// 行级校验文案（顺序: 净含量 -> 价格 -> 用量）
    fn validate_item(netto: Decimal, harga: Decimal, jumlah: Decimal) -> String {
        if netto <= Decimal::ZERO {
            t("validation.netto_invalid")
        } else if harga < Decimal::ZERO {
            t("validation.harga_invalid")
        } else if jumlah <= Decimal::ZERO {
            t("validation.jumlah_empty")
        } else {
            t("validation.ok")
        }
    }
}
