// ==========================================
// 甜甜圈成本核算系统 - 应用状态引擎（核心）
// ==========================================
// 职责: 持有全部实体的权威内存镜像，保证派生输出
//       始终与最新规范化输入一致，每个被接受的变更
//       最终都持久化落库
// 并发: 镜像在 std Mutex 后，锁从不跨越 .await；
//       外部编辑经类型化编辑枚举进入，矫正写与外部
//       编辑是两条独立调用路径，不存在通知回环
// ==========================================

mod recalc;
mod saver;
mod variants;

pub use saver::{DebouncedSaver, SaveKey};

use crate::domain::{
    AppStatus, Bahan, CalculationOutput, ProduksiSetting, Resep, ResepItem, ResepVarian, Satuan,
    Topping,
};
use crate::engine::config::StateEngineConfig;
use crate::engine::costing::{CostEngine, ProductionEngine, ProfitEngine};
use crate::engine::error::{StateError, StateResult};
use crate::engine::events::{OptionalEventPublisher, StateEvent, StateEventKind};
use crate::engine::normalizer;
use crate::repository::{
    BahanRepository, ProductionDataCoordinator, ProduksiSettingRepository, ResepRepository,
    ToppingRepository, VarianRepository,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// 类型化编辑枚举
// ==========================================
// 外部编辑的唯一入口；按字段区分，不相关字段不触发重算

#[derive(Debug, Clone)]
pub enum BahanEdit {
    NamaBahan(String),
    Satuan(String),
    NettoPerPack(Decimal),
    HargaPerPack(Decimal),
}

#[derive(Debug, Clone)]
pub enum ResepEdit {
    JumlahDipakai(Decimal),
}

#[derive(Debug, Clone)]
pub enum ToppingEdit {
    Nama(String),
    BiayaPerDonat(Decimal),
    IsActive(bool),
}

#[derive(Debug, Clone)]
pub enum ProduksiSettingEdit {
    JumlahDonatDihasilkan(Decimal),
    BeratPerDonat(Decimal),
    WastePersen(Decimal),
    TargetProfitPersen(Decimal),
    HariProduksiPerBulan(i64),
}

// ==========================================
// 内存镜像
// ==========================================
pub(crate) struct StateInner {
    pub(crate) bahan_list: Vec<Bahan>,
    /// 仅激活变体的用量行
    pub(crate) resep_items: Vec<ResepItem>,
    pub(crate) varian_list: Vec<ResepVarian>,
    pub(crate) toppings: Vec<Topping>,
    pub(crate) setting: ProduksiSetting,
    pub(crate) varian_aktif_id: i64,
    pub(crate) calculation: CalculationOutput,
}

impl StateInner {
    fn empty() -> Self {
        Self {
            bahan_list: Vec::new(),
            resep_items: Vec::new(),
            varian_list: Vec::new(),
            toppings: Vec::new(),
            setting: ProduksiSetting::default(),
            varian_aktif_id: 0,
            calculation: CalculationOutput::default(),
        }
    }
}

// ==========================================
// AppStateService
// ==========================================
pub struct AppStateService {
    pub(crate) bahan_repo: Arc<BahanRepository>,
    pub(crate) resep_repo: Arc<ResepRepository>,
    pub(crate) varian_repo: Arc<VarianRepository>,
    pub(crate) topping_repo: Arc<ToppingRepository>,
    pub(crate) setting_repo: Arc<ProduksiSettingRepository>,
    pub(crate) coordinator: Arc<ProductionDataCoordinator>,

    pub(crate) cost_engine: CostEngine,
    pub(crate) production_engine: ProductionEngine,
    pub(crate) profit_engine: ProfitEngine,

    pub(crate) config: StateEngineConfig,
    pub(crate) inner: Arc<Mutex<StateInner>>,
    pub(crate) status: Arc<Mutex<AppStatus>>,
    pub(crate) saver: DebouncedSaver,
    pub(crate) events: OptionalEventPublisher,

    initialized: AtomicBool,
    pub(crate) disposed: Arc<AtomicBool>,
    /// 变体切换的瞬态重入保护
    pub(crate) switching_variant: AtomicBool,
}

impl AppStateService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bahan_repo: Arc<BahanRepository>,
        resep_repo: Arc<ResepRepository>,
        varian_repo: Arc<VarianRepository>,
        topping_repo: Arc<ToppingRepository>,
        setting_repo: Arc<ProduksiSettingRepository>,
        coordinator: Arc<ProductionDataCoordinator>,
        config: StateEngineConfig,
        events: OptionalEventPublisher,
    ) -> Self {
        let status = Arc::new(Mutex::new(AppStatus::default()));
        let disposed = Arc::new(AtomicBool::new(false));
        let saver = DebouncedSaver::new(
            config.debounce_delay_ms,
            status.clone(),
            events.clone(),
            disposed.clone(),
        );

        Self {
            bahan_repo,
            resep_repo,
            varian_repo,
            topping_repo,
            setting_repo,
            coordinator,
            cost_engine: CostEngine::new(),
            production_engine: ProductionEngine::new(),
            profit_engine: ProfitEngine::new(),
            config,
            inner: Arc::new(Mutex::new(StateInner::empty())),
            status,
            saver,
            events,
            initialized: AtomicBool::new(false),
            disposed,
            switching_variant: AtomicBool::new(false),
        }
    }

    // ===== 锁辅助（镜像锁从不跨越 .await）=====

    pub(crate) fn lock_inner(&self) -> MutexGuard<StateInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_status(&self) -> MutexGuard<AppStatus> {
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn ensure_ready(&self) -> StateResult<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(StateError::Disposed);
        }
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(StateError::NotInitialized);
        }
        Ok(())
    }

    // ==========================================
    // 生命周期
    // ==========================================

    /// 初始化: 全量加载 -> 保证默认变体 -> 回填用量行 -> 首次重算
    ///
    /// 幂等（重复调用为空操作）；存储失败按启动致命错误向上传播
    pub async fn initialize(&self) -> StateResult<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(StateError::Disposed);
        }
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let bahan_list = self.bahan_repo.list_all()?;
        let mut varian_list = self.varian_repo.list_all()?;
        let toppings = self.topping_repo.list_all()?;
        let setting = self.setting_repo.get_or_create()?;

        // 初始化器已保证非空 + 恰好一个激活；这里兜底空库的情形
        if varian_list.is_empty() {
            let created = self.varian_repo.insert(&ResepVarian {
                id: 0,
                nama_varian: self.config.default_variant_name.clone(),
                is_active: true,
            })?;
            self.varian_repo.set_active(created.id)?;
            varian_list = self.varian_repo.list_all()?;
        }

        let varian_aktif_id = varian_list
            .iter()
            .find(|v| v.is_active)
            .map(|v| v.id)
            .unwrap_or_else(|| varian_list[0].id);

        let resep_items = self.load_varian_items(varian_aktif_id, &bahan_list).await?;

        {
            let mut inner = self.lock_inner();
            inner.bahan_list = bahan_list;
            inner.varian_list = varian_list;
            inner.toppings = toppings;
            inner.setting = setting;
            inner.varian_aktif_id = varian_aktif_id;
            inner.resep_items = resep_items;
            self.recalculate_locked(&mut inner);
        }

        {
            let mut status = self.lock_status();
            *status = AppStatus::default();
        }

        tracing::info!(varian_aktif_id, "状态引擎初始化完成");
        self.events
            .publish(StateEvent::new(StateEventKind::Initialized, None));
        Ok(())
    }

    /// 释放: 取消全部未触发排程，后续操作一律拒绝
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.saver.dispose();
        tracing::info!("状态引擎已释放");
    }

    // ==========================================
    // 原料操作
    // ==========================================

    /// 新增原料（占位默认值）+ 每个变体一条 0 用量行（单事务）
    pub async fn tambah_bahan(&self) -> StateResult<Bahan> {
        self.ensure_ready()?;

        let bahan = Bahan::baru();
        let varian_ids: Vec<i64> = {
            let inner = self.lock_inner();
            inner.varian_list.iter().map(|v| v.id).collect()
        };

        let coordinator = self.coordinator.clone();
        let bahan_for_write = bahan.clone();
        let (inserted, rows) = self
            .saver
            .run_immediate(move || {
                coordinator.add_bahan_with_resep_rows(&bahan_for_write, &varian_ids, Decimal::ZERO)
            })
            .await?;

        {
            let mut inner = self.lock_inner();
            inner.bahan_list.push(inserted.clone());
            let aktif = inner.varian_aktif_id;
            if let Some(row) = rows.iter().find(|r| r.varian_id == aktif) {
                inner.resep_items.push(ResepItem::from_parts(row, &inserted));
            }
            self.recalculate_locked(&mut inner);
        }

        self.publish_recalculated();
        Ok(inserted)
    }

    /// 删除原料及其所有变体下的用量行（单事务）
    pub async fn hapus_bahan(&self, bahan_id: i64) -> StateResult<()> {
        self.ensure_ready()?;

        {
            let inner = self.lock_inner();
            if !inner.bahan_list.iter().any(|b| b.id == bahan_id) {
                return Err(StateError::BahanNotFound(bahan_id));
            }
        }

        let coordinator = self.coordinator.clone();
        self.saver
            .run_immediate(move || coordinator.delete_bahan_and_resep_rows(bahan_id))
            .await?;

        {
            let mut inner = self.lock_inner();
            inner.bahan_list.retain(|b| b.id != bahan_id);
            inner.resep_items.retain(|r| r.bahan_id != bahan_id);
            self.recalculate_locked(&mut inner);
        }

        self.publish_recalculated();
        Ok(())
    }

    // ==========================================
    // 配料操作（与变体无关）
    // ==========================================

    pub async fn tambah_topping(&self) -> StateResult<Topping> {
        self.ensure_ready()?;

        let topping = Topping::baru();
        let repo = self.topping_repo.clone();
        let topping_for_write = topping.clone();
        let inserted = self
            .saver
            .run_immediate(move || repo.insert(&topping_for_write))
            .await?;

        {
            let mut inner = self.lock_inner();
            inner.toppings.push(inserted.clone());
            self.recalculate_locked(&mut inner);
        }

        self.publish_recalculated();
        Ok(inserted)
    }

    pub async fn hapus_topping(&self, topping_id: i64) -> StateResult<()> {
        self.ensure_ready()?;

        let repo = self.topping_repo.clone();
        self.saver
            .run_immediate(move || repo.delete(topping_id))
            .await?;

        {
            let mut inner = self.lock_inner();
            inner.toppings.retain(|t| t.id != topping_id);
            self.recalculate_locked(&mut inner);
        }

        self.publish_recalculated();
        Ok(())
    }

    // ==========================================
    // 字段编辑（防抖持久化）
    // ==========================================

    /// 编辑原料字段: 规范化 -> 同步镜像与冗余行 -> 重算 -> 排程落库
    pub fn edit_bahan(&self, bahan_id: i64, edit: BahanEdit) -> StateResult<()> {
        self.ensure_ready()?;

        let affects_output;
        let updated: Bahan;
        {
            let mut inner = self.lock_inner();
            let bahan = inner
                .bahan_list
                .iter_mut()
                .find(|b| b.id == bahan_id)
                .ok_or(StateError::BahanNotFound(bahan_id))?;

            affects_output = matches!(
                edit,
                BahanEdit::NettoPerPack(_) | BahanEdit::HargaPerPack(_)
            );

            match edit {
                BahanEdit::NamaBahan(value) => {
                    bahan.nama_bahan = normalizer::normalize_name(&value, "Bahan Baru");
                }
                BahanEdit::Satuan(value) => {
                    bahan.satuan = normalizer::normalize_satuan(&value);
                }
                BahanEdit::NettoPerPack(value) => {
                    bahan.netto_per_pack =
                        normalizer::clamp_positive(value, Decimal::from(1000));
                }
                BahanEdit::HargaPerPack(value) => {
                    bahan.harga_per_pack = normalizer::clamp_non_negative(value);
                }
            }
            updated = bahan.clone();

            // 冗余字段同步到激活变体的用量行
            for item in inner.resep_items.iter_mut().filter(|r| r.bahan_id == bahan_id) {
                item.nama_bahan = updated.nama_bahan.clone();
                item.satuan = updated.satuan;
                item.netto_per_pack = updated.netto_per_pack;
                item.harga_per_pack = updated.harga_per_pack;
            }

            if affects_output {
                self.recalculate_locked(&mut inner);
            }
        }

        if affects_output {
            self.publish_recalculated();
        }

        let repo = self.bahan_repo.clone();
        self.saver
            .schedule(SaveKey::Bahan(bahan_id), move || repo.update(&updated));
        Ok(())
    }

    /// 编辑用量行
    pub fn edit_resep(&self, resep_id: i64, edit: ResepEdit) -> StateResult<()> {
        self.ensure_ready()?;

        let jumlah: Decimal;
        {
            let mut inner = self.lock_inner();
            let item = inner
                .resep_items
                .iter_mut()
                .find(|r| r.id == resep_id)
                .ok_or_else(|| StateError::Repository(crate::repository::RepositoryError::NotFound {
                    entity: "Resep".to_string(),
                    id: resep_id.to_string(),
                }))?;

            match edit {
                ResepEdit::JumlahDipakai(value) => {
                    item.jumlah_dipakai = normalizer::clamp_non_negative(value);
                    jumlah = item.jumlah_dipakai;
                }
            }
            self.recalculate_locked(&mut inner);
        }

        self.publish_recalculated();

        let repo = self.resep_repo.clone();
        self.saver.schedule(SaveKey::Resep(resep_id), move || {
            repo.update_jumlah_dipakai(resep_id, jumlah)
        });
        Ok(())
    }

    /// 编辑配料字段
    pub fn edit_topping(&self, topping_id: i64, edit: ToppingEdit) -> StateResult<()> {
        self.ensure_ready()?;

        let affects_output;
        let updated: Topping;
        {
            let mut inner = self.lock_inner();
            let topping = inner
                .toppings
                .iter_mut()
                .find(|t| t.id == topping_id)
                .ok_or_else(|| StateError::Repository(crate::repository::RepositoryError::NotFound {
                    entity: "Topping".to_string(),
                    id: topping_id.to_string(),
                }))?;

            affects_output = !matches!(edit, ToppingEdit::Nama(_));

            match edit {
                ToppingEdit::Nama(value) => {
                    topping.nama_topping = normalizer::normalize_name(&value, "Topping Baru");
                }
                ToppingEdit::BiayaPerDonat(value) => {
                    topping.biaya_per_donat = normalizer::clamp_non_negative(value);
                }
                ToppingEdit::IsActive(value) => {
                    topping.is_active = value;
                }
            }
            updated = topping.clone();

            if affects_output {
                self.recalculate_locked(&mut inner);
            }
        }

        if affects_output {
            self.publish_recalculated();
        }

        let repo = self.topping_repo.clone();
        self.saver
            .schedule(SaveKey::Topping(topping_id), move || repo.update(&updated));
        Ok(())
    }

    /// 编辑生产参数（BeratPerDonat 仅展示参考，落库但不触发重算）
    pub fn edit_setting(&self, edit: ProduksiSettingEdit) -> StateResult<()> {
        self.ensure_ready()?;

        let affects_output;
        let updated: ProduksiSetting;
        {
            let mut inner = self.lock_inner();

            affects_output = !matches!(edit, ProduksiSettingEdit::BeratPerDonat(_));

            match edit {
                ProduksiSettingEdit::JumlahDonatDihasilkan(value) => {
                    inner.setting.jumlah_donat_dihasilkan =
                        normalizer::clamp_positive(value, Decimal::ONE);
                }
                ProduksiSettingEdit::BeratPerDonat(value) => {
                    inner.setting.berat_per_donat =
                        normalizer::clamp_positive(value, Decimal::from(50));
                }
                ProduksiSettingEdit::WastePersen(value) => {
                    inner.setting.waste_persen =
                        normalizer::clamp(value, Decimal::ZERO, Decimal::from(99));
                }
                ProduksiSettingEdit::TargetProfitPersen(value) => {
                    inner.setting.target_profit_persen =
                        normalizer::clamp(value, Decimal::ONE, Decimal::from(95));
                }
                ProduksiSettingEdit::HariProduksiPerBulan(value) => {
                    inner.setting.hari_produksi_per_bulan = normalizer::clamp_i64(value, 1, 31);
                }
            }
            updated = inner.setting.clone();

            if affects_output {
                self.recalculate_locked(&mut inner);
            }
        }

        if affects_output {
            self.publish_recalculated();
        }

        let repo = self.setting_repo.clone();
        self.saver
            .schedule(SaveKey::ProduksiSetting, move || repo.update(&updated));
        Ok(())
    }

    // ==========================================
    // 状态指示器
    // ==========================================

    /// 清除错误状态（恢复就绪文案）
    pub fn clear_error_status(&self) {
        let mut status = self.lock_status();
        if status.is_error {
            *status = AppStatus::default();
        }
    }

    pub(crate) fn set_error_status(&self, message: String) {
        let mut status = self.lock_status();
        status.message = message;
        status.is_busy = false;
        status.is_error = true;
        status.last_updated = Utc::now();
    }

    // ==========================================
    // 快照访问器（克隆出一致副本）
    // ==========================================

    pub fn calculation(&self) -> CalculationOutput {
        self.lock_inner().calculation.clone()
    }

    pub fn bahan_items(&self) -> Vec<Bahan> {
        self.lock_inner().bahan_list.clone()
    }

    pub fn resep_items(&self) -> Vec<ResepItem> {
        self.lock_inner().resep_items.clone()
    }

    pub fn varian_items(&self) -> Vec<ResepVarian> {
        self.lock_inner().varian_list.clone()
    }

    pub fn topping_items(&self) -> Vec<Topping> {
        self.lock_inner().toppings.clone()
    }

    pub fn produksi_setting(&self) -> ProduksiSetting {
        self.lock_inner().setting.clone()
    }

    pub fn varian_aktif(&self) -> Option<ResepVarian> {
        let inner = self.lock_inner();
        inner
            .varian_list
            .iter()
            .find(|v| v.id == inner.varian_aktif_id)
            .cloned()
    }

    pub fn status(&self) -> AppStatus {
        self.lock_status().clone()
    }

    /// 在途写计数（测试与关闭前排水用）
    pub fn pending_saves(&self) -> usize {
        self.saver.in_flight_count()
    }

    // ===== 内部辅助 =====

    pub(crate) fn publish_recalculated(&self) {
        self.events
            .publish(StateEvent::new(StateEventKind::Recalculated, None));
    }

    /// 加载指定变体的用量行，缺失的 (原料 x 变体) 组合补 0 用量行
    ///
    /// 回填是落库写，和其余写一样走调度器的写锁
    pub(crate) async fn load_varian_items(
        &self,
        varian_id: i64,
        bahan_list: &[Bahan],
    ) -> StateResult<Vec<ResepItem>> {
        let existing = self.resep_repo.list_by_varian(varian_id)?;

        let missing: Vec<Resep> = bahan_list
            .iter()
            .filter(|b| !existing.iter().any(|r| r.bahan_id == b.id))
            .map(|b| Resep {
                id: 0,
                bahan_id: b.id,
                varian_id,
                jumlah_dipakai: Decimal::ZERO,
            })
            .collect();

        let backfilled = if missing.is_empty() {
            Vec::new()
        } else {
            tracing::debug!(varian_id, count = missing.len(), "回填缺失用量行");
            let repo = self.resep_repo.clone();
            self.saver
                .run_immediate(move || repo.insert_many(&missing))
                .await?
        };

        let mut items = Vec::with_capacity(existing.len() + backfilled.len());
        for resep in existing.iter().chain(backfilled.iter()) {
            if let Some(bahan) = bahan_list.iter().find(|b| b.id == resep.bahan_id) {
                items.push(ResepItem::from_parts(resep, bahan));
            }
        }
        Ok(items)
    }
}

// Satuan 在编辑路径上以字符串进入（UI 下拉框形态）
impl From<Satuan> for BahanEdit {
    fn from(satuan: Satuan) -> Self {
        BahanEdit::Satuan(satuan.as_str().to_string())
    }
}
