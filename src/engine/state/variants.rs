// ==========================================
// 甜甜圈成本核算系统 - 变体生命周期
// ==========================================
// 不变量: 变体集合永不为空；任何时刻恰好一个激活
// 不变量: 变体名全局唯一（大小写不敏感），冲突自动加序号
// ==========================================

use super::AppStateService;
use crate::domain::{Resep, ResepVarian};
use crate::engine::error::{StateError, StateResult};
use crate::engine::events::{StateEvent, StateEventKind};
use crate::i18n::t;
use rust_decimal::Decimal;
use std::sync::atomic::Ordering;

impl AppStateService {
    // ==========================================
    // 切换激活变体
    // ==========================================

    /// 激活指定变体并加载其用量行
    ///
    /// 已激活时为空操作；切换进行中的嵌套请求被忽略
    /// （UI 选中绑定与引擎激活通知互相驱动的回环在此截断）
    pub async fn pilih_varian(&self, varian_id: i64) -> StateResult<()> {
        self.ensure_ready()?;

        if self.switching_variant.swap(true, Ordering::SeqCst) {
            tracing::debug!(varian_id, "变体切换进行中，忽略嵌套请求");
            return Ok(());
        }

        let result = self.pilih_varian_inner(varian_id).await;
        self.switching_variant.store(false, Ordering::SeqCst);
        result
    }

    async fn pilih_varian_inner(&self, varian_id: i64) -> StateResult<()> {
        {
            let inner = self.lock_inner();
            if inner.varian_aktif_id == varian_id {
                return Ok(());
            }
            if !inner.varian_list.iter().any(|v| v.id == varian_id) {
                return Err(StateError::VarianNotFound(varian_id));
            }
        }

        let repo = self.varian_repo.clone();
        self.saver
            .run_immediate(move || repo.set_active(varian_id))
            .await?;

        self.activate_in_mirror(varian_id).await?;
        self.publish_recalculated();
        self.events.publish(StateEvent::for_entity(
            StateEventKind::VariantSwitched,
            Some("pilih_varian".to_string()),
            varian_id,
        ));
        Ok(())
    }

    /// 激活态写入镜像: 翻转标志、加载用量行、重算
    async fn activate_in_mirror(&self, varian_id: i64) -> StateResult<()> {
        let bahan_list = {
            let inner = self.lock_inner();
            inner.bahan_list.clone()
        };
        let items = self.load_varian_items(varian_id, &bahan_list).await?;

        let mut inner = self.lock_inner();
        for varian in inner.varian_list.iter_mut() {
            varian.is_active = varian.id == varian_id;
        }
        inner.varian_aktif_id = varian_id;
        inner.resep_items = items;
        self.recalculate_locked(&mut inner);
        Ok(())
    }

    // ==========================================
    // 新建 / 复制变体
    // ==========================================

    /// 新建变体并立即激活
    ///
    /// # 参数
    /// - `nama`: 期望名称（None 用 "Varian Baru"），冲突自动加 " (2)"、" (3)" 序号
    /// - `duplikat_dari_aktif`: true 时逐行复制激活变体的用量，否则全 0
    pub async fn tambah_varian(
        &self,
        nama: Option<String>,
        duplikat_dari_aktif: bool,
    ) -> StateResult<ResepVarian> {
        self.ensure_ready()?;

        let (final_name, row_template) = {
            let inner = self.lock_inner();
            let requested = nama.unwrap_or_else(|| "Varian Baru".to_string());
            let base = crate::engine::normalizer::normalize_name(&requested, "Varian Baru");
            let unique = Self::unique_variant_name(&base, &inner.varian_list);

            let template: Vec<(i64, Decimal)> = inner
                .bahan_list
                .iter()
                .map(|b| {
                    let jumlah = if duplikat_dari_aktif {
                        inner
                            .resep_items
                            .iter()
                            .find(|r| r.bahan_id == b.id)
                            .map(|r| r.jumlah_dipakai)
                            .unwrap_or(Decimal::ZERO)
                    } else {
                        Decimal::ZERO
                    };
                    (b.id, jumlah)
                })
                .collect();
            (unique, template)
        };

        let varian_repo = self.varian_repo.clone();
        let resep_repo = self.resep_repo.clone();
        let name_for_write = final_name.clone();
        let inserted = self
            .saver
            .run_immediate(move || {
                let varian = varian_repo.insert(&ResepVarian {
                    id: 0,
                    nama_varian: name_for_write,
                    is_active: false,
                })?;

                let rows: Vec<Resep> = row_template
                    .iter()
                    .map(|(bahan_id, jumlah)| Resep {
                        id: 0,
                        bahan_id: *bahan_id,
                        varian_id: varian.id,
                        jumlah_dipakai: *jumlah,
                    })
                    .collect();
                if !rows.is_empty() {
                    resep_repo.insert_many(&rows)?;
                }

                varian_repo.set_active(varian.id)?;
                Ok(varian)
            })
            .await?;

        {
            let mut inner = self.lock_inner();
            inner.varian_list.push(ResepVarian {
                is_active: false,
                ..inserted.clone()
            });
        }
        self.activate_in_mirror(inserted.id).await?;

        tracing::info!(varian_id = inserted.id, nama = %final_name, "新建变体并激活");
        self.publish_recalculated();
        self.events.publish(StateEvent::for_entity(
            StateEventKind::VariantSwitched,
            Some("tambah_varian".to_string()),
            inserted.id,
        ));

        let mut created = inserted;
        created.is_active = true;
        Ok(created)
    }

    /// 复制激活变体（名称加 " Copy" 后缀，用量逐行复制）
    pub async fn duplikasi_varian_aktif(&self) -> StateResult<ResepVarian> {
        self.ensure_ready()?;

        let nama = {
            let inner = self.lock_inner();
            let aktif_id = inner.varian_aktif_id;
            let aktif = inner
                .varian_list
                .iter()
                .find(|v| v.id == aktif_id)
                .ok_or(StateError::VarianNotFound(aktif_id))?;
            format!("{}{}", aktif.nama_varian, self.config.copy_suffix)
        };

        self.tambah_varian(Some(nama), true).await
    }

    // ==========================================
    // 重命名 / 删除变体
    // ==========================================

    /// 重命名变体（同样走唯一名生成）
    pub async fn ganti_nama_varian(&self, varian_id: i64, nama: &str) -> StateResult<String> {
        self.ensure_ready()?;

        let final_name = {
            let inner = self.lock_inner();
            if !inner.varian_list.iter().any(|v| v.id == varian_id) {
                return Err(StateError::VarianNotFound(varian_id));
            }
            let base = crate::engine::normalizer::normalize_name(nama, "Varian");
            let others: Vec<ResepVarian> = inner
                .varian_list
                .iter()
                .filter(|v| v.id != varian_id)
                .cloned()
                .collect();
            Self::unique_variant_name(&base, &others)
        };

        let repo = self.varian_repo.clone();
        let name_for_write = final_name.clone();
        self.saver
            .run_immediate(move || repo.rename(varian_id, &name_for_write))
            .await?;

        {
            let mut inner = self.lock_inner();
            if let Some(varian) = inner.varian_list.iter_mut().find(|v| v.id == varian_id) {
                varian.nama_varian = final_name.clone();
            }
        }
        Ok(final_name)
    }

    /// 删除变体
    ///
    /// 仅剩一个时拒绝: 状态置错误文案，镜像不变，返回 LastVariant。
    /// 删除的是激活变体时，回退激活余下 Id 最小者。
    pub async fn hapus_varian(&self, varian_id: i64) -> StateResult<()> {
        self.ensure_ready()?;

        let (was_active, fallback_id) = {
            let inner = self.lock_inner();
            if !inner.varian_list.iter().any(|v| v.id == varian_id) {
                return Err(StateError::VarianNotFound(varian_id));
            }
            if inner.varian_list.len() <= 1 {
                drop(inner);
                self.set_error_status(t("varian.last_cannot_delete"));
                return Err(StateError::LastVariant);
            }

            let fallback = inner
                .varian_list
                .iter()
                .filter(|v| v.id != varian_id)
                .map(|v| v.id)
                .min()
                .unwrap_or(0);
            (inner.varian_aktif_id == varian_id, fallback)
        };

        let repo = self.varian_repo.clone();
        self.saver
            .run_immediate(move || {
                // FK 级联清理该变体的用量行
                repo.delete(varian_id)?;
                if was_active {
                    repo.set_active(fallback_id)?;
                }
                Ok(())
            })
            .await?;

        {
            let mut inner = self.lock_inner();
            inner.varian_list.retain(|v| v.id != varian_id);
        }

        // 删除非激活变体不触碰用量行，输出不变，不发 Recalculated
        if was_active {
            self.activate_in_mirror(fallback_id).await?;
            self.publish_recalculated();
            self.events.publish(StateEvent::for_entity(
                StateEventKind::VariantSwitched,
                Some("hapus_varian".to_string()),
                fallback_id,
            ));
        }

        tracing::info!(varian_id, was_active, "删除变体");
        Ok(())
    }

    // ==========================================
    // 重置激活变体
    // ==========================================

    /// 激活变体的全部用量清零（不触碰其他变体）
    pub async fn reset_resep_aktif(&self) -> StateResult<()> {
        self.ensure_ready()?;

        let varian_id = {
            let inner = self.lock_inner();
            inner.varian_aktif_id
        };

        let repo = self.resep_repo.clone();
        self.saver
            .run_immediate(move || repo.reset_by_varian(varian_id))
            .await?;

        {
            let mut inner = self.lock_inner();
            for item in inner.resep_items.iter_mut() {
                item.jumlah_dipakai = Decimal::ZERO;
            }
            self.recalculate_locked(&mut inner);
        }

        self.publish_recalculated();
        Ok(())
    }

    // ===== 唯一名生成 =====

    /// 大小写不敏感查重；冲突依次尝试 "name (2)"、"name (3)" ...
    pub(crate) fn unique_variant_name(base: &str, existing: &[ResepVarian]) -> String {
        let taken = |candidate: &str| {
            existing
                .iter()
                .any(|v| v.nama_varian.eq_ignore_ascii_case(candidate))
        };

        if !taken(base) {
            return base.to_string();
        }

        let mut counter = 2u32;
        loop {
            let candidate = format!("{base} ({counter})");
            if !taken(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varian(id: i64, nama: &str) -> ResepVarian {
        ResepVarian {
            id,
            nama_varian: nama.to_string(),
            is_active: false,
        }
    }

    #[test]
    fn test_unique_name_no_collision() {
        let existing = vec![varian(1, "Default")];
        assert_eq!(
            AppStateService::unique_variant_name("Hemat", &existing),
            "Hemat"
        );
    }

    #[test]
    fn test_unique_name_collision_sequence() {
        let mut existing = vec![varian(1, "Default")];
        assert_eq!(
            AppStateService::unique_variant_name("Default", &existing),
            "Default (2)"
        );

        existing.push(varian(2, "Default (2)"));
        assert_eq!(
            AppStateService::unique_variant_name("Default", &existing),
            "Default (3)"
        );
    }

    #[test]
    fn test_unique_name_case_insensitive() {
        let existing = vec![varian(1, "default")];
        assert_eq!(
            AppStateService::unique_variant_name("Default", &existing),
            "Default (2)"
        );
    }
}
