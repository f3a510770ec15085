// ==========================================
// 状态引擎集成测试
// ==========================================
// 测试范围:
// 1. 初始化与用量行回填
// 2. 原料/配料增删 + 镜像同步
// 3. 字段编辑的规范化与联动重算
// 4. 变体生命周期不变量
// 5. 释放后的拒绝语义
// ==========================================


use hpp_donat::engine::events::{OptionalEventPublisher, StateEventKind};
use hpp_donat::engine::{
    BahanEdit, ProduksiSettingEdit, ResepEdit, StateEngineConfig, StateError, ToppingEdit,
};
use rust_decimal::Decimal;
use std::time::Duration;

// ==========================================
// 初始化
// ==========================================

#[tokio::test]
async fn test_initialize_backfills_missing_line_items() {
    hpp_donat::logging::init_test();
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let repos = test_helpers::build_repos(&conn);

    // 库里已有原料但没有对应用量行
    repos
        .bahan
        .insert(&hpp_donat::Bahan {
            id: 0,
            nama_bahan: "Tepung".to_string(),
            satuan: hpp_donat::Satuan::Gram,
            netto_per_pack: Decimal::from(1000),
            harga_per_pack: Decimal::from(20000),
        })
        .unwrap();

    let service = test_helpers::build_service(&conn);
    service.initialize().await.unwrap();

    let items = service.resep_items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].jumlah_dipakai, Decimal::ZERO);
    assert_eq!(items[0].nama_bahan, "Tepung");

    let varian = service.varian_aktif().unwrap();
    assert_eq!(varian.nama_varian, "Default");
    assert!(varian.is_active);

    let status = service.status();
    assert!(!status.is_busy);
    assert!(!status.is_error);
}

#[tokio::test]
async fn test_initialize_twice_is_noop() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let service = test_helpers::build_service(&conn);

    service.initialize().await.unwrap();
    service.initialize().await.unwrap();
    assert_eq!(service.varian_items().len(), 1);
}

#[tokio::test]
async fn test_operations_require_initialize() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let service = test_helpers::build_service(&conn);

    let result = service.tambah_bahan().await;
    assert!(matches!(result, Err(StateError::NotInitialized)));
}

// ==========================================
// 原料增删
// ==========================================

#[tokio::test]
async fn test_tambah_bahan_uses_placeholder_defaults() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let service = test_helpers::build_service(&conn);
    service.initialize().await.unwrap();

    let bahan = service.tambah_bahan().await.unwrap();
    assert!(bahan.id > 0);
    assert_eq!(bahan.nama_bahan, "Bahan Baru");
    assert_eq!(bahan.netto_per_pack, Decimal::from(1000));
    assert_eq!(bahan.harga_per_pack, Decimal::ZERO);

    // 激活变体同步出现 0 用量行
    let items = service.resep_items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].bahan_id, bahan.id);
    assert_eq!(items[0].jumlah_dipakai, Decimal::ZERO);
}

#[tokio::test]
async fn test_tambah_bahan_creates_rows_for_every_variant() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let repos = test_helpers::build_repos(&conn);
    let service = test_helpers::build_service(&conn);
    service.initialize().await.unwrap();

    service.tambah_varian(Some("Hemat".to_string()), false).await.unwrap();
    let bahan = service.tambah_bahan().await.unwrap();

    for varian in service.varian_items() {
        let rows = repos.resep.list_by_varian(varian.id).unwrap();
        assert!(rows.iter().any(|r| r.bahan_id == bahan.id));
    }
}

#[tokio::test]
async fn test_hapus_bahan_removes_rows_in_all_variants() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let repos = test_helpers::build_repos(&conn);
    let service = test_helpers::build_service(&conn);
    service.initialize().await.unwrap();

    let bahan = service.tambah_bahan().await.unwrap();
    service.tambah_varian(Some("Hemat".to_string()), false).await.unwrap();

    service.hapus_bahan(bahan.id).await.unwrap();

    assert!(service.bahan_items().is_empty());
    assert!(service.resep_items().is_empty());
    assert!(repos
        .resep
        .list_all()
        .unwrap()
        .iter()
        .all(|r| r.bahan_id != bahan.id));
}

// ==========================================
// 字段编辑与重算
// ==========================================

/// 搭一个固定场景: 两种原料 + 三种配料，验证整条推导链
#[tokio::test]
async fn test_full_recalculation_chain() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let service = test_helpers::build_service(&conn);
    service.initialize().await.unwrap();

    let tepung = service.tambah_bahan().await.unwrap();
    let gula = service.tambah_bahan().await.unwrap();

    service
        .edit_bahan(tepung.id, BahanEdit::HargaPerPack(Decimal::from(20000)))
        .unwrap();
    service
        .edit_bahan(gula.id, BahanEdit::HargaPerPack(Decimal::from(12000)))
        .unwrap();

    let items = service.resep_items();
    let row_tepung = items.iter().find(|r| r.bahan_id == tepung.id).unwrap();
    let row_gula = items.iter().find(|r| r.bahan_id == gula.id).unwrap();
    service
        .edit_resep(row_tepung.id, ResepEdit::JumlahDipakai(Decimal::from(500)))
        .unwrap();
    service
        .edit_resep(row_gula.id, ResepEdit::JumlahDipakai(Decimal::from(250)))
        .unwrap();

    let coklat = service.tambah_topping().await.unwrap();
    service
        .edit_topping(coklat.id, ToppingEdit::BiayaPerDonat(Decimal::from(400)))
        .unwrap();
    let keju = service.tambah_topping().await.unwrap();
    service
        .edit_topping(keju.id, ToppingEdit::BiayaPerDonat(Decimal::from(600)))
        .unwrap();
    service.edit_topping(keju.id, ToppingEdit::IsActive(false)).unwrap();
    let meses = service.tambah_topping().await.unwrap();
    service
        .edit_topping(meses.id, ToppingEdit::BiayaPerDonat(Decimal::from(150)))
        .unwrap();

    let calc = service.calculation();
    assert_eq!(calc.total_modal_adonan, Decimal::from(13000));
    assert_eq!(calc.hpp_donat, Decimal::from(130));
    assert_eq!(calc.total_topping, Decimal::from(550));
    assert_eq!(calc.hpp_final, Decimal::from(680));
    assert_eq!(calc.produksi_efektif, Decimal::from(100));
    assert_eq!(calc.hpp_setelah_waste, Decimal::from(130));
    // 680 / 0.7 = 971.43 -> 向上取整到百位 1000
    assert_eq!(calc.harga_jual, Decimal::from(1000));
    assert_eq!(calc.profit_per_donat, Decimal::from(320));
    assert_eq!(calc.total_profit, Decimal::from(32000));
    assert_eq!(calc.estimasi_harian, Decimal::from(32000));
    assert_eq!(calc.estimasi_bulanan, Decimal::from(832000));

    // 行级派生: 成本贡献与占比
    let items = service.resep_items();
    let row_tepung = items.iter().find(|r| r.bahan_id == tepung.id).unwrap();
    assert_eq!(row_tepung.modal_bahan, Decimal::from(10000));
    assert_eq!(row_tepung.validation_message, "OK");
}

#[tokio::test]
async fn test_edit_normalizes_before_store() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let service = test_helpers::build_service(&conn);
    service.initialize().await.unwrap();

    let bahan = service.tambah_bahan().await.unwrap();
    service
        .edit_bahan(bahan.id, BahanEdit::HargaPerPack(Decimal::from(-500)))
        .unwrap();
    service
        .edit_bahan(bahan.id, BahanEdit::NettoPerPack(Decimal::ZERO))
        .unwrap();
    service
        .edit_bahan(bahan.id, BahanEdit::NamaBahan("   ".to_string()))
        .unwrap();
    service
        .edit_bahan(bahan.id, BahanEdit::Satuan("ons".to_string()))
        .unwrap();

    let mirrored = &service.bahan_items()[0];
    assert_eq!(mirrored.harga_per_pack, Decimal::ZERO);
    assert_eq!(mirrored.netto_per_pack, Decimal::from(1000));
    assert_eq!(mirrored.nama_bahan, "Bahan Baru");
    assert_eq!(mirrored.satuan, hpp_donat::Satuan::Gram);

    // 冗余字段同步到用量行
    let item = &service.resep_items()[0];
    assert_eq!(item.nama_bahan, "Bahan Baru");
    assert_eq!(item.netto_per_pack, Decimal::from(1000));
}

#[tokio::test]
async fn test_validation_message_order() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let service = test_helpers::build_service(&conn);
    service.initialize().await.unwrap();

    let bahan = service.tambah_bahan().await.unwrap();
    let item_id = service.resep_items()[0].id;

    // 用量 0 -> "Jumlah belum diisi"
    assert_eq!(service.resep_items()[0].validation_message, "Jumlah belum diisi");

    service
        .edit_resep(item_id, ResepEdit::JumlahDipakai(Decimal::from(500)))
        .unwrap();
    service
        .edit_bahan(bahan.id, BahanEdit::HargaPerPack(Decimal::from(20000)))
        .unwrap();
    assert_eq!(service.resep_items()[0].validation_message, "OK");
}

#[tokio::test]
async fn test_edit_setting_clamps_and_recalculates() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let service = test_helpers::build_service(&conn);
    service.initialize().await.unwrap();

    service
        .edit_setting(ProduksiSettingEdit::WastePersen(Decimal::from(150)))
        .unwrap();
    service
        .edit_setting(ProduksiSettingEdit::TargetProfitPersen(Decimal::from(120)))
        .unwrap();
    service
        .edit_setting(ProduksiSettingEdit::HariProduksiPerBulan(60))
        .unwrap();

    let setting = service.produksi_setting();
    assert_eq!(setting.waste_persen, Decimal::from(99));
    assert_eq!(setting.target_profit_persen, Decimal::from(95));
    assert_eq!(setting.hari_produksi_per_bulan, 31);

    // 100 * (1 - 0.99) = 1
    assert_eq!(service.calculation().produksi_efektif, Decimal::ONE);
}

#[tokio::test]
async fn test_berat_per_donat_does_not_touch_outputs() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let service = test_helpers::build_service(&conn);
    service.initialize().await.unwrap();

    let before = service.calculation();
    service
        .edit_setting(ProduksiSettingEdit::BeratPerDonat(Decimal::from(75)))
        .unwrap();

    assert_eq!(service.produksi_setting().berat_per_donat, Decimal::from(75));
    assert_eq!(service.calculation(), before);
}

// ==========================================
// 变体生命周期
// ==========================================

#[tokio::test]
async fn test_variant_unique_name_sequence() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let service = test_helpers::build_service(&conn);
    service.initialize().await.unwrap();

    let v2 = service
        .tambah_varian(Some("Default".to_string()), false)
        .await
        .unwrap();
    assert_eq!(v2.nama_varian, "Default (2)");

    let v3 = service
        .tambah_varian(Some("Default".to_string()), false)
        .await
        .unwrap();
    assert_eq!(v3.nama_varian, "Default (3)");
}

#[tokio::test]
async fn test_duplicate_variant_copies_quantities() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let service = test_helpers::build_service(&conn);
    service.initialize().await.unwrap();

    service.tambah_bahan().await.unwrap();
    let item_id = service.resep_items()[0].id;
    service
        .edit_resep(item_id, ResepEdit::JumlahDipakai(Decimal::from(500)))
        .unwrap();

    let copy = service.duplikasi_varian_aktif().await.unwrap();
    assert_eq!(copy.nama_varian, "Default Copy");
    assert!(copy.is_active);

    // 复制体成为激活变体，用量逐行相同
    let items = service.resep_items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].varian_id, copy.id);
    assert_eq!(items[0].jumlah_dipakai, Decimal::from(500));
}

#[tokio::test]
async fn test_switching_variant_loads_own_quantities() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let service = test_helpers::build_service(&conn);
    service.initialize().await.unwrap();

    let bahan = service.tambah_bahan().await.unwrap();
    service
        .edit_bahan(bahan.id, BahanEdit::HargaPerPack(Decimal::from(20000)))
        .unwrap();
    let default_item = service.resep_items()[0].id;
    service
        .edit_resep(default_item, ResepEdit::JumlahDipakai(Decimal::from(500)))
        .unwrap();
    let default_calc = service.calculation();
    assert_eq!(default_calc.total_modal_adonan, Decimal::from(10000));

    // 等防抖落库，切换时从库中重新加载用量
    tokio::time::sleep(Duration::from_millis(400)).await;

    // 空变体: 切过去输出归零，切回来恢复
    let kosong = service
        .tambah_varian(Some("Kosong".to_string()), false)
        .await
        .unwrap();
    assert_eq!(service.calculation().total_modal_adonan, Decimal::ZERO);
    assert_eq!(service.resep_items()[0].jumlah_dipakai, Decimal::ZERO);

    let default_id = service
        .varian_items()
        .iter()
        .find(|v| v.nama_varian == "Default")
        .unwrap()
        .id;
    service.pilih_varian(default_id).await.unwrap();
    assert_eq!(service.calculation().total_modal_adonan, Decimal::from(10000));
    assert_ne!(service.varian_aktif().unwrap().id, kosong.id);
}

#[tokio::test]
async fn test_select_active_variant_is_noop() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let service = test_helpers::build_service(&conn);
    service.initialize().await.unwrap();

    let aktif = service.varian_aktif().unwrap();
    service.pilih_varian(aktif.id).await.unwrap();
    assert_eq!(service.varian_aktif().unwrap().id, aktif.id);
}

#[tokio::test]
async fn test_exactly_one_active_after_lifecycle_storm() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let service = test_helpers::build_service(&conn);
    service.initialize().await.unwrap();

    let v2 = service.tambah_varian(Some("A".to_string()), false).await.unwrap();
    service.tambah_varian(Some("B".to_string()), true).await.unwrap();
    service.duplikasi_varian_aktif().await.unwrap();
    service.pilih_varian(v2.id).await.unwrap();
    service.hapus_varian(v2.id).await.unwrap();

    let varians = service.varian_items();
    assert!(!varians.is_empty());
    assert_eq!(varians.iter().filter(|v| v.is_active).count(), 1);
    // 镜像与库中的激活标志一致
    let repos = test_helpers::build_repos(&conn);
    let db_active: Vec<_> = repos
        .varian
        .list_all()
        .unwrap()
        .into_iter()
        .filter(|v| v.is_active)
        .collect();
    assert_eq!(db_active.len(), 1);
    assert_eq!(db_active[0].id, service.varian_aktif().unwrap().id);
}

#[tokio::test]
async fn test_delete_last_variant_refused_without_state_change() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let service = test_helpers::build_service(&conn);
    service.initialize().await.unwrap();

    let only = service.varian_aktif().unwrap();
    let result = service.hapus_varian(only.id).await;
    assert!(matches!(result, Err(StateError::LastVariant)));

    // 镜像不变 + 用户可见错误状态
    assert_eq!(service.varian_items().len(), 1);
    assert_eq!(service.varian_aktif().unwrap().id, only.id);
    let status = service.status();
    assert!(status.is_error);
    assert_eq!(status.message, "Varian terakhir tidak dapat dihapus.");

    service.clear_error_status();
    assert!(!service.status().is_error);
}

#[tokio::test]
async fn test_delete_active_variant_falls_back() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let service = test_helpers::build_service(&conn);
    service.initialize().await.unwrap();

    let hemat = service.tambah_varian(Some("Hemat".to_string()), false).await.unwrap();
    assert_eq!(service.varian_aktif().unwrap().id, hemat.id);

    service.hapus_varian(hemat.id).await.unwrap();
    let aktif = service.varian_aktif().unwrap();
    assert_eq!(aktif.nama_varian, "Default");
    assert!(aktif.is_active);
}

#[tokio::test]
async fn test_delete_inactive_variant_publishes_no_recalculated() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let recorder = test_helpers::RecordingPublisher::new();
    let service = test_helpers::build_service_with(
        &conn,
        StateEngineConfig::default(),
        OptionalEventPublisher::with_publisher(recorder.clone()),
    );
    service.initialize().await.unwrap();

    // 新建并激活 Hemat，Default 退为非激活
    let hemat = service.tambah_varian(Some("Hemat".to_string()), false).await.unwrap();
    let default_id = service
        .varian_items()
        .iter()
        .find(|v| v.nama_varian == "Default")
        .unwrap()
        .id;

    let recalcs_before = recorder.count(StateEventKind::Recalculated);
    let switches_before = recorder.count(StateEventKind::VariantSwitched);

    service.hapus_varian(default_id).await.unwrap();

    // 删除非激活变体: 输出未变，既不发 Recalculated 也不发 VariantSwitched
    assert_eq!(recorder.count(StateEventKind::Recalculated), recalcs_before);
    assert_eq!(
        recorder.count(StateEventKind::VariantSwitched),
        switches_before
    );
    assert_eq!(service.varian_aktif().unwrap().id, hemat.id);
}

#[tokio::test]
async fn test_reset_resep_only_touches_active_variant() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let repos = test_helpers::build_repos(&conn);
    let service = test_helpers::build_service(&conn);
    service.initialize().await.unwrap();

    service.tambah_bahan().await.unwrap();
    let item_id = service.resep_items()[0].id;
    service
        .edit_resep(item_id, ResepEdit::JumlahDipakai(Decimal::from(500)))
        .unwrap();

    // 复制出第二个变体（携带 500），再切回 Default 重置
    let copy = service.duplikasi_varian_aktif().await.unwrap();
    let default_id = service
        .varian_items()
        .iter()
        .find(|v| v.nama_varian == "Default")
        .unwrap()
        .id;
    service.pilih_varian(default_id).await.unwrap();
    service.reset_resep_aktif().await.unwrap();

    assert_eq!(service.resep_items()[0].jumlah_dipakai, Decimal::ZERO);
    let copy_rows = repos.resep.list_by_varian(copy.id).unwrap();
    assert_eq!(copy_rows[0].jumlah_dipakai, Decimal::from(500));
}

#[tokio::test]
async fn test_rename_variant_resolves_collision() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let service = test_helpers::build_service(&conn);
    service.initialize().await.unwrap();

    let hemat = service.tambah_varian(Some("Hemat".to_string()), false).await.unwrap();
    let final_name = service.ganti_nama_varian(hemat.id, "Default").await.unwrap();
    assert_eq!(final_name, "Default (2)");
}

// ==========================================
// 释放
// ==========================================

#[tokio::test]
async fn test_dispose_rejects_further_operations() {
    let (_tmp, conn) = test_helpers::create_test_db().unwrap();
    let service = test_helpers::build_service(&conn);
    service.initialize().await.unwrap();

    service.dispose();

    assert!(matches!(service.tambah_bahan().await, Err(StateError::Disposed)));
    assert!(matches!(
        service.reset_resep_aktif().await,
        Err(StateError::Disposed)
    ));
}
