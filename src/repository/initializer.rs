// ==========================================
// 甜甜圈成本核算系统 - 数据库初始化与迁移
// ==========================================
// 职责: 建表、前向迁移旧库、数据修复、校验触发器
// 契约: 迁移不丢数据；结束后恰好一个变体处于激活态
// 说明: 迁移期间临时关闭外键检查（改表需要）
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct DatabaseInitializer {
    conn: Arc<Mutex<Connection>>,
}

impl DatabaseInitializer {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 初始化数据库（幂等，可对旧库重复执行）
    ///
    /// 失败视为启动致命错误，由调用方决定终止
    pub fn initialize(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute_batch("PRAGMA foreign_keys = OFF;")?;

        Self::ensure_bahan_table(&conn)?;
        Self::ensure_varian_table(&conn)?;
        Self::ensure_resep_table(&conn)?;
        Self::ensure_topping_table(&conn)?;
        Self::ensure_produksi_setting_table(&conn)?;

        Self::normalize_data(&conn)?;
        Self::ensure_triggers(&conn)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        tracing::info!("数据库初始化完成");
        Ok(())
    }

    fn table_exists(conn: &Connection, table: &str) -> RepositoryResult<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(1) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn column_exists(conn: &Connection, table: &str, column: &str) -> RepositoryResult<bool> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
        let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
        for name in names {
            if name?.eq_ignore_ascii_case(column) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // ===== Bahan: 建表 + 补 Satuan 列迁移 =====
    fn ensure_bahan_table(conn: &Connection) -> RepositoryResult<()> {
        if !Self::table_exists(conn, "Bahan")? {
            conn.execute_batch(
                r#"
                CREATE TABLE Bahan (
                    Id INTEGER PRIMARY KEY AUTOINCREMENT,
                    NamaBahan TEXT NOT NULL,
                    Satuan TEXT NOT NULL DEFAULT 'gram',
                    NettoPerPack REAL NOT NULL CHECK (NettoPerPack > 0),
                    HargaPerPack REAL NOT NULL CHECK (HargaPerPack >= 0)
                );
                "#,
            )?;
            return Ok(());
        }

        if !Self::column_exists(conn, "Bahan", "Satuan")? {
            tracing::info!("迁移: Bahan 表补充 Satuan 列");
            conn.execute_batch(
                "ALTER TABLE Bahan ADD COLUMN Satuan TEXT NOT NULL DEFAULT 'gram';",
            )?;
        }
        Ok(())
    }

    // ===== ResepVarian: 建表 + 保证至少一个默认变体 =====
    fn ensure_varian_table(conn: &Connection) -> RepositoryResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS ResepVarian (
                Id INTEGER PRIMARY KEY AUTOINCREMENT,
                NamaVarian TEXT NOT NULL UNIQUE,
                IsActive INTEGER NOT NULL CHECK (IsActive IN (0, 1))
            );

            INSERT INTO ResepVarian (Id, NamaVarian, IsActive)
            SELECT 1, 'Default', 1
            WHERE NOT EXISTS (SELECT 1 FROM ResepVarian);
            "#,
        )?;
        Ok(())
    }

    // ===== Resep: 建表 + 旧无变体表前向迁移 =====
    // 旧形态没有 VarianId 列；迁移路径: 改名旧表 -> 建新表 ->
    // 把旧行指到默认变体(1) -> 丢弃旧表。负用量顺手归零。
    fn ensure_resep_table(conn: &Connection) -> RepositoryResult<()> {
        if !Self::table_exists(conn, "Resep")? {
            Self::create_resep_table(conn)?;
            return Ok(());
        }

        if !Self::column_exists(conn, "Resep", "VarianId")? {
            tracing::info!("迁移: Resep 表补充变体维度，旧行指向默认变体");
            conn.execute_batch("ALTER TABLE Resep RENAME TO Resep_Legacy;")?;
            Self::create_resep_table(conn)?;
            conn.execute_batch(
                r#"
                INSERT INTO Resep (BahanId, VarianId, JumlahDipakai)
                SELECT BahanId, 1, CASE WHEN JumlahDipakai < 0 THEN 0 ELSE JumlahDipakai END
                FROM Resep_Legacy;

                DROP TABLE Resep_Legacy;
                "#,
            )?;
        }

        conn.execute_batch(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS IX_Resep_VarianId_BahanId
            ON Resep (VarianId, BahanId);
            "#,
        )?;
        Ok(())
    }

    fn create_resep_table(conn: &Connection) -> RepositoryResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE Resep (
                Id INTEGER PRIMARY KEY AUTOINCREMENT,
                BahanId INTEGER NOT NULL,
                VarianId INTEGER NOT NULL,
                JumlahDipakai REAL NOT NULL CHECK (JumlahDipakai >= 0),
                FOREIGN KEY (BahanId) REFERENCES Bahan(Id) ON DELETE CASCADE,
                FOREIGN KEY (VarianId) REFERENCES ResepVarian(Id) ON DELETE CASCADE
            );

            CREATE UNIQUE INDEX IF NOT EXISTS IX_Resep_VarianId_BahanId
            ON Resep (VarianId, BahanId);
            "#,
        )?;
        Ok(())
    }

    fn ensure_topping_table(conn: &Connection) -> RepositoryResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS Topping (
                Id INTEGER PRIMARY KEY AUTOINCREMENT,
                NamaTopping TEXT NOT NULL,
                BiayaPerDonat REAL NOT NULL CHECK (BiayaPerDonat >= 0),
                IsActive INTEGER NOT NULL CHECK (IsActive IN (0, 1))
            );
            "#,
        )?;
        Ok(())
    }

    // ===== ProduksiSetting: 建表 + 补 BeratPerDonat 列迁移 =====
    fn ensure_produksi_setting_table(conn: &Connection) -> RepositoryResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS ProduksiSetting (
                Id INTEGER PRIMARY KEY CHECK (Id = 1),
                JumlahDonatDihasilkan REAL NOT NULL CHECK (JumlahDonatDihasilkan > 0),
                BeratPerDonat REAL NOT NULL CHECK (BeratPerDonat > 0),
                WastePersen REAL NOT NULL CHECK (WastePersen >= 0 AND WastePersen <= 99),
                TargetProfitPersen REAL NOT NULL CHECK (TargetProfitPersen >= 1 AND TargetProfitPersen <= 95),
                HariProduksiPerBulan INTEGER NOT NULL CHECK (HariProduksiPerBulan >= 1 AND HariProduksiPerBulan <= 31)
            );
            "#,
        )?;

        if !Self::column_exists(conn, "ProduksiSetting", "BeratPerDonat")? {
            tracing::info!("迁移: ProduksiSetting 表补充 BeratPerDonat 列");
            conn.execute_batch(
                "ALTER TABLE ProduksiSetting ADD COLUMN BeratPerDonat REAL NOT NULL DEFAULT 50;",
            )?;
        }
        Ok(())
    }

    // ===== 数据修复: 旧库中越界值按规范化规则就地矫正 =====
    fn normalize_data(conn: &Connection) -> RepositoryResult<()> {
        conn.execute_batch(
            r#"
            UPDATE Bahan
            SET NamaBahan = 'Bahan'
            WHERE TRIM(COALESCE(NamaBahan, '')) = '';

            UPDATE Bahan
            SET Satuan = LOWER(TRIM(COALESCE(Satuan, 'gram')));

            UPDATE Bahan
            SET Satuan = 'gram'
            WHERE Satuan NOT IN ('gram', 'kg', 'ml', 'liter', 'butir', 'pcs', 'sendok');

            UPDATE Bahan SET NettoPerPack = 1 WHERE NettoPerPack <= 0;
            UPDATE Bahan SET HargaPerPack = 0 WHERE HargaPerPack < 0;

            UPDATE Resep SET VarianId = 1 WHERE VarianId <= 0;
            UPDATE Resep SET JumlahDipakai = 0 WHERE JumlahDipakai < 0;

            UPDATE Topping SET NamaTopping = 'Topping' WHERE TRIM(COALESCE(NamaTopping, '')) = '';
            UPDATE Topping SET BiayaPerDonat = 0 WHERE BiayaPerDonat < 0;
            UPDATE Topping SET IsActive = 1 WHERE IsActive NOT IN (0, 1);

            UPDATE ProduksiSetting
            SET JumlahDonatDihasilkan = CASE WHEN JumlahDonatDihasilkan <= 0 THEN 1 ELSE JumlahDonatDihasilkan END,
                BeratPerDonat = CASE WHEN BeratPerDonat <= 0 THEN 50 ELSE BeratPerDonat END,
                WastePersen = CASE WHEN WastePersen < 0 THEN 0 WHEN WastePersen > 99 THEN 99 ELSE WastePersen END,
                TargetProfitPersen = CASE WHEN TargetProfitPersen < 1 THEN 1 WHEN TargetProfitPersen > 95 THEN 95 ELSE TargetProfitPersen END,
                HariProduksiPerBulan = CASE WHEN HariProduksiPerBulan < 1 THEN 1 WHEN HariProduksiPerBulan > 31 THEN 31 ELSE HariProduksiPerBulan END
            WHERE Id = 1;

            UPDATE ResepVarian SET NamaVarian = 'Varian' WHERE TRIM(COALESCE(NamaVarian, '')) = '';
            UPDATE ResepVarian SET IsActive = 0 WHERE IsActive NOT IN (0, 1);

            -- 恰好一个激活变体: 优先保留已激活者，否则取最小 Id
            UPDATE ResepVarian
            SET IsActive = CASE
                WHEN Id = (SELECT Id FROM ResepVarian ORDER BY IsActive DESC, Id LIMIT 1) THEN 1
                ELSE 0
            END;
            "#,
        )?;
        Ok(())
    }

    // ===== 校验触发器: 与内存规范化同口径的边界防线 =====
    fn ensure_triggers(conn: &Connection) -> RepositoryResult<()> {
        conn.execute_batch(
            r#"
            DROP TRIGGER IF EXISTS trg_bahan_validate_insert;
            DROP TRIGGER IF EXISTS trg_bahan_validate_update;
            DROP TRIGGER IF EXISTS trg_resep_validate_insert;
            DROP TRIGGER IF EXISTS trg_resep_validate_update;
            DROP TRIGGER IF EXISTS trg_topping_validate_insert;
            DROP TRIGGER IF EXISTS trg_topping_validate_update;
            DROP TRIGGER IF EXISTS trg_produksi_validate_insert;
            DROP TRIGGER IF EXISTS trg_produksi_validate_update;
            DROP TRIGGER IF EXISTS trg_varian_validate_insert;
            DROP TRIGGER IF EXISTS trg_varian_validate_update;

            CREATE TRIGGER trg_bahan_validate_insert
            BEFORE INSERT ON Bahan
            WHEN TRIM(COALESCE(NEW.NamaBahan, '')) = '' OR NEW.NettoPerPack <= 0 OR NEW.HargaPerPack < 0
                OR TRIM(COALESCE(NEW.Satuan, '')) = ''
            BEGIN
                SELECT RAISE(ABORT, 'Data bahan tidak valid');
            END;

            CREATE TRIGGER trg_bahan_validate_update
            BEFORE UPDATE ON Bahan
            WHEN TRIM(COALESCE(NEW.NamaBahan, '')) = '' OR NEW.NettoPerPack <= 0 OR NEW.HargaPerPack < 0
                OR TRIM(COALESCE(NEW.Satuan, '')) = ''
            BEGIN
                SELECT RAISE(ABORT, 'Data bahan tidak valid');
            END;

            CREATE TRIGGER trg_resep_validate_insert
            BEFORE INSERT ON Resep
            WHEN NEW.JumlahDipakai < 0 OR NEW.VarianId <= 0
            BEGIN
                SELECT RAISE(ABORT, 'Data resep tidak valid');
            END;

            CREATE TRIGGER trg_resep_validate_update
            BEFORE UPDATE ON Resep
            WHEN NEW.JumlahDipakai < 0 OR NEW.VarianId <= 0
            BEGIN
                SELECT RAISE(ABORT, 'Data resep tidak valid');
            END;

            CREATE TRIGGER trg_topping_validate_insert
            BEFORE INSERT ON Topping
            WHEN TRIM(COALESCE(NEW.NamaTopping, '')) = '' OR NEW.BiayaPerDonat < 0 OR NEW.IsActive NOT IN (0, 1)
            BEGIN
                SELECT RAISE(ABORT, 'Data topping tidak valid');
            END;

            CREATE TRIGGER trg_topping_validate_update
            BEFORE UPDATE ON Topping
            WHEN TRIM(COALESCE(NEW.NamaTopping, '')) = '' OR NEW.BiayaPerDonat < 0 OR NEW.IsActive NOT IN (0, 1)
            BEGIN
                SELECT RAISE(ABORT, 'Data topping tidak valid');
            END;

            CREATE TRIGGER trg_produksi_validate_insert
            BEFORE INSERT ON ProduksiSetting
            WHEN NEW.JumlahDonatDihasilkan <= 0 OR NEW.BeratPerDonat <= 0 OR NEW.WastePersen < 0 OR NEW.WastePersen > 99 OR NEW.TargetProfitPersen < 1 OR NEW.TargetProfitPersen > 95 OR NEW.HariProduksiPerBulan < 1 OR NEW.HariProduksiPerBulan > 31
            BEGIN
                SELECT RAISE(ABORT, 'Pengaturan produksi tidak valid');
            END;

            CREATE TRIGGER trg_produksi_validate_update
            BEFORE UPDATE ON ProduksiSetting
            WHEN NEW.JumlahDonatDihasilkan <= 0 OR NEW.BeratPerDonat <= 0 OR NEW.WastePersen < 0 OR NEW.WastePersen > 99 OR NEW.TargetProfitPersen < 1 OR NEW.TargetProfitPersen > 95 OR NEW.HariProduksiPerBulan < 1 OR NEW.HariProduksiPerBulan > 31
            BEGIN
                SELECT RAISE(ABORT, 'Pengaturan produksi tidak valid');
            END;

            CREATE TRIGGER trg_varian_validate_insert
            BEFORE INSERT ON ResepVarian
            WHEN TRIM(COALESCE(NEW.NamaVarian, '')) = '' OR NEW.IsActive NOT IN (0, 1)
            BEGIN
                SELECT RAISE(ABORT, 'Data varian tidak valid');
            END;

            CREATE TRIGGER trg_varian_validate_update
            BEFORE UPDATE ON ResepVarian
            WHEN TRIM(COALESCE(NEW.NamaVarian, '')) = '' OR NEW.IsActive NOT IN (0, 1)
            BEGIN
                SELECT RAISE(ABORT, 'Data varian tidak valid');
            END;
            "#,
        )?;
        Ok(())
    }
}
