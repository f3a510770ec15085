// ==========================================
// 甜甜圈成本核算系统 - 配方变体仓储
// ==========================================
// 表: ResepVarian (Id, NamaVarian UNIQUE, IsActive)
// 约定: set_active 用单条 UPDATE 翻转全表，保证恰好一个激活
// ==========================================

use crate::domain::ResepVarian;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

fn map_row(row: &Row) -> rusqlite::Result<ResepVarian> {
    let is_active: i64 = row.get("IsActive")?;
    Ok(ResepVarian {
        id: row.get("Id")?,
        nama_varian: row.get("NamaVarian")?,
        is_active: is_active != 0,
    })
}

pub struct VarianRepository {
    conn: Arc<Mutex<Connection>>,
}

impl VarianRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<ResepVarian>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT Id, NamaVarian, IsActive FROM ResepVarian ORDER BY Id")?;
        let rows = stmt.query_map([], map_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// 插入并返回带新 Id 的实体
    pub fn insert(&self, varian: &ResepVarian) -> RepositoryResult<ResepVarian> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO ResepVarian (NamaVarian, IsActive) VALUES (?1, ?2)",
            params![varian.nama_varian, varian.is_active as i64],
        )?;

        let mut inserted = varian.clone();
        inserted.id = conn.last_insert_rowid();
        Ok(inserted)
    }

    pub fn rename(&self, id: i64, nama_varian: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "UPDATE ResepVarian SET NamaVarian = ?1 WHERE Id = ?2",
            params![nama_varian, id],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ResepVarian".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 激活指定变体并同时取消其余全部变体
    ///
    /// 单条 UPDATE 原子完成，库中任何时刻都不会出现
    /// 零个或多个激活变体的中间态
    pub fn set_active(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "UPDATE ResepVarian SET IsActive = CASE WHEN Id = ?1 THEN 1 ELSE 0 END",
            params![id],
        )?;
        Ok(())
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM ResepVarian WHERE Id = ?1", params![id])?;
        Ok(())
    }
}
