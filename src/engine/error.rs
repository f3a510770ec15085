// ==========================================
// 甜甜圈成本核算系统 - 状态引擎错误类型
// ==========================================
// 说明: 引擎层操作错误；持久化错误经 From 透传
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("服务已释放，拒绝后续操作")]
    Disposed,

    #[error("服务尚未初始化")]
    NotInitialized,

    #[error("最后一个变体不可删除")]
    LastVariant,

    #[error("变体不存在: {0}")]
    VarianNotFound(i64),

    #[error("原料不存在: {0}")]
    BahanNotFound(i64),

    #[error("持久化错误: {0}")]
    Repository(#[from] RepositoryError),
}

pub type StateResult<T> = Result<T, StateError>;
