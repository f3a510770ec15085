// ==========================================
// 甜甜圈成本核算系统 - 引擎层事件发布
// ==========================================
// 职责: 定义状态事件发布 trait，实现依赖倒置
// 说明: Engine 层定义 trait，外层（UI 绑定）实现适配器
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 状态事件类型
// ==========================================

/// 状态事件触发类型
///
/// Engine 层定义的事件类型，用于通知观察者（UI 绑定层）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateEventKind {
    /// 初始化完成
    Initialized,
    /// 重算完成（派生输出已整体覆盖）
    Recalculated,
    /// 激活变体已切换
    VariantSwitched,
    /// 一次持久化写入成功落库
    SaveCompleted,
    /// 一次持久化写入失败（内存编辑保留）
    SaveFailed,
}

impl StateEventKind {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            StateEventKind::Initialized => "Initialized",
            StateEventKind::Recalculated => "Recalculated",
            StateEventKind::VariantSwitched => "VariantSwitched",
            StateEventKind::SaveCompleted => "SaveCompleted",
            StateEventKind::SaveFailed => "SaveFailed",
        }
    }
}

/// 状态事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateEvent {
    /// 事件类型
    pub kind: StateEventKind,
    /// 事件来源描述（操作名）
    pub source: Option<String>,
    /// 关联实体 ID（如适用）
    pub entity_id: Option<i64>,
}

impl StateEvent {
    pub fn new(kind: StateEventKind, source: Option<String>) -> Self {
        Self {
            kind,
            source,
            entity_id: None,
        }
    }

    /// 创建携带实体 ID 的事件
    pub fn for_entity(kind: StateEventKind, source: Option<String>, entity_id: i64) -> Self {
        Self {
            kind,
            source,
            entity_id: Some(entity_id),
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 状态事件发布者 Trait
///
/// Engine 层定义，UI 绑定层实现
/// 通过 trait 实现依赖倒置，Engine 不依赖任何展示技术
///
/// # 参数
/// - `event`: 状态事件
///
/// # 返回
/// - `Ok(())`: 发布成功
/// - `Err`: 发布失败（引擎仅记录日志，不中断操作）
pub trait StateEventPublisher: Send + Sync {
    fn publish(&self, event: StateEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
///
/// 用于不需要事件发布的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl StateEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: StateEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - kind={}",
            event.kind.as_str()
        );
        Ok(())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn StateEventPublisher>> 的使用
#[derive(Clone)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn StateEventPublisher>>,
}

impl OptionalEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn StateEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布事件）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）
    ///
    /// 发布失败只记日志，永不向调用方传播
    pub fn publish(&self, event: StateEvent) {
        let Some(publisher) = &self.inner else {
            tracing::trace!(
                "OptionalEventPublisher: 未配置发布者，跳过事件 - kind={}",
                event.kind.as_str()
            );
            return;
        };

        let kind = event.kind.as_str().to_string();
        if let Err(e) = publisher.publish(event) {
            tracing::warn!("事件发布失败 - kind={}, error={}", kind, e);
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingPublisher {
        events: Mutex<Vec<StateEventKind>>,
    }

    impl StateEventPublisher for RecordingPublisher {
        fn publish(&self, event: StateEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
            self.events.lock().unwrap().push(event.kind);
            Ok(())
        }
    }

    #[test]
    fn test_event_for_entity() {
        let event = StateEvent::for_entity(
            StateEventKind::SaveCompleted,
            Some("edit_bahan".to_string()),
            7,
        );

        assert_eq!(event.kind, StateEventKind::SaveCompleted);
        assert_eq!(event.entity_id, Some(7));
    }

    // 事件经 JSON 跨越 UI 绑定边界
    #[test]
    fn test_event_serializes_to_json() {
        let event = StateEvent::for_entity(
            StateEventKind::VariantSwitched,
            Some("pilih_varian".to_string()),
            3,
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "VariantSwitched");
        assert_eq!(json["entity_id"], 3);
    }

    #[test]
    fn test_noop_publisher() {
        let publisher = NoOpEventPublisher;
        let event = StateEvent::new(StateEventKind::Recalculated, None);
        assert!(publisher.publish(event).is_ok());
    }

    #[test]
    fn test_optional_publisher_none() {
        let publisher = OptionalEventPublisher::none();
        assert!(!publisher.is_configured());
        publisher.publish(StateEvent::new(StateEventKind::Initialized, None));
    }

    #[test]
    fn test_optional_publisher_delivers() {
        let recorder = Arc::new(RecordingPublisher {
            events: Mutex::new(Vec::new()),
        });
        let publisher =
            OptionalEventPublisher::with_publisher(recorder.clone() as Arc<dyn StateEventPublisher>);
        assert!(publisher.is_configured());

        publisher.publish(StateEvent::new(StateEventKind::VariantSwitched, None));
        publisher.publish(StateEvent::new(StateEventKind::Recalculated, None));

        let events = recorder.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![StateEventKind::VariantSwitched, StateEventKind::Recalculated]
        );
    }
}
