//! 파이프라인 trait -- 이벤트 퍼블리셔 확장 포인트

use std::sync::Arc;

use crate::event::Event;

/// 이벤트 퍼블리셔 trait
///
/// 완성된 이벤트를 하위 전송 계층으로 넘깁니다. 호출은 fire-and-forget이며,
/// 전송 실패·재시도·배압은 구현체가 스스로 처리합니다 (로그와 메트릭으로만 노출).
pub trait Publisher: Send + Sync {
    /// 퍼블리셔 이름
    fn name(&self) -> &str;

    /// 이벤트를 하위로 전달
    fn publish(&self, event: Event);
}

impl<P: Publisher + ?Sized> Publisher for Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn publish(&self, event: Event) {
        (**self).publish(event)
    }
}

impl<P: Publisher + ?Sized> Publisher for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn publish(&self, event: Event) {
        (**self).publish(event)
    }
}
