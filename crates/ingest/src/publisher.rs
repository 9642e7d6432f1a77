//! 퍼블리셔 어댑터 -- 완성된 이벤트를 하위 전송 계층으로 넘깁니다.
//!
//! - [`ChannelPublisher`]: tokio mpsc 채널로 전달 (가득 차면 드롭)
//! - [`JsonLinesPublisher`]: 한 줄짜리 JSON 문서로 `Write` 대상에 기록
//! - [`CollectingPublisher`]: 메모리에 보관 (테스트, 검증 모드)
//!
//! 모든 어댑터는 fire-and-forget입니다. 실패는 로그와 메트릭으로만 드러나고
//! 수집 루프로 전파되지 않습니다.

use std::io::Write;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::mpsc;

use udplog_core::event::Event;
use udplog_core::metrics as m;
use udplog_core::pipeline::Publisher;

/// 뮤텍스가 오염되어도 내부 값을 계속 사용합니다.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn record_failure(publisher: &str, counter: u64, reason: &str) {
    tracing::warn!(publisher, counter, reason, "failed to publish event");
    metrics::counter!(
        m::PUBLISHER_FAILURES_TOTAL,
        m::LABEL_PUBLISHER => publisher.to_owned()
    )
    .increment(1);
}

/// mpsc 채널 퍼블리셔
///
/// 수집 루프를 막지 않도록 `try_send`를 사용합니다.
pub struct ChannelPublisher {
    tx: mpsc::Sender<Event>,
}

impl ChannelPublisher {
    /// 기존 송신측으로 퍼블리셔를 생성합니다.
    pub fn new(tx: mpsc::Sender<Event>) -> Self {
        Self { tx }
    }

    /// 지정한 용량의 채널을 만들고 퍼블리셔와 수신측을 반환합니다.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

impl Publisher for ChannelPublisher {
    fn name(&self) -> &str {
        "channel"
    }

    fn publish(&self, event: Event) {
        let counter = event.counter;
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                record_failure(self.name(), counter, "channel full");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                record_failure(self.name(), counter, "channel closed");
            }
        }
    }
}

/// JSON Lines 퍼블리셔
///
/// 이벤트마다 한 줄을 쓰고 즉시 flush 합니다.
pub struct JsonLinesPublisher<W> {
    name: String,
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesPublisher<W> {
    /// 새 퍼블리셔를 생성합니다. `name`은 로그와 메트릭 레이블에 쓰입니다.
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer: Mutex::new(writer),
        }
    }

    /// 내부 writer를 돌려받습니다.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl JsonLinesPublisher<std::io::Stdout> {
    /// 표준 출력 퍼블리셔
    pub fn stdout() -> Self {
        Self::new("stdout", std::io::stdout())
    }
}

impl<W: Write + Send> Publisher for JsonLinesPublisher<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, event: Event) {
        let line = match event.to_json_line() {
            Ok(line) => line,
            Err(e) => {
                record_failure(&self.name, event.counter, &e.to_string());
                return;
            }
        };

        let mut writer = lock(&self.writer);
        let result = writeln!(writer, "{line}").and_then(|()| writer.flush());
        if let Err(e) = result {
            record_failure(&self.name, event.counter, &e.to_string());
        }
    }
}

/// 메모리 수집 퍼블리셔
#[derive(Default)]
pub struct CollectingPublisher {
    events: Mutex<Vec<Event>>,
}

impl CollectingPublisher {
    /// 빈 퍼블리셔를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 지금까지 받은 이벤트의 복사본
    pub fn events(&self) -> Vec<Event> {
        lock(&self.events).clone()
    }

    /// 받은 이벤트 수
    pub fn len(&self) -> usize {
        lock(&self.events).len()
    }

    /// 받은 이벤트가 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        lock(&self.events).is_empty()
    }

    /// 받은 이벤트를 모두 꺼냅니다.
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *lock(&self.events))
    }
}

impl Publisher for CollectingPublisher {
    fn name(&self) -> &str {
        "collecting"
    }

    fn publish(&self, event: Event) {
        lock(&self.events).push(event);
    }
}
