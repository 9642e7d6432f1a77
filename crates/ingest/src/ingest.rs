//! 수집 루프 -- UDP 소켓을 소유하고 데이터그램을 하나씩 처리합니다.
//!
//! # 반복 단위
//! 1. 종료 토큰 확인 (논블로킹). 취소되었으면 종료
//! 2. `max_message_size` 버퍼로 한 번 수신 (초과분은 OS가 잘라냄)
//! 3. 타임아웃이면 로그 후 다음 반복
//! 4. 그 외 소켓 에러는 루프 종료 후 전파
//! 5. 데이터그램을 [`DatagramProcessor`]에 동기적으로 넘긴 뒤 다음 수신
//!    (길이 0인 데이터그램은 처리기가 `empty` 사유로 드롭하며 카운터는 그대로)
//!
//! 종료 신호는 반복 사이에서만 관찰됩니다. 수신 대기 중인 루프는 데이터그램이
//! 도착하거나, 수신 타임아웃이 지나거나, 태스크가 중단(소켓 해제)될 때까지
//! 신호를 보지 못합니다.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use udplog_core::metrics as m;
use udplog_core::pipeline::Publisher;

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::processor::{DatagramProcessor, IngestStats, RawDatagram};
use crate::schema::SchemaRegistry;

/// UDP 수집 루프
///
/// # 사용 예시
/// ```ignore
/// let shutdown = CancellationToken::new();
/// let mut ingest = IngestionLoop::bind(&config, registry, publisher, shutdown.clone()).await?;
/// let handle = tokio::spawn(async move { ingest.run().await });
/// // ...
/// shutdown.cancel();
/// ```
pub struct IngestionLoop<P> {
    socket: UdpSocket,
    local_addr: SocketAddr,
    buffer: Vec<u8>,
    recv_timeout: Option<Duration>,
    shutdown: CancellationToken,
    processor: DatagramProcessor<P>,
}

impl<P: Publisher> IngestionLoop<P> {
    /// 설정된 주소에 소켓을 바인드하고 루프를 생성합니다.
    ///
    /// # Errors
    /// - 설정 검증 실패: [`IngestError::Config`]
    /// - 바인드 실패: [`IngestError::Bind`]
    pub async fn bind(
        config: &IngestConfig,
        registry: Arc<SchemaRegistry>,
        publisher: P,
        shutdown: CancellationToken,
    ) -> Result<Self, IngestError> {
        config.validate()?;

        let socket = UdpSocket::bind((config.listen_host.as_str(), config.port))
            .await
            .map_err(|source| IngestError::Bind {
                addr: config.bind_addr(),
                source,
            })?;

        Self::from_socket(socket, config, registry, publisher, shutdown)
    }

    /// 이미 바인드된 소켓으로 루프를 생성합니다.
    pub fn from_socket(
        socket: UdpSocket,
        config: &IngestConfig,
        registry: Arc<SchemaRegistry>,
        publisher: P,
        shutdown: CancellationToken,
    ) -> Result<Self, IngestError> {
        config.validate()?;
        let local_addr = socket.local_addr().map_err(IngestError::Socket)?;

        Ok(Self {
            socket,
            local_addr,
            buffer: vec![0u8; config.max_message_size],
            recv_timeout: config.recv_timeout(),
            shutdown,
            processor: DatagramProcessor::new(config, registry, publisher),
        })
    }

    /// 실제로 바인드된 로컬 주소
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// 처리기 참조
    pub fn processor(&self) -> &DatagramProcessor<P> {
        &self.processor
    }

    /// 마지막으로 찍힌 카운터 값
    pub fn counter(&self) -> u64 {
        self.processor.counter()
    }

    /// 처리 통계
    pub fn stats(&self) -> &IngestStats {
        self.processor.stats()
    }

    /// 종료 토큰 복사본
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 종료 신호를 받거나 치명적 소켓 에러가 날 때까지 수신합니다.
    pub async fn run(&mut self) -> Result<(), IngestError> {
        tracing::info!(
            addr = %self.local_addr,
            max_message_size = self.buffer.len(),
            recv_timeout_ms = self.recv_timeout.map_or(0, |t| t.as_millis() as u64),
            publisher = self.processor.publisher().name(),
            "ingestion loop started"
        );

        loop {
            if self.shutdown.is_cancelled() {
                tracing::info!(
                    counter = self.processor.counter(),
                    "shutdown requested, ingestion loop stopped"
                );
                return Ok(());
            }

            let (len, source) = match self.receive().await {
                Ok(Some(received)) => received,
                Ok(None) => {
                    tracing::debug!(addr = %self.local_addr, "receive timed out");
                    metrics::counter!(m::INGEST_SOCKET_TIMEOUTS_TOTAL).increment(1);
                    continue;
                }
                Err(e) => {
                    tracing::error!(addr = %self.local_addr, error = %e, "fatal socket error");
                    return Err(IngestError::Socket(e));
                }
            };

            let datagram = RawDatagram::new(Bytes::copy_from_slice(&self.buffer[..len]), source);
            self.processor.process(&datagram);
        }
    }

    /// 한 번 수신합니다. 타임아웃이면 `Ok(None)`.
    async fn receive(&mut self) -> io::Result<Option<(usize, SocketAddr)>> {
        let recv = self.socket.recv_from(&mut self.buffer);
        let result = match self.recv_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, recv).await {
                Ok(result) => result,
                Err(_elapsed) => return Ok(None),
            },
            None => recv.await,
        };

        classify_recv(result)
    }
}

/// 수신 결과를 분류합니다.
///
/// `TimedOut`/`WouldBlock`은 타임아웃(`Ok(None)`)이고 그 외 에러는 치명적입니다.
fn classify_recv(
    result: io::Result<(usize, SocketAddr)>,
) -> io::Result<Option<(usize, SocketAddr)>> {
    match result {
        Ok(received) => Ok(Some(received)),
        Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
