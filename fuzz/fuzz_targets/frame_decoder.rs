#![no_main]

use libfuzzer_sys::fuzz_target;
use udplog_ingest::{decode, decode_syslog_only};

fuzz_target!(|data: &[u8]| {
    // 어떤 바이트열이든 패닉 없이 Ok 또는 Err을 반환해야 한다
    if let Ok(frame) = decode(data) {
        assert!(!frame.event_type().is_empty());
        assert!(!frame.payload().is_empty());
    }

    if let Ok(frame) = decode_syslog_only(data) {
        assert_eq!(frame.event_type(), "syslog");
    }
});
