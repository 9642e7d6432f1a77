#![no_main]

use libfuzzer_sys::fuzz_target;
use udplog_ingest::extract_syslog;

fuzz_target!(|line: &str| {
    if let Some(parsed) = extract_syslog(line) {
        assert!(parsed.facility <= 23);
        assert!(parsed.severity <= 7);
        assert!(line.ends_with(parsed.message));
    }
});
