#![no_main]

use libfuzzer_sys::fuzz_target;
use netsentry_collector::snmp::codec::{decode_message, decode_response};

fuzz_target!(|data: &[u8]| {
    // 임의 바이트열에서도 패닉 없이 Err을 반환해야 한다
    let _ = decode_message(data);
    let _ = decode_response(data);
});
