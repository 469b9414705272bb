#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use netsentry_collector::parser::SyslogNormalizer;
use netsentry_core::event::RawSyslogMessage;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    source_ip: String,
    text: String,
    filtering: bool,
}

fuzz_target!(|input: FuzzInput| {
    let Ok(normalizer) = SyslogNormalizer::with_defaults(8192) else {
        return;
    };
    let normalizer = normalizer.with_filtering(input.filtering);
    let message = RawSyslogMessage::new(input.source_ip, input.text);

    // 크래시나 패닉 없이 Ok 또는 Err을 반환해야 한다
    if let Ok(Some(event)) = normalizer.normalize(&message) {
        assert_eq!(event.raw_message, message.text);
    }
});
