//! SNMP v2c BER 코덱
//!
//! GET 요청 인코딩과 메시지 디코딩을 지원합니다.
//!
//! ```text
//! Message   ::= SEQUENCE { version INTEGER, community OCTET STRING, pdu }
//! pdu       ::= [A0..A3] { request-id, error-status, error-index, varbinds }
//! varbinds  ::= SEQUENCE OF SEQUENCE { name OID, value ANY }
//! ```
//!
//! 디코더는 입력 경계를 넘어서 읽지 않으며, 잘못된 입력은 항상
//! [`CollectorError::Codec`]으로 보고합니다.

use std::net::Ipv4Addr;

use bytes::{BufMut, Bytes, BytesMut};

use super::value::{Absence, Oid, SnmpValue};
use crate::error::CollectorError;

/// SNMP v2c 버전 번호
pub const VERSION_2C: i64 = 1;

// ─── BER 태그 ────────────────────────────────────────────────────────

pub const TAG_INTEGER: u8 = 0x02;
pub const TAG_OCTET_STRING: u8 = 0x04;
pub const TAG_NULL: u8 = 0x05;
pub const TAG_OID: u8 = 0x06;
pub const TAG_SEQUENCE: u8 = 0x30;
pub const TAG_IP_ADDRESS: u8 = 0x40;
pub const TAG_COUNTER32: u8 = 0x41;
pub const TAG_GAUGE32: u8 = 0x42;
pub const TAG_TIMETICKS: u8 = 0x43;
pub const TAG_COUNTER64: u8 = 0x46;
pub const TAG_NO_SUCH_OBJECT: u8 = 0x80;
pub const TAG_NO_SUCH_INSTANCE: u8 = 0x81;
pub const TAG_END_OF_MIB_VIEW: u8 = 0x82;
pub const TAG_GET_REQUEST: u8 = 0xA0;
pub const TAG_GET_NEXT_REQUEST: u8 = 0xA1;
pub const TAG_GET_RESPONSE: u8 = 0xA2;
pub const TAG_SET_REQUEST: u8 = 0xA3;

/// 디코딩된 메시지
#[derive(Debug, Clone, PartialEq)]
pub struct SnmpMessage {
    /// PDU 태그 (0xA0 GET, 0xA2 response 등)
    pub pdu_type: u8,
    pub version: i64,
    pub community: Vec<u8>,
    pub request_id: i32,
    pub error_status: i64,
    pub error_index: i64,
    pub varbinds: Vec<(Oid, SnmpValue)>,
}

// ─── 인코딩 ──────────────────────────────────────────────────────────

/// 단일 OID에 대한 GET 요청 메시지를 인코딩합니다.
pub fn encode_get_request(community: &str, request_id: i32, oid: &Oid) -> Bytes {
    let mut varbind = BytesMut::new();
    put_tlv(&mut varbind, TAG_OID, &encode_oid(oid));
    put_tlv(&mut varbind, TAG_NULL, &[]);

    let mut varbind_list = BytesMut::new();
    put_tlv(&mut varbind_list, TAG_SEQUENCE, &varbind);

    let mut pdu = BytesMut::new();
    put_tlv(&mut pdu, TAG_INTEGER, &encode_integer(i64::from(request_id)));
    put_tlv(&mut pdu, TAG_INTEGER, &encode_integer(0));
    put_tlv(&mut pdu, TAG_INTEGER, &encode_integer(0));
    put_tlv(&mut pdu, TAG_SEQUENCE, &varbind_list);

    let mut message = BytesMut::new();
    put_tlv(&mut message, TAG_INTEGER, &encode_integer(VERSION_2C));
    put_tlv(&mut message, TAG_OCTET_STRING, community.as_bytes());
    put_tlv(&mut message, TAG_GET_REQUEST, &pdu);

    let mut out = BytesMut::with_capacity(message.len() + 4);
    put_tlv(&mut out, TAG_SEQUENCE, &message);
    out.freeze()
}

fn put_tlv(buf: &mut BytesMut, tag: u8, content: &[u8]) {
    buf.put_u8(tag);
    put_length(buf, content.len());
    buf.put_slice(content);
}

fn put_length(buf: &mut BytesMut, len: usize) {
    if len < 0x80 {
        buf.put_u8(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    let significant = &bytes[skip..];
    buf.put_u8(0x80 | significant.len() as u8);
    buf.put_slice(significant);
}

/// 최소 길이 2의 보수 표현
fn encode_integer(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant_zero = bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0;
        let redundant_ff = bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0;
        if !(redundant_zero || redundant_ff) {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

fn encode_oid(oid: &Oid) -> Vec<u8> {
    let arcs = oid.arcs();
    let mut out = Vec::with_capacity(arcs.len() + 2);
    // from_arcs가 최소 2개 arc와 범위를 보장함
    let first = u64::from(arcs[0]) * 40 + u64::from(arcs[1]);
    put_base128(&mut out, first);
    for arc in &arcs[2..] {
        put_base128(&mut out, u64::from(*arc));
    }
    out
}

fn put_base128(out: &mut Vec<u8>, mut value: u64) {
    let mut stack = [0u8; 10];
    let mut n = 0;
    loop {
        stack[n] = (value & 0x7F) as u8;
        n += 1;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let continuation = if i == 0 { 0 } else { 0x80 };
        out.push(stack[i] | continuation);
    }
}

// ─── 디코딩 ──────────────────────────────────────────────────────────

/// 응답 메시지를 디코딩합니다. response 이외의 PDU는 에러입니다.
pub fn decode_response(buf: &[u8]) -> Result<SnmpMessage, CollectorError> {
    let message = decode_message(buf)?;
    if message.pdu_type != TAG_GET_RESPONSE {
        return Err(CollectorError::Codec {
            offset: 0,
            reason: format!("expected response PDU, found tag 0x{:02x}", message.pdu_type),
        });
    }
    Ok(message)
}

/// GET/GETNEXT/response/SET 메시지를 디코딩합니다.
pub fn decode_message(buf: &[u8]) -> Result<SnmpMessage, CollectorError> {
    let mut outer = Reader::new(buf, 0);
    let mut message = outer.expect(TAG_SEQUENCE)?;

    let version = message.read_integer()?;
    let community = message.expect(TAG_OCTET_STRING)?.rest().to_vec();

    let (pdu_type, mut pdu) = message.read_tlv()?;
    if !(TAG_GET_REQUEST..=TAG_SET_REQUEST).contains(&pdu_type) {
        return Err(pdu.error(format!("unsupported PDU tag 0x{pdu_type:02x}")));
    }

    let raw_request_id = pdu.read_integer()?;
    let request_id = i32::try_from(raw_request_id)
        .map_err(|_| pdu.error(format!("request id {raw_request_id} out of range")))?;
    let error_status = pdu.read_integer()?;
    let error_index = pdu.read_integer()?;

    let mut list = pdu.expect(TAG_SEQUENCE)?;
    let mut varbinds = Vec::new();
    while !list.is_empty() {
        let mut varbind = list.expect(TAG_SEQUENCE)?;
        let name_reader = varbind.expect(TAG_OID)?;
        let name = decode_oid(&name_reader)?;
        let (tag, content) = varbind.read_tlv()?;
        varbinds.push((name, decode_value(tag, &content)?));
    }

    Ok(SnmpMessage {
        pdu_type,
        version,
        community,
        request_id,
        error_status,
        error_index,
        varbinds,
    })
}

/// 태그와 내용으로 값을 디코딩합니다. 알 수 없는 태그는 부재 값이 됩니다.
fn decode_value(tag: u8, content: &Reader<'_>) -> Result<SnmpValue, CollectorError> {
    let value = match tag {
        TAG_INTEGER => {
            let n = content.as_signed()?;
            SnmpValue::Integer(
                i32::try_from(n).map_err(|_| content.error(format!("integer {n} out of range")))?,
            )
        }
        TAG_OCTET_STRING => SnmpValue::OctetString(content.rest().to_vec()),
        TAG_NULL => SnmpValue::Absent(Absence::Null),
        TAG_OID => SnmpValue::ObjectIdentifier(decode_oid(content)?),
        TAG_IP_ADDRESS => {
            let octets: [u8; 4] = content
                .rest()
                .try_into()
                .map_err(|_| content.error("IpAddress must be 4 bytes"))?;
            SnmpValue::IpAddress(Ipv4Addr::from(octets))
        }
        TAG_COUNTER32 => SnmpValue::Counter32(content.as_u32()?),
        TAG_GAUGE32 => SnmpValue::Gauge32(content.as_u32()?),
        TAG_TIMETICKS => SnmpValue::TimeTicks(content.as_u32()?),
        TAG_COUNTER64 => SnmpValue::Counter64(content.as_unsigned()?),
        TAG_NO_SUCH_OBJECT => SnmpValue::Absent(Absence::NoSuchObject),
        TAG_NO_SUCH_INSTANCE => SnmpValue::Absent(Absence::NoSuchInstance),
        TAG_END_OF_MIB_VIEW => SnmpValue::Absent(Absence::EndOfMibView),
        other => SnmpValue::Absent(Absence::Unsupported(other)),
    };
    Ok(value)
}

fn decode_oid(content: &Reader<'_>) -> Result<Oid, CollectorError> {
    let bytes = content.rest();
    if bytes.is_empty() {
        return Err(content.error("empty OID"));
    }

    let mut arcs = Vec::new();
    let mut acc: u64 = 0;
    let mut pending = false;
    for byte in bytes {
        // 첫 subidentifier는 2.(u32::MAX)까지 인코딩하므로 80만큼 더 큽니다.
        let limit = if arcs.is_empty() {
            u64::from(u32::MAX) + 80
        } else {
            u64::from(u32::MAX)
        };
        acc = (acc << 7) | u64::from(byte & 0x7F);
        if acc > limit {
            return Err(content.error("OID arc overflow"));
        }
        pending = byte & 0x80 != 0;
        if !pending {
            if arcs.is_empty() {
                let (first, second) = match acc {
                    0..=39 => (0, acc),
                    40..=79 => (1, acc - 40),
                    _ => (2, acc - 80),
                };
                arcs.push(first);
                arcs.push(
                    u32::try_from(second).map_err(|_| content.error("OID arc overflow"))?,
                );
            } else {
                arcs.push(u32::try_from(acc).map_err(|_| content.error("OID arc overflow"))?);
            }
            acc = 0;
        }
    }
    if pending {
        return Err(content.error("truncated OID arc"));
    }

    Oid::from_arcs(arcs).map_err(|e| content.error(e.to_string()))
}

/// 경계가 있는 BER 리더
///
/// `base`는 전체 메시지 기준 오프셋으로, 에러 위치 보고에 사용됩니다.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8], base: usize) -> Self {
        Self { buf, pos: 0, base }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos.min(self.buf.len())..]
    }

    fn error(&self, reason: impl Into<String>) -> CollectorError {
        CollectorError::Codec {
            offset: self.base + self.pos,
            reason: reason.into(),
        }
    }

    fn read_byte(&mut self) -> Result<u8, CollectorError> {
        let byte = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| self.error("unexpected end of input"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_length(&mut self) -> Result<usize, CollectorError> {
        let first = self.read_byte()?;
        if first & 0x80 == 0 {
            return Ok(usize::from(first));
        }
        let count = usize::from(first & 0x7F);
        if count == 0 || count > 4 {
            return Err(self.error(format!("unsupported length encoding 0x{first:02x}")));
        }
        let mut len = 0usize;
        for _ in 0..count {
            len = (len << 8) | usize::from(self.read_byte()?);
        }
        Ok(len)
    }

    /// 다음 TLV를 읽어 (태그, 내용 리더)를 반환합니다.
    fn read_tlv(&mut self) -> Result<(u8, Reader<'a>), CollectorError> {
        let tag = self.read_byte()?;
        let len = self.read_length()?;
        let start = self.pos;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| self.error(format!("length {len} exceeds remaining input")))?;
        self.pos = end;
        Ok((tag, Reader::new(&self.buf[start..end], self.base + start)))
    }

    fn expect(&mut self, expected: u8) -> Result<Reader<'a>, CollectorError> {
        let offset = self.pos;
        let (tag, content) = self.read_tlv()?;
        if tag != expected {
            return Err(CollectorError::Codec {
                offset: self.base + offset,
                reason: format!("expected tag 0x{expected:02x}, found 0x{tag:02x}"),
            });
        }
        Ok(content)
    }

    fn read_integer(&mut self) -> Result<i64, CollectorError> {
        self.expect(TAG_INTEGER)?.as_signed()
    }

    fn as_signed(&self) -> Result<i64, CollectorError> {
        let bytes = self.rest();
        if bytes.is_empty() || bytes.len() > 8 {
            return Err(self.error(format!("invalid integer length {}", bytes.len())));
        }
        let mut value: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
        for byte in bytes {
            value = (value << 8) | i64::from(*byte);
        }
        Ok(value)
    }

    fn as_unsigned(&self) -> Result<u64, CollectorError> {
        let bytes = self.rest();
        if bytes.is_empty() {
            return Err(self.error("empty unsigned integer"));
        }
        let skip = bytes.iter().take_while(|b| **b == 0).count().min(bytes.len() - 1);
        let significant = &bytes[skip..];
        if significant.len() > 8 {
            return Err(self.error("unsigned integer exceeds 64 bits"));
        }
        Ok(significant
            .iter()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)))
    }

    fn as_u32(&self) -> Result<u32, CollectorError> {
        let value = self.as_unsigned()?;
        u32::try_from(value).map_err(|_| self.error(format!("value {value} exceeds 32 bits")))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 테스트용 응답 메시지 인코더
    pub(crate) fn encode_response(
        request_id: i32,
        error_status: i64,
        varbinds: &[(Oid, u8, Vec<u8>)],
    ) -> Vec<u8> {
        let mut list = BytesMut::new();
        for (oid, tag, content) in varbinds {
            let mut vb = BytesMut::new();
            put_tlv(&mut vb, TAG_OID, &encode_oid(oid));
            put_tlv(&mut vb, *tag, content);
            put_tlv(&mut list, TAG_SEQUENCE, &vb);
        }

        let mut pdu = BytesMut::new();
        put_tlv(&mut pdu, TAG_INTEGER, &encode_integer(i64::from(request_id)));
        put_tlv(&mut pdu, TAG_INTEGER, &encode_integer(error_status));
        put_tlv(&mut pdu, TAG_INTEGER, &encode_integer(0));
        put_tlv(&mut pdu, TAG_SEQUENCE, &list);

        let mut message = BytesMut::new();
        put_tlv(&mut message, TAG_INTEGER, &encode_integer(VERSION_2C));
        put_tlv(&mut message, TAG_OCTET_STRING, b"public");
        put_tlv(&mut message, TAG_GET_RESPONSE, &pdu);

        let mut out = BytesMut::new();
        put_tlv(&mut out, TAG_SEQUENCE, &message);
        out.to_vec()
    }

    fn oid(s: &str) -> Oid {
        s.parse().unwrap()
    }

    fn decode_single(tag: u8, content: Vec<u8>) -> SnmpValue {
        let bytes = encode_response(1, 0, &[(oid("1.3.6.1.2.1.1.3.0"), tag, content)]);
        let response = decode_response(&bytes).unwrap();
        response.varbinds.into_iter().next().unwrap().1
    }

    #[test]
    fn get_request_has_expected_layout() {
        let bytes = encode_get_request("public", 0x1234, &oid("1.3.6.1.2.1.1.1.0"));
        let expected: &[u8] = &[
            0x30, 0x27, // message
            0x02, 0x01, 0x01, // version 2c
            0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', // community
            0xA0, 0x1A, // GetRequest
            0x02, 0x02, 0x12, 0x34, // request-id
            0x02, 0x01, 0x00, // error-status
            0x02, 0x01, 0x00, // error-index
            0x30, 0x0E, // varbind list
            0x30, 0x0C, // varbind
            0x06, 0x08, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00, // OID
            0x05, 0x00, // NULL
        ];
        assert_eq!(bytes.as_ref(), expected);
    }

    #[test]
    fn integer_encoding_is_minimal() {
        assert_eq!(encode_integer(0), vec![0x00]);
        assert_eq!(encode_integer(127), vec![0x7F]);
        assert_eq!(encode_integer(128), vec![0x00, 0x80]);
        assert_eq!(encode_integer(-1), vec![0xFF]);
        assert_eq!(encode_integer(-129), vec![0xFF, 0x7F]);
    }

    #[test]
    fn long_form_length() {
        let mut buf = BytesMut::new();
        put_length(&mut buf, 300);
        assert_eq!(buf.as_ref(), &[0x82, 0x01, 0x2C]);
    }

    #[test]
    fn oid_with_large_arc_roundtrips_through_encoder() {
        let original = oid("1.3.6.1.4.1.2021.10.1.3.1");
        let encoded = encode_oid(&original);
        let decoded = decode_oid(&Reader::new(&encoded, 0)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn joint_iso_arc_splits_off_eighty() {
        // 2.999 -> 999 + 80 = 1079
        let decoded = decode_oid(&Reader::new(&[0x88, 0x37], 0)).unwrap();
        assert_eq!(decoded.arcs(), &[2, 999]);
    }

    #[test]
    fn first_subidentifier_bound_depends_on_joint_iso_arc() {
        let mut widest = Vec::new();
        put_base128(&mut widest, u64::from(u32::MAX) + 80);
        put_base128(&mut widest, u64::from(u32::MAX));
        let decoded = decode_oid(&Reader::new(&widest, 0)).unwrap();
        assert_eq!(decoded.arcs(), &[2, u32::MAX, u32::MAX]);

        let mut first_too_wide = Vec::new();
        put_base128(&mut first_too_wide, u64::from(u32::MAX) + 81);
        let err = decode_oid(&Reader::new(&first_too_wide, 0)).unwrap_err();
        assert!(err.to_string().contains("overflow"), "got: {err}");

        let mut later_too_wide = vec![0x2B];
        put_base128(&mut later_too_wide, u64::from(u32::MAX) + 1);
        assert!(decode_oid(&Reader::new(&later_too_wide, 0)).is_err());
    }

    #[test]
    fn decodes_every_supported_kind() {
        assert_eq!(decode_single(TAG_INTEGER, vec![0xFF, 0x38]), SnmpValue::Integer(-200));
        assert_eq!(
            decode_single(TAG_OCTET_STRING, b"core-sw".to_vec()),
            SnmpValue::OctetString(b"core-sw".to_vec())
        );
        assert_eq!(
            decode_single(TAG_OID, vec![0x2B, 0x06, 0x01]),
            SnmpValue::ObjectIdentifier(oid("1.3.6.1"))
        );
        assert_eq!(
            decode_single(TAG_IP_ADDRESS, vec![10, 0, 0, 1]),
            SnmpValue::IpAddress(Ipv4Addr::new(10, 0, 0, 1))
        );
        assert_eq!(
            decode_single(TAG_COUNTER32, vec![0x00, 0xFF, 0xFF, 0xFF, 0xFF]),
            SnmpValue::Counter32(u32::MAX)
        );
        assert_eq!(decode_single(TAG_GAUGE32, vec![0x64]), SnmpValue::Gauge32(100));
        assert_eq!(
            decode_single(TAG_TIMETICKS, vec![0x01, 0x00]),
            SnmpValue::TimeTicks(256)
        );
        assert_eq!(
            decode_single(TAG_COUNTER64, vec![0x00, 0xFF, 0, 0, 0, 0, 0, 0, 0]),
            SnmpValue::Counter64(0xFF00_0000_0000_0000)
        );
    }

    #[test]
    fn exception_markers_decode_to_absence() {
        assert_eq!(
            decode_single(TAG_NULL, vec![]),
            SnmpValue::Absent(Absence::Null)
        );
        assert_eq!(
            decode_single(TAG_NO_SUCH_OBJECT, vec![]),
            SnmpValue::Absent(Absence::NoSuchObject)
        );
        assert_eq!(
            decode_single(TAG_NO_SUCH_INSTANCE, vec![]),
            SnmpValue::Absent(Absence::NoSuchInstance)
        );
        assert_eq!(
            decode_single(TAG_END_OF_MIB_VIEW, vec![]),
            SnmpValue::Absent(Absence::EndOfMibView)
        );
    }

    #[test]
    fn unknown_tag_decodes_to_unsupported() {
        assert_eq!(
            decode_single(0x44, vec![0x01, 0x02]),
            SnmpValue::Absent(Absence::Unsupported(0x44))
        );
    }

    #[test]
    fn response_header_fields_are_decoded() {
        let bytes = encode_response(-5, 2, &[]);
        let response = decode_response(&bytes).unwrap();
        assert_eq!(response.version, VERSION_2C);
        assert_eq!(response.community, b"public");
        assert_eq!(response.request_id, -5);
        assert_eq!(response.error_status, 2);
        assert!(response.varbinds.is_empty());
    }

    #[test]
    fn truncated_input_is_codec_error() {
        let bytes = encode_response(1, 0, &[(oid("1.3.6.1.2.1.1.5.0"), TAG_GAUGE32, vec![1])]);
        for cut in 0..bytes.len() {
            let err = decode_response(&bytes[..cut]).unwrap_err();
            assert!(matches!(err, CollectorError::Codec { .. }), "cut at {cut}");
        }
    }

    #[test]
    fn request_pdu_is_rejected_as_response() {
        let request = encode_get_request("public", 1, &oid("1.3.6.1.2.1.1.1.0"));
        let err = decode_response(&request).unwrap_err();
        assert!(err.to_string().contains("expected response PDU"));
    }

    #[test]
    fn encoded_request_decodes_as_message() {
        let request = encode_get_request("monitoring", 77, &oid("1.3.6.1.2.1.6.9.0"));
        let message = decode_message(&request).unwrap();
        assert_eq!(message.pdu_type, TAG_GET_REQUEST);
        assert_eq!(message.community, b"monitoring");
        assert_eq!(message.request_id, 77);
        assert_eq!(
            message.varbinds,
            vec![(oid("1.3.6.1.2.1.6.9.0"), SnmpValue::Absent(Absence::Null))]
        );
    }

    #[test]
    fn integer_out_of_range_is_error() {
        let bytes = encode_response(
            1,
            0,
            &[(oid("1.3.6.1.2.1.1.3.0"), TAG_INTEGER, vec![0x01, 0, 0, 0, 0])],
        );
        assert!(decode_response(&bytes).is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn decode_arbitrary_bytes_does_not_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
                let _ = decode_message(&bytes);
            }

            #[test]
            fn decode_truncated_request_does_not_panic(cut in 0usize..64) {
                let request = encode_get_request("public", 1, &oid("1.3.6.1.2.1.2.2.1.10.1"));
                let end = cut.min(request.len());
                let _ = decode_message(&request[..end]);
            }

            #[test]
            fn request_fields_survive_encoding(
                community in "[a-zA-Z0-9]{0,32}",
                request_id in any::<i32>(),
                arcs in prop::collection::vec(any::<u32>(), 0..12),
            ) {
                let mut all = vec![1, 3];
                all.extend(arcs);
                let oid = Oid::from_arcs(all).unwrap();
                let message = decode_message(&encode_get_request(&community, request_id, &oid)).unwrap();
                prop_assert_eq!(message.community, community.into_bytes());
                prop_assert_eq!(message.request_id, request_id);
                prop_assert_eq!(&message.varbinds[0].0, &oid);
            }

            #[test]
            fn counter32_decodes_exactly(value in any::<u32>()) {
                let mut content = vec![0];
                content.extend(value.to_be_bytes());
                prop_assert_eq!(decode_single(TAG_COUNTER32, content), SnmpValue::Counter32(value));
            }
        }
    }
}
