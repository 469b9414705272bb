//! SNMP v2c 폴링 모듈
//!
//! - [`codec`]: BER 기반 GET 요청 인코딩 / 응답 디코딩
//! - [`client`]: 전송 추상화 [`SnmpClient`]와 UDP 구현
//! - [`oids`], [`profiles`]: MIB-II OID 테이블과 장비 유형별 프로파일
//! - [`poller`]: 대상별 동시 폴링 루프

pub mod client;
pub mod codec;
pub mod oids;
pub mod poller;
pub mod profiles;
pub mod value;

pub use client::{SnmpClient, UdpSnmpClient};
pub use poller::{SnmpPoller, TargetPoll};
pub use profiles::SnmpProfile;
pub use value::{Absence, Oid, SnmpData, SnmpValue};
