//! 이벤트 보강 -- 분류와 GeoIP
//!
//! [`Enricher::enrich`]는 두 단계를 서로 독립적으로 실행합니다.
//!
//! 1. `BasicEnrichment`: 장비 유형을 `network-device`로 지정하고 `protocol_category` 분류 (동기)
//! 2. `GeoIPEnrichment`: 출발지 IP의 국가를 `source_country`로 기록 (비동기)
//!
//! 각 단계는 [`ErrorHandler`]를 거치므로 한 단계가 차단되거나 실패해도
//! 다른 단계의 결과는 그대로 남습니다.

pub mod classify;
pub mod geoip;

pub use classify::{PROTOCOL_CATEGORY_KEY, classify_protocol};
pub use geoip::{GeoIpProvider, GeoIpRecord, GeoIpService, GeoResolution, IpApiProvider, is_private};

use std::convert::Infallible;
use std::net::IpAddr;
use std::sync::Arc;

use netsentry_core::event::NormalizedTrafficEvent;

use crate::error::CollectorError;
use crate::parser::snmp::NETWORK_DEVICE;
use crate::resilience::ErrorHandler;

/// 국가 메타데이터 키
pub const SOURCE_COUNTRY_KEY: &str = "source_country";

/// 분류 단계 작업 이름
pub const BASIC_ENRICHMENT_OPERATION: &str = "BasicEnrichment";
/// GeoIP 단계 작업 이름
pub const GEOIP_ENRICHMENT_OPERATION: &str = "GeoIPEnrichment";

/// 이벤트 보강기
pub struct Enricher<P: GeoIpProvider = IpApiProvider> {
    handler: Arc<ErrorHandler>,
    /// `None`이면 외부 조회 없이 사설 주소만 "Local"로 기록합니다.
    geoip: Option<Arc<GeoIpService<P>>>,
}

impl<P: GeoIpProvider> Enricher<P> {
    pub fn new(handler: Arc<ErrorHandler>, geoip: Option<Arc<GeoIpService<P>>>) -> Self {
        Self { handler, geoip }
    }

    /// 외부 GeoIP 조회 없이 생성합니다.
    pub fn offline(handler: Arc<ErrorHandler>) -> Self {
        Self::new(handler, None)
    }

    pub fn geoip(&self) -> Option<&Arc<GeoIpService<P>>> {
        self.geoip.as_ref()
    }

    /// 이벤트를 제자리에서 보강합니다.
    pub async fn enrich(&self, event: &mut NormalizedTrafficEvent) {
        self.handler.safe_execute_void(BASIC_ENRICHMENT_OPERATION, || {
            classify(event);
            Ok::<_, Infallible>(())
        });

        let Some(source_ip) = event.source_ip.clone() else {
            return;
        };
        let country = self
            .handler
            .safe_execute_async(GEOIP_ENRICHMENT_OPERATION, None, || async {
                self.country_of(&source_ip).await.map(Some)
            })
            .await;
        if let Some(country) = country {
            event.set_metadata(SOURCE_COUNTRY_KEY, country);
        }
    }

    async fn country_of(&self, ip: &str) -> Result<String, CollectorError> {
        match &self.geoip {
            Some(service) => Ok(service.country(ip).await),
            None => {
                let local = ip
                    .trim()
                    .parse::<IpAddr>()
                    .is_ok_and(|addr| is_private(&addr));
                let resolution = if local {
                    GeoResolution::Local
                } else {
                    GeoResolution::Unresolved
                };
                Ok(resolution.country().to_owned())
            }
        }
    }
}

fn classify(event: &mut NormalizedTrafficEvent) {
    NETWORK_DEVICE.clone_into(&mut event.device_type);
    let category = classify_protocol(&event.protocol, event.destination_port);
    event.set_metadata(PROTOCOL_CATEGORY_KEY, category);
}
