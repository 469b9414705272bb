//! GeoIP 조회 및 캐시
//!
//! [`GeoIpService`]는 IP 주소의 국가 정보를 조회합니다.
//!
//! 1. 사설/루프백/링크 로컬 주소는 외부 호출 없이 즉시 [`GeoResolution::Local`]
//! 2. 캐시에 유효한 항목이 있으면 그대로 반환
//! 3. 그 외에는 [`GeoIpProvider`]로 외부 조회 (`geoip_lookup` breaker 경유)
//!
//! 조회 실패는 에러로 전파되지 않고 [`GeoResolution::Unresolved`]가 됩니다.

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use netsentry_core::config::GeoIpConfig;
use netsentry_core::metrics as m;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::debug;

use crate::error::CollectorError;
use crate::resilience::ErrorHandler;

/// 외부 조회 작업 이름
pub const GEOIP_LOOKUP_OPERATION: &str = "geoip_lookup";

/// 사설 주소의 국가 표기
pub const LOCAL_COUNTRY: &str = "Local";

/// 조회 실패 시 국가 표기
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// 조회 응답 필드
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeoIpRecord {
    pub status: String,
    pub country: String,
    pub country_code: String,
    pub region: String,
    pub city: String,
    pub isp: String,
}

/// 조회 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoResolution {
    /// 사설/로컬 주소
    Local,
    /// 외부 조회 또는 캐시 성공
    Resolved(GeoIpRecord),
    /// 조회 실패 (타임아웃, 비정상 응답, 잘못된 주소, breaker 차단)
    Unresolved,
}

impl GeoResolution {
    /// 이벤트에 기록할 국가 문자열
    pub fn country(&self) -> &str {
        match self {
            Self::Local => LOCAL_COUNTRY,
            Self::Resolved(record) => &record.country,
            Self::Unresolved => UNKNOWN_COUNTRY,
        }
    }
}

/// 사설/루프백/링크 로컬/사이트 로컬/ULA 주소인지 확인합니다.
///
/// IPv4-mapped IPv6 주소는 IPv4 규칙을 따릅니다.
pub fn is_private(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_private_v4(&v4),
            None => is_private_v6(v6),
        },
    }
}

fn is_private_v4(ip: &Ipv4Addr) -> bool {
    ip.is_private() || ip.is_loopback() || ip.is_link_local()
}

fn is_private_v6(ip: &Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || (first & 0xffc0) == 0xfe80 // link-local fe80::/10
        || (first & 0xffc0) == 0xfec0 // site-local fec0::/10
        || (first & 0xfe00) == 0xfc00 // unique local fc00::/7
}

/// 외부 GeoIP 조회 추상화
pub trait GeoIpProvider: Send + Sync + 'static {
    /// IP 하나를 조회합니다. 성공 상태와 국가가 있는 응답만 `Ok`입니다.
    fn lookup(&self, ip: IpAddr) -> impl Future<Output = Result<GeoIpRecord, CollectorError>> + Send;
}

/// ip-api 호환 HTTP 조회기
///
/// `GET {base_url}/json/{ip}?fields=status,country,countryCode,region,city,isp`
pub struct IpApiProvider {
    client: reqwest::Client,
    base_url: String,
}

impl IpApiProvider {
    /// 설정으로 HTTP 클라이언트를 생성합니다 (요청 타임아웃, User-Agent).
    pub fn new(config: &GeoIpConfig) -> Result<Self, CollectorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CollectorError::Config {
                field: "geoip".to_owned(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, ip: IpAddr) -> String {
        format!(
            "{}/json/{}?fields=status,country,countryCode,region,city,isp",
            self.base_url, ip
        )
    }
}

impl GeoIpProvider for IpApiProvider {
    async fn lookup(&self, ip: IpAddr) -> Result<GeoIpRecord, CollectorError> {
        let failed = |reason: String| CollectorError::GeoIp {
            ip: ip.to_string(),
            reason,
        };

        let response = self
            .client
            .get(self.url(ip))
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {status}")));
        }

        let record: GeoIpRecord = response
            .json()
            .await
            .map_err(|e| failed(format!("malformed response: {e}")))?;

        if record.status != "success" {
            return Err(failed(format!("lookup status '{}'", record.status)));
        }
        if record.country.is_empty() {
            return Err(failed("response has no country".to_owned()));
        }
        Ok(record)
    }
}

struct CacheEntry {
    record: GeoIpRecord,
    inserted_at: Instant,
}

/// 캐시를 갖춘 GeoIP 조회 서비스
pub struct GeoIpService<P: GeoIpProvider> {
    provider: P,
    handler: Arc<ErrorHandler>,
    cache: DashMap<IpAddr, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
}

impl<P: GeoIpProvider> GeoIpService<P> {
    pub fn new(provider: P, handler: Arc<ErrorHandler>, ttl: Duration, max_entries: usize) -> Self {
        Self {
            provider,
            handler,
            cache: DashMap::new(),
            ttl,
            max_entries,
        }
    }

    /// 설정의 TTL과 최대 항목 수를 사용합니다.
    pub fn with_config(provider: P, handler: Arc<ErrorHandler>, config: &GeoIpConfig) -> Self {
        Self::new(
            provider,
            handler,
            Duration::from_secs(config.cache_ttl_secs),
            config.max_cache_entries,
        )
    }

    /// IP 문자열을 조회합니다.
    pub async fn resolve(&self, ip: &str) -> GeoResolution {
        let Ok(addr) = ip.trim().parse::<IpAddr>() else {
            debug!(ip, "geoip skipped, not an IP address");
            return GeoResolution::Unresolved;
        };

        if is_private(&addr) {
            return GeoResolution::Local;
        }

        if let Some(record) = self.cached(&addr) {
            metrics::counter!(m::GEOIP_CACHE_HITS_TOTAL).increment(1);
            return GeoResolution::Resolved(record);
        }

        let looked_up = self
            .handler
            .safe_execute_async(GEOIP_LOOKUP_OPERATION, None, || async {
                self.provider.lookup(addr).await.map(Some)
            })
            .await;

        match looked_up {
            Some(record) => {
                metrics::counter!(m::GEOIP_LOOKUPS_TOTAL, m::LABEL_RESULT => "success")
                    .increment(1);
                self.insert(addr, record.clone());
                GeoResolution::Resolved(record)
            }
            None => {
                metrics::counter!(m::GEOIP_LOOKUPS_TOTAL, m::LABEL_RESULT => "failure")
                    .increment(1);
                GeoResolution::Unresolved
            }
        }
    }

    /// 국가 문자열만 반환합니다 ("Local", 국가명, 또는 "Unknown").
    pub async fn country(&self, ip: &str) -> String {
        self.resolve(ip).await.country().to_owned()
    }

    fn cached(&self, addr: &IpAddr) -> Option<GeoIpRecord> {
        let entry = self.cache.get(addr)?;
        if entry.inserted_at.elapsed() < self.ttl {
            return Some(entry.record.clone());
        }
        drop(entry);
        self.cache.remove(addr);
        None
    }

    fn insert(&self, addr: IpAddr, record: GeoIpRecord) {
        if self.max_entries == 0 {
            return;
        }
        if self.cache.len() >= self.max_entries && !self.cache.contains_key(&addr) {
            self.purge_expired();
            if self.cache.len() >= self.max_entries {
                debug!(ip = %addr, entries = self.cache.len(), "geoip cache full, result not cached");
                return;
            }
        }
        self.cache.insert(
            addr,
            CacheEntry {
                record,
                inserted_at: Instant::now(),
            },
        );
    }

    /// 만료된 캐시 항목을 제거합니다.
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.cache.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
    }

    /// 현재 캐시 항목 수
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}
