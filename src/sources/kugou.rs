use reqwest::Url;

use crate::error::FetchError;
use crate::models::{ResolveEnvelope, SearchEnvelope, TrackDescriptor};
use crate::sources::http::{fetch_json, HttpResponse, ReqwestTransport, Transport};
use crate::sources::MusicSource;

pub const DEFAULT_BASE_URL: &str = "https://www.hhlqilongzhu.cn/api/dg_kugouSQ.php";

/// 쿠거우 무손실 검색 API 클라이언트.
/// 인증 없이 `msg`, `type=json`, `n` 쿼리 파라미터만 사용한다.
pub struct KugouClient<T = ReqwestTransport> {
    base_url: String,
    transport: T,
}

impl KugouClient<ReqwestTransport> {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        Ok(Self::with_transport(base_url, ReqwestTransport::new()?))
    }
}

impl<T: Transport> KugouClient<T> {
    pub fn with_transport(base_url: &str, transport: T) -> Self {
        Self {
            base_url: base_url.to_string(),
            transport,
        }
    }

    fn build_url(&self, params: &[(&str, &str)]) -> String {
        match Url::parse_with_params(&self.base_url, params) {
            Ok(url) => url.into(),
            // Unparseable base: fall through to the transport, which reports it as a network error.
            Err(_) => {
                let query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
                format!("{}?{}", self.base_url, query.join("&"))
            }
        }
    }

    pub fn search_url(&self, query: &str) -> String {
        self.build_url(&[("msg", query), ("type", "json")])
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Transport> MusicSource for KugouClient<T> {
    fn name(&self) -> &str {
        "Kugou"
    }

    fn search(&self, query: &str) -> Result<Vec<TrackDescriptor>, FetchError> {
        let url = self.search_url(query);
        tracing::info!("검색 요청: {}", url);
        let envelope: SearchEnvelope = fetch_json(&self.transport, &url)?;
        envelope.data.ok_or(FetchError::Data("data"))
    }

    fn resolve_url(&self, query: &str, n: u32) -> String {
        let n = n.to_string();
        self.build_url(&[("msg", query), ("type", "json"), ("n", &n)])
    }

    fn resolve(&self, resolve_url: &str) -> Result<String, FetchError> {
        let envelope: ResolveEnvelope = fetch_json(&self.transport, resolve_url)?;
        envelope
            .music_url
            .filter(|u| !u.is_empty())
            .ok_or(FetchError::Data("music_url"))
    }

    fn open_media(&self, music_url: &str) -> Result<HttpResponse, FetchError> {
        let resp = self.transport.get(music_url)?;
        if !resp.is_success() {
            return Err(FetchError::network(
                music_url,
                format!("음원 파일을 받을 수 없습니다 (HTTP {})", resp.status),
            ));
        }
        Ok(resp)
    }
}
