pub mod http;
pub mod kugou;

use crate::error::FetchError;
use crate::models::TrackDescriptor;
use crate::sources::http::HttpResponse;

/// 음원 카탈로그 소스 트레이트.
/// 검색, 곡 해석(직접 음원 주소 얻기), 음원 스트림 열기를 추상화한다.
pub trait MusicSource: Send + Sync {
    fn name(&self) -> &str;
    /// 쿼리 문자열로 곡을 검색한다.
    fn search(&self, query: &str) -> Result<Vec<TrackDescriptor>, FetchError>;
    /// 검색어와 곡 위치 번호로 해석 요청 URL을 만든다.
    /// 재생과 다운로드가 같은 URL을 쓰며, 재생 세션은 이 URL로 곡을 구분한다.
    fn resolve_url(&self, query: &str, n: u32) -> String;
    /// 해석 요청을 보내 직접 음원 주소를 얻는다.
    fn resolve(&self, resolve_url: &str) -> Result<String, FetchError>;
    /// 직접 음원 주소로 스트리밍 GET을 연다.
    fn open_media(&self, music_url: &str) -> Result<HttpResponse, FetchError>;
}
