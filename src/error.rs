use thiserror::Error;

/// 외부 API 호출에서 발생하는 오류.
#[derive(Debug, Error)]
pub enum FetchError {
    /// 연결 실패 또는 성공이 아닌 HTTP 상태
    #[error("네트워크 응답이 올바르지 않습니다 ({url}): {reason}")]
    Network { url: String, reason: String },

    #[error("JSON 응답 파싱에 실패했습니다: {0}")]
    Parse(#[from] serde_json::Error),

    /// 응답에 필요한 필드가 없음
    #[error("응답에 `{0}` 필드가 없습니다")]
    Data(&'static str),
}

impl FetchError {
    pub fn network(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// 다운로드 작업 한 건의 실패 원인.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("음원 전송이 중단되었습니다: {0}")]
    Transfer(#[source] std::io::Error),

    #[error("파일 저장에 실패했습니다: {0}")]
    Save(#[source] std::io::Error),
}
