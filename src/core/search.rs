use crate::models::ResultSet;
use crate::sources::MusicSource;

pub const EMPTY_QUERY_MESSAGE: &str = "검색어를 입력하세요";

/// 검색 결과 표를 그리는 포트.
pub trait ResultsView {
    /// 기존 표를 버리고 결과 전체로 다시 채운다.
    fn render_results(&mut self, results: &ResultSet);
    /// 사용자에게 보이는 경고. 빈 검색어에만 쓰인다.
    fn alert(&mut self, message: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Rendered(ResultSet),
    EmptyQuery,
    /// 요청이 실패했다. 표는 그대로 둔다.
    Failed,
}

/// 앞뒤 공백을 제거하고, 비어 있으면 None.
pub fn normalize_query(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// 검색어로 곡을 찾아 결과 표를 통째로 교체한다.
/// 빈 검색어는 요청 없이 경고만 띄우고, 요청 실패는 로그만 남긴다.
pub fn search(
    source: &dyn MusicSource,
    raw_query: &str,
    generation: u64,
    view: &mut dyn ResultsView,
) -> SearchOutcome {
    let Some(query) = normalize_query(raw_query) else {
        view.alert(EMPTY_QUERY_MESSAGE);
        return SearchOutcome::EmptyQuery;
    };

    match source.search(query) {
        Ok(tracks) => {
            let results = ResultSet {
                generation,
                query: query.to_string(),
                tracks,
            };
            tracing::debug!("검색 결과 {}건: {}", results.tracks.len(), query);
            view.render_results(&results);
            SearchOutcome::Rendered(results)
        }
        Err(e) => {
            tracing::error!("{} 검색 실패: {}", source.name(), e);
            SearchOutcome::Failed
        }
    }
}
