use serde::Deserialize;

/// 검색 결과 한 줄에 해당하는 곡 정보.
/// `n`은 외부 API가 검색 결과 안에서 곡을 식별하는 위치 번호다.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackDescriptor {
    pub title: String,
    pub singer: String,
    pub n: u32,
}

impl TrackDescriptor {
    pub fn summary(&self) -> String {
        format!("{} - {}", self.title, self.singer)
    }
}

/// 검색 응답 봉투. 곡 목록은 `data` 필드에 담겨 온다.
#[derive(Debug, Deserialize)]
pub struct SearchEnvelope {
    pub data: Option<Vec<TrackDescriptor>>,
}

/// 곡 해석(resolve) 응답. 실제 음원 주소를 담는다.
#[derive(Debug, Deserialize)]
pub struct ResolveEnvelope {
    pub music_url: Option<String>,
}

/// 화면의 한 행(재생 아이콘, 진행 링, 체크 표시)을 가리키는 식별자.
/// 검색할 때마다 `generation`이 올라가므로 이전 표의 행과 섞이지 않는다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId {
    pub generation: u64,
    pub index: usize,
}

impl RowId {
    pub fn new(generation: u64, index: usize) -> Self {
        Self { generation, index }
    }
}

/// 한 번의 검색으로 표시되는 결과 표 전체.
/// 행마다 원래 검색어가 필요하므로 함께 보관한다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub generation: u64,
    pub query: String,
    pub tracks: Vec<TrackDescriptor>,
}

impl ResultSet {
    pub fn row_id(&self, index: usize) -> RowId {
        RowId::new(self.generation, index)
    }

    pub fn rows(&self) -> impl Iterator<Item = (RowId, &TrackDescriptor)> {
        self.tracks
            .iter()
            .enumerate()
            .map(|(i, t)| (self.row_id(i), t))
    }

    /// 늦게 도착한 이전 검색의 결과가 새 표를 덮지 않도록 세대를 비교한다.
    pub fn supersedes(&self, shown: &ResultSet) -> bool {
        self.generation >= shown.generation
    }
}

/// 다운로드 진행 상황.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// 전체 길이를 알 때의 백분율 (0..=100)
    Percent(f64),
    /// Content-Length가 없거나 0이면 받은 바이트 수만 알린다
    Indeterminate { received: u64 },
}

/// 다운로드 한 건의 누적 상태. 행을 클릭할 때 만들어지고 작업이 끝나면 버려진다.
#[derive(Debug, Clone, Default)]
pub struct DownloadTask {
    pub received: u64,
    pub total: Option<u64>,
}

impl DownloadTask {
    pub fn new(content_length: Option<u64>) -> Self {
        Self {
            received: 0,
            total: content_length.filter(|&len| len > 0),
        }
    }

    /// 청크 하나를 반영하고 새 진행 상황을 돌려준다.
    pub fn advance(&mut self, chunk_len: usize) -> Progress {
        self.received += chunk_len as u64;
        self.progress()
    }

    pub fn progress(&self) -> Progress {
        match self.total {
            Some(total) => {
                let ratio = self.received as f64 / total as f64 * 100.0;
                Progress::Percent(ratio.min(100.0))
            }
            None => Progress::Indeterminate {
                received: self.received,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_envelope_parses_data() {
        let json = r#"{"code":200,"data":[{"title":"告白气球","singer":"周杰伦","n":1}]}"#;
        let env: SearchEnvelope = serde_json::from_str(json).unwrap();
        let data = env.data.unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].summary(), "告白气球 - 周杰伦");
        assert_eq!(data[0].n, 1);
    }

    #[test]
    fn test_resolve_envelope_missing_url() {
        let env: ResolveEnvelope = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert!(env.music_url.is_none());
    }

    #[test]
    fn test_progress_known_total() {
        let mut task = DownloadTask::new(Some(1_000));
        assert_eq!(task.advance(250), Progress::Percent(25.0));
        assert_eq!(task.advance(750), Progress::Percent(100.0));
    }

    #[test]
    fn test_progress_clamped_when_server_overshoots() {
        let mut task = DownloadTask::new(Some(100));
        assert_eq!(task.advance(150), Progress::Percent(100.0));
    }

    #[test]
    fn test_zero_length_is_unknown() {
        let mut task = DownloadTask::new(Some(0));
        assert_eq!(task.total, None);
        assert_eq!(
            task.advance(10),
            Progress::Indeterminate { received: 10 }
        );
    }

    #[test]
    fn test_older_search_does_not_supersede_newer() {
        let older = ResultSet {
            generation: 2,
            ..Default::default()
        };
        let newer = ResultSet {
            generation: 3,
            ..Default::default()
        };
        assert!(newer.supersedes(&older));
        assert!(!older.supersedes(&newer));
        assert!(older.supersedes(&ResultSet::default()));
    }

    #[test]
    fn test_result_set_row_ids_carry_generation() {
        let set = ResultSet {
            generation: 3,
            query: "q".to_string(),
            tracks: vec![TrackDescriptor {
                title: "a".to_string(),
                singer: "b".to_string(),
                n: 1,
            }],
        };
        let ids: Vec<RowId> = set.rows().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![RowId::new(3, 0)]);
    }
}
