//! 테스트 전용 대역(test double) 모음.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::core::download::DownloadView;
use crate::core::playback::PlaybackView;
use crate::core::saver::FileSaver;
use crate::core::search::ResultsView;
use crate::error::FetchError;
use crate::models::{Progress, ResultSet, RowId};
use crate::player::AudioSink;
use crate::sources::http::{HttpResponse, Transport};

#[derive(Clone)]
struct Script {
    status: u16,
    content_length: Option<u64>,
    chunks: Vec<Vec<u8>>,
    fail_after: Option<usize>,
}

/// URL별로 미리 정해 둔 응답을 돌려주고, 받은 요청을 기록하는 전송 계층.
/// 등록되지 않은 URL은 연결 실패로 처리한다.
#[derive(Default)]
pub struct FakeTransport {
    scripts: Mutex<HashMap<String, Script>>,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, url: &str, script: Script) {
        self.scripts.lock().unwrap().insert(url.to_string(), script);
    }

    pub fn respond_json(&self, url: &str, body: &str) {
        self.insert(
            url,
            Script {
                status: 200,
                content_length: Some(body.len() as u64),
                chunks: vec![body.as_bytes().to_vec()],
                fail_after: None,
            },
        );
    }

    pub fn respond_status(&self, url: &str, status: u16) {
        self.insert(
            url,
            Script {
                status,
                content_length: None,
                chunks: Vec::new(),
                fail_after: None,
            },
        );
    }

    pub fn respond_chunks(&self, url: &str, content_length: Option<u64>, chunks: Vec<Vec<u8>>) {
        self.insert(
            url,
            Script {
                status: 200,
                content_length,
                chunks,
                fail_after: None,
            },
        );
    }

    /// `fail_after`개의 청크를 보낸 뒤 연결이 끊기는 응답.
    pub fn respond_broken(&self, url: &str, content_length: u64, chunks: Vec<Vec<u8>>, fail_after: usize) {
        self.insert(
            url,
            Script {
                status: 200,
                content_length: Some(content_length),
                chunks,
                fail_after: Some(fail_after),
            },
        );
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, url: &str) -> usize {
        self.requests().iter().filter(|u| *u == url).count()
    }
}

impl Transport for FakeTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        let script = self.scripts.lock().unwrap().get(url).cloned();
        match script {
            Some(Script {
                status,
                content_length,
                chunks,
                fail_after,
            }) => {
                let limit = fail_after.unwrap_or(chunks.len());
                let mut items: Vec<io::Result<Vec<u8>>> =
                    chunks.into_iter().take(limit).map(Ok).collect();
                if fail_after.is_some() {
                    items.push(Err(io::Error::new(
                        io::ErrorKind::ConnectionReset,
                        "connection reset",
                    )));
                }
                Ok(HttpResponse {
                    status,
                    content_length,
                    body: Box::new(items.into_iter()),
                })
            }
            None => Err(FetchError::network(url, "connection refused")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Rendered(ResultSet),
    Alert(String),
    Icon(RowId, bool),
    ShowProgress(RowId),
    Progress(RowId, Progress),
    Complete(RowId),
}

/// 모든 프레젠테이션 포트 호출을 순서대로 기록한다.
#[derive(Default)]
pub struct RecordingView {
    pub events: Vec<ViewEvent>,
}

impl RecordingView {
    pub fn icons(&self) -> Vec<(RowId, bool)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Icon(id, on) => Some((*id, *on)),
                _ => None,
            })
            .collect()
    }

    pub fn percents(&self) -> Vec<f64> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Progress(_, Progress::Percent(p)) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn completed(&self, row: RowId) -> bool {
        self.events.contains(&ViewEvent::Complete(row))
    }

    /// 마지막으로 설정된 상태 기준으로 "재생 중" 표시인 아이콘들.
    pub fn active_icons(&self) -> Vec<RowId> {
        let mut state: Vec<(RowId, bool)> = Vec::new();
        for (id, on) in self.icons() {
            state.retain(|(i, _)| *i != id);
            state.push((id, on));
        }
        state.into_iter().filter(|(_, on)| *on).map(|(id, _)| id).collect()
    }
}

impl ResultsView for RecordingView {
    fn render_results(&mut self, results: &ResultSet) {
        self.events.push(ViewEvent::Rendered(results.clone()));
    }

    fn alert(&mut self, message: &str) {
        self.events.push(ViewEvent::Alert(message.to_string()));
    }
}

impl PlaybackView for RecordingView {
    fn set_icon_state(&mut self, icon: RowId, playing: bool) {
        self.events.push(ViewEvent::Icon(icon, playing));
    }
}

impl DownloadView for RecordingView {
    fn show_progress(&mut self, row: RowId) {
        self.events.push(ViewEvent::ShowProgress(row));
    }

    fn set_progress(&mut self, row: RowId, progress: Progress) {
        self.events.push(ViewEvent::Progress(row, progress));
    }

    fn mark_complete(&mut self, row: RowId) {
        self.events.push(ViewEvent::Complete(row));
    }
}

/// HTML audio 요소처럼 동작하는 가짜 출력 장치.
pub struct FakeSink {
    pub source: Option<String>,
    pub paused: bool,
    pub ended: bool,
    /// 끝났지만 아직 이벤트를 읽지 않은 상태. `poll_ended`에서야 드러난다.
    pub pending_end: bool,
    pub reject_play: bool,
    pub loads: usize,
}

impl Default for FakeSink {
    fn default() -> Self {
        Self {
            source: None,
            paused: true,
            ended: false,
            pending_end: false,
            reject_play: false,
            loads: 0,
        }
    }
}

impl FakeSink {
    /// 재생 중인 곡이 끝까지 재생된 상황을 흉내 낸다.
    pub fn finish(&mut self) {
        self.paused = true;
        self.ended = true;
    }

    /// 곡이 끝났지만 출력 장치의 이벤트를 아무도 읽지 않은 상황.
    pub fn finish_unobserved(&mut self) {
        self.pending_end = true;
    }
}

impl AudioSink for FakeSink {
    fn load(&mut self, url: &str) -> Result<()> {
        self.source = Some(url.to_string());
        self.paused = true;
        self.ended = false;
        self.pending_end = false;
        self.loads += 1;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if self.reject_play {
            bail!("play() rejected");
        }
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.paused = true;
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn poll_ended(&mut self) -> bool {
        if std::mem::take(&mut self.pending_end) {
            self.paused = true;
            self.ended = true;
        }
        std::mem::take(&mut self.ended)
    }
}

#[derive(Default)]
pub struct MemorySaver {
    pub saved: Mutex<Vec<(String, Vec<u8>)>>,
}

impl FileSaver for MemorySaver {
    fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        self.saved
            .lock()
            .unwrap()
            .push((filename.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(filename))
    }
}
