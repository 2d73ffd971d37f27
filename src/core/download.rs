use std::io;
use std::path::PathBuf;

use crate::core::filename::build_filename;
use crate::core::saver::FileSaver;
use crate::error::DownloadError;
use crate::models::{DownloadTask, Progress, RowId, TrackDescriptor};
use crate::sources::MusicSource;

/// 행의 진행 링과 체크 표시를 다루는 포트.
pub trait DownloadView {
    fn show_progress(&mut self, row: RowId);
    fn set_progress(&mut self, row: RowId, progress: Progress);
    fn mark_complete(&mut self, row: RowId);
}

/// 청크를 도착 순서대로 모으면서 청크마다 진행 상황을 알린다.
pub fn consume_body<I>(
    body: I,
    mut task: DownloadTask,
    mut on_progress: impl FnMut(Progress),
) -> io::Result<Vec<u8>>
where
    I: IntoIterator<Item = io::Result<Vec<u8>>>,
{
    let capacity = task.total.unwrap_or(0).min(256 * 1024 * 1024) as usize;
    body.into_iter()
        .try_fold(Vec::with_capacity(capacity), |mut buf, chunk| {
            let chunk = chunk?;
            on_progress(task.advance(chunk.len()));
            buf.extend_from_slice(&chunk);
            Ok(buf)
        })
}

pub struct DownloadManager<'a> {
    source: &'a dyn MusicSource,
    saver: &'a dyn FileSaver,
}

impl<'a> DownloadManager<'a> {
    pub fn new(source: &'a dyn MusicSource, saver: &'a dyn FileSaver) -> Self {
        Self { source, saver }
    }

    /// 곡 하나를 받아 저장한다. 실패는 로그로만 남기고 None을 돌려준다.
    ///
    /// 진행 링은 마지막에 다시 한 번 표시되므로, 실패하면 마지막 값에서 멈춘 채 보인다.
    pub fn download(
        &self,
        view: &mut dyn DownloadView,
        row: RowId,
        track: &TrackDescriptor,
        query: &str,
    ) -> Option<PathBuf> {
        view.show_progress(row);

        let result = self.transfer(view, row, track, query);
        if let Err(e) = &result {
            tracing::error!("다운로드 실패 ({}): {}", track.summary(), e);
        }

        view.show_progress(row);
        result.ok()
    }

    fn transfer(
        &self,
        view: &mut dyn DownloadView,
        row: RowId,
        track: &TrackDescriptor,
        query: &str,
    ) -> Result<PathBuf, DownloadError> {
        let resolve_url = self.source.resolve_url(query, track.n);
        let music_url = self.source.resolve(&resolve_url)?;
        tracing::info!("다운로드 시작: {} <- {}", track.summary(), music_url);

        let resp = self.source.open_media(&music_url)?;
        let task = DownloadTask::new(resp.content_length);
        let bytes = consume_body(resp.body, task, |progress| view.set_progress(row, progress))
            .map_err(DownloadError::Transfer)?;

        let path = self
            .saver
            .save(&build_filename(track), &bytes)
            .map_err(DownloadError::Save)?;

        view.mark_complete(row);
        Ok(path)
    }
}
