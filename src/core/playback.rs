//! 재생/일시정지 토글.
//!
//! 출력 장치는 하나이고, "재생 중" 아이콘도 언제나 최대 하나다.
//! 어떤 곡과 아이콘이 현재 출력 장치에 묶여 있는지는 [`PlaybackSession`]이
//! 기록하며, 이 값을 바꾸는 경로는 [`PlaybackController::toggle`]뿐이다.

use crate::models::RowId;
use crate::player::AudioSink;
use crate::sources::MusicSource;

/// 행의 재생 아이콘 모양을 바꾸는 포트.
pub trait PlaybackView {
    /// `playing`이면 "재생 중" 모양, 아니면 "재생" 모양.
    fn set_icon_state(&mut self, icon: RowId, playing: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    /// 음원 주소를 해석하는 중. 아이콘은 Playing과 같다.
    Loading,
    Playing,
    Paused,
}

/// 현재 출력 장치에 묶인 곡(해석 요청 URL)과 아이콘.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackSession {
    pub current_url: Option<String>,
    pub current_icon: Option<RowId>,
}

pub struct PlaybackController<'a, S> {
    source: &'a dyn MusicSource,
    sink: S,
    session: PlaybackSession,
    state: PlaybackState,
}

impl<'a, S: AudioSink> PlaybackController<'a, S> {
    pub fn new(source: &'a dyn MusicSource, sink: S) -> Self {
        Self {
            source,
            sink,
            session: PlaybackSession::default(),
            state: PlaybackState::Idle,
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[cfg(test)]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// 아이콘 클릭 처리. `url`은 곡의 해석 요청 URL이다.
    ///
    /// - 다른 곡이면 이전 아이콘을 끄고 새 아이콘을 켠 뒤, 곡을 해석해 싣고 재생한다.
    /// - 같은 곡이고 멈춰 있으면 재개한다.
    /// - 같은 곡이고 재생 중이면 일시정지한다.
    ///
    /// 해석이나 재생이 실패해도 아이콘은 켜진 채로 남는다.
    /// 분기 전에 아직 처리하지 않은 곡 종료 이벤트를 먼저 반영한다.
    pub fn toggle(&mut self, view: &mut dyn PlaybackView, icon: RowId, url: &str) {
        self.poll(view);

        if self.session.current_url.as_deref() != Some(url) {
            if let Some(previous) = self.session.current_icon {
                view.set_icon_state(previous, false);
            }
            self.session.current_url = Some(url.to_string());
            self.session.current_icon = Some(icon);
            view.set_icon_state(icon, true);

            self.state = PlaybackState::Loading;
            match self.load_and_play(url) {
                Ok(()) => self.state = PlaybackState::Playing,
                Err(e) => tracing::error!("음악 불러오기 실패: {:#}", e),
            }
        } else if self.sink.is_paused() {
            match self.sink.play() {
                Ok(()) => self.state = PlaybackState::Playing,
                Err(e) => tracing::error!("재생 재개 실패: {:#}", e),
            }
            self.session.current_icon = Some(icon);
            view.set_icon_state(icon, true);
        } else {
            if let Err(e) = self.sink.pause() {
                tracing::error!("일시정지 실패: {:#}", e);
            }
            self.state = PlaybackState::Paused;
            view.set_icon_state(icon, false);
        }
    }

    /// 곡이 끝까지 재생되었을 때 호출한다.
    /// 아이콘만 끄고 현재 URL은 유지하므로, 같은 아이콘을 다시 누르면 처음부터 재생된다.
    pub fn on_track_ended(&mut self, view: &mut dyn PlaybackView) {
        if let Some(icon) = self.session.current_icon {
            view.set_icon_state(icon, false);
        }
        self.state = PlaybackState::Idle;
    }

    /// 출력 장치의 종료 이벤트를 확인한다. 곡이 끝났으면 true.
    pub fn poll(&mut self, view: &mut dyn PlaybackView) -> bool {
        let ended = self.sink.poll_ended();
        if ended {
            self.on_track_ended(view);
        }
        ended
    }

    fn load_and_play(&mut self, url: &str) -> anyhow::Result<()> {
        let music_url = self.source.resolve(url)?;
        tracing::debug!("재생 소스: {}", music_url);
        self.sink.load(&music_url)?;
        self.sink.play()
    }
}
