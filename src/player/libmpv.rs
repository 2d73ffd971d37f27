use anyhow::{Context, Result};
use mpv::Format;

use crate::player::AudioSink;

/// mpv 이벤트로부터 추적하는 재생 상태.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SinkState {
    paused: bool,
    idle: bool,
    /// `loadfile` 이후 StartFile을 받기 전. 그 사이의 idle 알림은 이전 곡의 것이다.
    loading: bool,
    ended: bool,
}

impl Default for SinkState {
    fn default() -> Self {
        Self {
            paused: true,
            idle: true,
            loading: false,
            ended: false,
        }
    }
}

impl SinkState {
    fn on_pause(&mut self, pause: bool) {
        self.paused = pause;
    }

    fn on_idle(&mut self, idle: bool) {
        if !self.loading {
            self.idle = idle;
        }
    }

    fn on_start_file(&mut self) {
        self.loading = false;
    }

    fn on_eof(&mut self) {
        self.ended = true;
        self.idle = true;
    }

    fn on_loadfile(&mut self) {
        self.idle = false;
        self.loading = true;
    }

    fn needs_reload(&self) -> bool {
        self.idle && !self.loading
    }
}

/// libmpv 기반 출력 장치. 스트리밍 URL을 직접 재생한다.
pub struct MpvSink {
    handler: mpv::MpvHandler,
    source: Option<String>,
    state: SinkState,
}

impl MpvSink {
    pub fn new() -> Result<Self> {
        let mut builder = mpv::MpvHandlerBuilder::new().context("MPV 빌더 생성에 실패했습니다")?;
        builder
            .set_option("vo", "null")
            .context("MPV 비디오 출력 설정에 실패했습니다")?;
        let mut handler = builder.build().context("MPV 핸들러 생성에 실패했습니다")?;

        handler
            .observe_property::<bool>("pause", 0)
            .context("pause 속성 관찰에 실패했습니다")?;
        handler
            .observe_property::<bool>("idle-active", 0)
            .context("idle-active 속성 관찰에 실패했습니다")?;

        Ok(Self {
            handler,
            source: None,
            state: SinkState::default(),
        })
    }

    fn load_source(&mut self) -> Result<()> {
        if let Some(url) = self.source.as_deref() {
            self.handler
                .command(&["loadfile", url, "replace"])
                .with_context(|| format!("음원을 불러올 수 없습니다: {}", url))?;
            self.state.on_loadfile();
        }
        Ok(())
    }

    fn drain_events(&mut self) {
        while let Some(event) = self.handler.wait_event(0.0) {
            match event {
                mpv::Event::PropertyChange { name, change, .. } => match (name, change) {
                    ("pause", Format::Flag(pause)) => self.state.on_pause(pause),
                    ("idle-active", Format::Flag(idle)) => self.state.on_idle(idle),
                    _ => {}
                },
                mpv::Event::StartFile => self.state.on_start_file(),
                mpv::Event::EndFile(Ok(mpv::EndFileReason::MPV_END_FILE_REASON_EOF)) => {
                    self.state.on_eof()
                }
                _ => {}
            }
        }
    }
}

impl AudioSink for MpvSink {
    fn load(&mut self, url: &str) -> Result<()> {
        // 이전 곡의 종료 이벤트가 새 곡에 적용되지 않도록 먼저 비운다
        self.drain_events();
        self.state.ended = false;
        self.source = Some(url.to_string());
        self.handler.set_property("pause", true)?;
        self.state.paused = true;
        self.load_source()
    }

    fn play(&mut self) -> Result<()> {
        self.drain_events();
        if self.state.needs_reload() {
            self.load_source()?;
        }
        self.handler.set_property("pause", false)?;
        self.state.paused = false;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.handler.set_property("pause", true)?;
        self.state.paused = true;
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.state.paused || self.state.idle
    }

    fn poll_ended(&mut self) -> bool {
        self.drain_events();
        std::mem::take(&mut self.state.ended)
    }
}
