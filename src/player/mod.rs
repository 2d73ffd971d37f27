//! 공유 오디오 출력 장치.
//!
//! 앱 전체에 출력 장치는 하나뿐이며, 어떤 곡을 싣고 재생할지는
//! [`crate::core::playback::PlaybackController`]가 결정한다.

#[cfg(feature = "mpv")]
mod libmpv;

use anyhow::Result;

/// 단일 오디오 출력 장치 포트. HTML audio 요소와 같은 의미를 따른다.
pub trait AudioSink {
    /// 재생할 소스를 바꾼다. 재생은 시작하지 않는다.
    fn load(&mut self, url: &str) -> Result<()>;
    /// 재생을 시작하거나 재개한다. 끝난 곡이면 처음부터 다시 재생한다.
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    /// 아무것도 싣지 않았거나, 일시정지했거나, 끝까지 재생했으면 true.
    fn is_paused(&self) -> bool;
    /// 마지막 호출 이후 곡이 끝까지 재생되었는지 확인한다.
    fn poll_ended(&mut self) -> bool;
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn load(&mut self, url: &str) -> Result<()> {
        (**self).load(url)
    }

    fn play(&mut self) -> Result<()> {
        (**self).play()
    }

    fn pause(&mut self) -> Result<()> {
        (**self).pause()
    }

    fn is_paused(&self) -> bool {
        (**self).is_paused()
    }

    fn poll_ended(&mut self) -> bool {
        (**self).poll_ended()
    }
}

/// 빌드에 포함된 오디오 백엔드를 연다.
#[cfg(feature = "mpv")]
pub fn open_default_sink() -> Result<Box<dyn AudioSink>> {
    Ok(Box::new(libmpv::MpvSink::new()?))
}

#[cfg(not(feature = "mpv"))]
pub fn open_default_sink() -> Result<Box<dyn AudioSink>> {
    anyhow::bail!(
        "오디오 재생 기능이 활성화되지 않았습니다. 다시 빌드하세요: cargo build --features mpv"
    )
}
