#[cfg(feature = "gui")]
mod app;

#[cfg(feature = "gui")]
pub fn launch(config: crate::config::Config) -> anyhow::Result<()> {
    use std::sync::Arc;

    use anyhow::Context;

    let client = crate::sources::kugou::KugouClient::new(&config.api.base_url)
        .context("HTTP 클라이언트 생성에 실패했습니다")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([900.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "musicdl",
        options,
        Box::new(move |cc| Ok(Box::new(app::MusicApp::new(cc, Arc::new(client), config)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI 실행에 실패했습니다: {}", e))
}
