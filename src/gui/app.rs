use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use egui::{Color32, RichText};
use egui_extras::{Column, TableBuilder};

use crate::config::{self, Config};
use crate::core::download::{DownloadManager, DownloadView};
use crate::core::playback::{PlaybackController, PlaybackView};
use crate::core::saver::DirectorySaver;
use crate::core::search::{self, ResultsView, SearchOutcome, EMPTY_QUERY_MESSAGE};
use crate::models::{Progress, ResultSet, RowId, TrackDescriptor};
use crate::player;
use crate::sources::MusicSource;

const PLAYING_PINK: Color32 = Color32::from_rgb(0xF5, 0x6C, 0x9C);
const DONE_GREEN: Color32 = Color32::from_rgb(0x4C, 0xAF, 0x50);

enum BgResult {
    SearchDone(ResultSet),
    SearchFailed(u64),
    Alert(String),
    Icon(RowId, bool),
    ProgressShown(RowId),
    Progress(RowId, Progress),
    Complete(RowId),
    PlayerUnavailable(String),
}

enum PlayerCommand {
    Toggle { icon: RowId, url: String },
}

/// 작업 스레드에서 UI 스레드로 보내는 프레젠테이션 포트 구현.
struct ChannelView {
    tx: mpsc::Sender<BgResult>,
    ctx: egui::Context,
}

impl ChannelView {
    fn send(&self, result: BgResult) {
        let _ = self.tx.send(result);
        self.ctx.request_repaint();
    }
}

impl ResultsView for ChannelView {
    fn render_results(&mut self, results: &ResultSet) {
        self.send(BgResult::SearchDone(results.clone()));
    }

    fn alert(&mut self, message: &str) {
        self.send(BgResult::Alert(message.to_string()));
    }
}

impl PlaybackView for ChannelView {
    fn set_icon_state(&mut self, icon: RowId, playing: bool) {
        self.send(BgResult::Icon(icon, playing));
    }
}

impl DownloadView for ChannelView {
    fn show_progress(&mut self, row: RowId) {
        self.send(BgResult::ProgressShown(row));
    }

    fn set_progress(&mut self, row: RowId, progress: Progress) {
        self.send(BgResult::Progress(row, progress));
    }

    fn mark_complete(&mut self, row: RowId) {
        self.send(BgResult::Complete(row));
    }
}

#[derive(Default)]
struct RowState {
    progress_visible: bool,
    progress: Option<Progress>,
    complete: bool,
}

enum RowAction {
    Toggle(usize),
    Download(usize),
}

pub struct MusicApp {
    source: Arc<dyn MusicSource>,
    config: Config,

    // Search
    search_query: String,
    results: ResultSet,
    next_generation: u64,

    // Row visuals
    playing: HashSet<RowId>,
    rows: HashMap<RowId, RowState>,

    // Background tasks
    tx: mpsc::Sender<BgResult>,
    rx: mpsc::Receiver<BgResult>,
    player_tx: mpsc::Sender<PlayerCommand>,
    ctx: egui::Context,

    download_dir: String,
    player_error: Option<String>,
    alert: Option<String>,
    is_loading: bool,
    status_msg: String,
}

impl MusicApp {
    pub fn new(cc: &eframe::CreationContext<'_>, source: Arc<dyn MusicSource>, config: Config) -> Self {
        Self::setup_cjk_fonts(&cc.egui_ctx);
        let (tx, rx) = mpsc::channel();
        let (player_tx, player_rx) = mpsc::channel();

        Self::spawn_player_worker(
            Arc::clone(&source),
            player_rx,
            ChannelView {
                tx: tx.clone(),
                ctx: cc.egui_ctx.clone(),
            },
        );

        let download_dir = config.download.resolve_directory().display().to_string();

        Self {
            source,
            config,
            search_query: String::new(),
            results: ResultSet::default(),
            next_generation: 1,
            playing: HashSet::new(),
            rows: HashMap::new(),
            tx,
            rx,
            player_tx,
            ctx: cc.egui_ctx.clone(),
            download_dir,
            player_error: None,
            alert: None,
            is_loading: false,
            status_msg: String::new(),
        }
    }

    fn setup_cjk_fonts(ctx: &egui::Context) {
        let mut fonts = egui::FontDefinitions::default();

        // 곡 제목 대부분이 중국어이므로 CJK 통합 폰트를 찾는다
        let font_paths = [
            "/System/Library/Fonts/PingFang.ttc",
            "/System/Library/Fonts/Hiragino Sans GB.ttc",
            "C:\\Windows\\Fonts\\msyh.ttc",
            // Linux
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
        ];

        for path in &font_paths {
            if let Ok(font_data) = std::fs::read(path) {
                fonts
                    .font_data
                    .insert("cjk_font".to_string(), egui::FontData::from_owned(font_data));

                for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
                    if let Some(fallbacks) = fonts.families.get_mut(&family) {
                        fallbacks.push("cjk_font".to_string());
                    }
                }

                ctx.set_fonts(fonts);
                return;
            }
        }
        tracing::warn!("CJK 폰트를 찾지 못했습니다. 일부 제목이 깨져 보일 수 있습니다");
    }

    /// 출력 장치와 재생 세션을 소유하는 스레드. 토글 명령을 순서대로 처리하고
    /// 명령 사이사이에 곡 종료 이벤트를 확인한다.
    fn spawn_player_worker(
        source: Arc<dyn MusicSource>,
        command_rx: mpsc::Receiver<PlayerCommand>,
        mut view: ChannelView,
    ) {
        std::thread::spawn(move || {
            let sink = match player::open_default_sink() {
                Ok(sink) => sink,
                Err(e) => {
                    tracing::warn!("오디오 출력 장치를 열 수 없습니다: {:#}", e);
                    view.send(BgResult::PlayerUnavailable(format!("{:#}", e)));
                    return;
                }
            };
            let mut controller = PlaybackController::new(source.as_ref(), sink);

            loop {
                match command_rx.recv_timeout(Duration::from_millis(100)) {
                    Ok(PlayerCommand::Toggle { icon, url }) => {
                        controller.toggle(&mut view, icon, &url)
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
                controller.poll(&mut view);
            }
        });
    }

    fn channel_view(&self) -> ChannelView {
        ChannelView {
            tx: self.tx.clone(),
            ctx: self.ctx.clone(),
        }
    }

    fn start_search(&mut self) {
        if search::normalize_query(&self.search_query).is_none() {
            self.alert = Some(EMPTY_QUERY_MESSAGE.to_string());
            return;
        }

        let query = self.search_query.clone();
        let generation = self.next_generation;
        self.next_generation += 1;
        let source = Arc::clone(&self.source);
        let mut view = self.channel_view();
        self.is_loading = true;
        self.status_msg = "검색 중...".to_string();

        std::thread::spawn(move || {
            if search::search(source.as_ref(), &query, generation, &mut view) == SearchOutcome::Failed {
                view.send(BgResult::SearchFailed(generation));
            }
        });
    }

    fn toggle_row(&mut self, index: usize) {
        let Some(track) = self.results.tracks.get(index) else {
            return;
        };
        let url = self.source.resolve_url(&self.results.query, track.n);
        let icon = self.results.row_id(index);
        if self.player_tx.send(PlayerCommand::Toggle { icon, url }).is_err() {
            tracing::error!("재생 스레드가 종료되었습니다");
        }
    }

    fn start_download(&mut self, index: usize) {
        let Some(track) = self.results.tracks.get(index) else {
            return;
        };
        let track: TrackDescriptor = track.clone();
        let row = self.results.row_id(index);
        let query = self.results.query.clone();
        let dir = PathBuf::from(&self.download_dir);
        let source = Arc::clone(&self.source);
        let mut view = self.channel_view();

        std::thread::spawn(move || {
            let saver = DirectorySaver::new(dir);
            let manager = DownloadManager::new(source.as_ref(), &saver);
            if let Some(path) = manager.download(&mut view, row, &track, &query) {
                tracing::info!("다운로드 완료: {}", path.display());
            }
        });
    }

    fn pick_download_dir(&mut self) {
        if let Some(folder) = rfd::FileDialog::new()
            .set_directory(&self.download_dir)
            .pick_folder()
        {
            self.download_dir = folder.display().to_string();
            self.config.download.directory = Some(folder);
            match config::save_config(&self.config) {
                Ok(()) => self.status_msg = "다운로드 폴더가 저장되었습니다".to_string(),
                Err(e) => self.status_msg = format!("설정 저장 실패: {}", e),
            }
        }
    }

    /// 가장 최근 검색이 끝났을 때만 로딩 표시를 내린다.
    fn finish_search(&mut self, generation: u64) {
        if generation + 1 >= self.next_generation {
            self.is_loading = false;
            self.status_msg.clear();
        }
    }

    fn process_bg_results(&mut self) {
        while let Ok(result) = self.rx.try_recv() {
            match result {
                BgResult::SearchDone(results) => {
                    if !results.supersedes(&self.results) {
                        tracing::debug!("이전 검색 결과 무시: 세대 {}", results.generation);
                        continue;
                    }
                    self.finish_search(results.generation);
                    self.status_msg = format!("검색 결과 {}건", results.tracks.len());
                    self.rows.retain(|id, _| id.generation == results.generation);
                    self.results = results;
                }
                BgResult::SearchFailed(generation) => self.finish_search(generation),
                BgResult::Alert(msg) => self.alert = Some(msg),
                BgResult::Icon(id, true) => {
                    self.playing.insert(id);
                }
                BgResult::Icon(id, false) => {
                    self.playing.remove(&id);
                }
                BgResult::ProgressShown(id) => {
                    self.rows.entry(id).or_default().progress_visible = true;
                }
                BgResult::Progress(id, progress) => {
                    self.rows.entry(id).or_default().progress = Some(progress);
                }
                BgResult::Complete(id) => {
                    self.rows.entry(id).or_default().complete = true;
                }
                BgResult::PlayerUnavailable(msg) => self.player_error = Some(msg),
            }
        }
    }

    fn show_results_table(&self, ui: &mut egui::Ui) -> Option<RowAction> {
        let mut action = None;

        TableBuilder::new(ui)
            .striped(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::initial(320.0).resizable(true))
            .column(Column::initial(180.0).resizable(true))
            .column(Column::remainder())
            .header(24.0, |mut header| {
                header.col(|ui| {
                    ui.strong("곡");
                });
                header.col(|ui| {
                    ui.strong("가수");
                });
                header.col(|ui| {
                    ui.strong("작업");
                });
            })
            .body(|mut body| {
                for (id, track) in self.results.rows() {
                    body.row(28.0, |mut row| {
                        row.col(|ui| {
                            ui.label(&track.title);
                        });
                        row.col(|ui| {
                            ui.label(&track.singer);
                        });
                        row.col(|ui| {
                            if let Some(a) = self.show_row_actions(ui, id) {
                                action = Some(a);
                            }
                        });
                    });
                }
            });

        action
    }

    fn show_row_actions(&self, ui: &mut egui::Ui, id: RowId) -> Option<RowAction> {
        let mut action = None;
        let playing = self.playing.contains(&id);

        let (glyph, color) = if playing {
            ("⏸", PLAYING_PINK)
        } else {
            ("▶", ui.visuals().text_color())
        };
        let play = ui.add_enabled(
            self.player_error.is_none(),
            egui::Button::new(RichText::new(glyph).color(color).size(16.0)).frame(false),
        );
        let play = match &self.player_error {
            Some(err) => play.on_disabled_hover_text(err),
            None => play.on_hover_text("재생/일시정지"),
        };
        if play.clicked() {
            action = Some(RowAction::Toggle(id.index));
        }

        let download = ui
            .add(egui::Button::new(RichText::new("⬇").size(16.0)).frame(false))
            .on_hover_text("다운로드");
        if download.clicked() {
            action = Some(RowAction::Download(id.index));
        }

        if let Some(state) = self.rows.get(&id) {
            if state.progress_visible {
                match state.progress {
                    Some(Progress::Indeterminate { received }) => {
                        ui.spinner();
                        ui.label(format!("{:.1} MB", received as f64 / 1_048_576.0));
                    }
                    Some(Progress::Percent(p)) => {
                        ui.add(
                            egui::ProgressBar::new(p as f32 / 100.0)
                                .desired_width(90.0)
                                .show_percentage(),
                        );
                    }
                    None => {
                        ui.add(egui::ProgressBar::new(0.0).desired_width(90.0));
                    }
                }
            }
            if state.complete {
                ui.label(RichText::new("✔").color(DONE_GREEN).strong());
            }
        }

        action
    }

    fn show_alert(&mut self, ctx: &egui::Context) {
        let Some(msg) = self.alert.clone() else {
            return;
        };
        egui::Window::new("알림")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(&msg);
                if ui.button("확인").clicked() {
                    self.alert = None;
                }
            });
    }
}

impl eframe::App for MusicApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_bg_results();

        // Top panel: search input + download folder
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("검색어:");
                let response = ui.text_edit_singleline(&mut self.search_query);
                if ui.button("검색").clicked()
                    || (response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)))
                {
                    self.start_search();
                }
                if self.is_loading {
                    ui.spinner();
                }
                ui.label(&self.status_msg);
            });
            ui.horizontal(|ui| {
                ui.label("다운로드 폴더:");
                ui.text_edit_singleline(&mut self.download_dir);
                if ui.button("폴더 선택").clicked() {
                    self.pick_download_dir();
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.results.tracks.is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.label("검색어를 입력하고 검색하세요");
                });
                return;
            }

            match self.show_results_table(ui) {
                Some(RowAction::Toggle(index)) => self.toggle_row(index),
                Some(RowAction::Download(index)) => self.start_download(index),
                None => {}
            }
        });

        self.show_alert(ctx);
    }
}
