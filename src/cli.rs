use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use dialoguer::{Input, Select};

use crate::config::{self, Config};
use crate::core::download::{DownloadManager, DownloadView};
use crate::core::playback::{PlaybackController, PlaybackState, PlaybackView};
use crate::core::saver::DirectorySaver;
use crate::core::search::{self, ResultsView, SearchOutcome};
use crate::models::{Progress, ResultSet, RowId};
use crate::player;
use crate::sources::kugou::KugouClient;
use crate::sources::MusicSource;

#[derive(Parser)]
#[command(name = "musicdl", version, about = "무손실 음원 검색 · 미리듣기 · 다운로드")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// GUI 모드로 실행
    #[arg(long)]
    pub gui: bool,

    /// 로그 레벨 (기본: warn)
    #[arg(short, long, global = true)]
    pub verbosity: Option<tracing::Level>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 곡을 검색하여 결과 표시
    Search {
        /// 검색어
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// 검색 결과에서 곡을 골라 다운로드
    Download {
        /// 검색어
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// 받을 곡의 번호 (생략하면 목록에서 선택)
        #[arg(short, long)]
        n: Option<u32>,
        /// 저장할 디렉토리 (설정값보다 우선)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// 검색 결과를 미리듣기 (같은 곡을 다시 고르면 일시정지/재개)
    Play {
        /// 검색어
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// API 주소와 다운로드 디렉토리 설정
    Config,
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Search { query }) => cmd_search(&query.join(" ")),
        Some(Commands::Download { query, n, dir }) => cmd_download(&query.join(" "), n, dir),
        Some(Commands::Play { query }) => cmd_play(&query.join(" ")),
        Some(Commands::Config) => cmd_config(),
        None => {
            if cli.gui {
                #[cfg(feature = "gui")]
                {
                    crate::gui::launch(config::load_config())
                }
                #[cfg(not(feature = "gui"))]
                {
                    anyhow::bail!(
                        "GUI 기능이 활성화되지 않았습니다. 다시 빌드하세요: cargo build --features gui"
                    );
                }
            } else {
                println!("사용법: musicdl <명령어> 또는 musicdl --gui");
                println!("자세한 정보는 musicdl --help를 실행하세요.");
                Ok(())
            }
        }
    }
}

fn client(cfg: &Config) -> Result<KugouClient> {
    KugouClient::new(&cfg.api.base_url).context("HTTP 클라이언트 생성에 실패했습니다")
}

/// 결과를 표로 출력한다.
struct TableView;

impl ResultsView for TableView {
    fn render_results(&mut self, results: &ResultSet) {
        if results.tracks.is_empty() {
            println!("'{}'에 대한 검색 결과가 없습니다", results.query);
            return;
        }

        let mut table = Table::new();
        table.set_header(vec!["번호", "곡", "가수"]);
        for track in &results.tracks {
            table.add_row(vec![
                Cell::new(track.n),
                Cell::new(&track.title),
                Cell::new(&track.singer),
            ]);
        }
        println!("{table}");
    }

    fn alert(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

fn find_tracks(client: &dyn MusicSource, query: &str) -> Result<Option<ResultSet>> {
    match search::search(client, query, 1, &mut TableView) {
        SearchOutcome::Rendered(results) if results.tracks.is_empty() => Ok(None),
        SearchOutcome::Rendered(results) => Ok(Some(results)),
        SearchOutcome::EmptyQuery => Ok(None),
        SearchOutcome::Failed => bail!("곡을 가져오지 못했습니다"),
    }
}

fn cmd_search(query: &str) -> Result<()> {
    let cfg = config::load_config();
    let client = client(&cfg)?;
    find_tracks(&client, query)?;
    Ok(())
}

struct ConsoleDownloadView;

impl DownloadView for ConsoleDownloadView {
    fn show_progress(&mut self, _row: RowId) {
        println!();
    }

    fn set_progress(&mut self, _row: RowId, progress: Progress) {
        match progress {
            Progress::Percent(p) => print!("\r  진행률: {:5.1}%", p),
            Progress::Indeterminate { received } => {
                print!("\r  받은 크기: {:.1} MB", received as f64 / 1_048_576.0)
            }
        }
        let _ = std::io::stdout().flush();
    }

    fn mark_complete(&mut self, _row: RowId) {
        print!("  ✔");
    }
}

fn cmd_download(query: &str, n: Option<u32>, dir: Option<PathBuf>) -> Result<()> {
    let cfg = config::load_config();
    let client = client(&cfg)?;

    let Some(results) = find_tracks(&client, query)? else {
        return Ok(());
    };

    let index = match n {
        Some(n) => results
            .tracks
            .iter()
            .position(|t| t.n == n)
            .with_context(|| format!("번호 {}인 곡이 검색 결과에 없습니다", n))?,
        None => {
            let items: Vec<String> = results.tracks.iter().map(|t| t.summary()).collect();
            Select::new()
                .with_prompt("다운로드할 곡을 선택하세요")
                .items(&items)
                .default(0)
                .interact()?
        }
    };

    let track = &results.tracks[index];
    let saver = DirectorySaver::new(dir.unwrap_or_else(|| cfg.download.resolve_directory()));
    let manager = DownloadManager::new(&client, &saver);

    println!("다운로드: {} → {}", track.summary(), saver.dir().display());
    match manager.download(&mut ConsoleDownloadView, results.row_id(index), track, &results.query) {
        Some(path) => println!("저장되었습니다: {}", path.display()),
        None => bail!("다운로드에 실패했습니다: {}", track.summary()),
    }
    Ok(())
}

/// 아이콘 상태를 한 줄 메시지로 보여준다.
struct ConsolePlaybackView<'a> {
    results: &'a ResultSet,
}

impl PlaybackView for ConsolePlaybackView<'_> {
    fn set_icon_state(&mut self, icon: RowId, playing: bool) {
        if icon.generation != self.results.generation {
            return;
        }
        if let Some(track) = self.results.tracks.get(icon.index) {
            let glyph = if playing { "▶" } else { "⏸" };
            println!("  {} {}", glyph, track.summary());
        }
    }
}

fn cmd_play(query: &str) -> Result<()> {
    let cfg = config::load_config();
    let client = client(&cfg)?;

    let Some(results) = find_tracks(&client, query)? else {
        return Ok(());
    };

    let sink = player::open_default_sink()?;
    let mut controller = PlaybackController::new(&client, sink);
    let mut view = ConsolePlaybackView { results: &results };

    let mut items: Vec<String> = results.tracks.iter().map(|t| t.summary()).collect();
    items.push("종료".to_string());
    let mut last = 0;

    loop {
        controller.poll(&mut view);

        let selection = Select::new()
            .with_prompt("재생/일시정지할 곡을 선택하세요")
            .items(&items)
            .default(last)
            .interact()?;

        let Some(track) = results.tracks.get(selection) else {
            break;
        };
        last = selection;

        let url = client.resolve_url(&results.query, track.n);
        controller.toggle(&mut view, results.row_id(selection), &url);
        if controller.state() == PlaybackState::Loading {
            eprintln!("  재생하지 못했습니다. -v debug 로 자세한 로그를 확인하세요.");
        }
    }

    Ok(())
}

fn cmd_config() -> Result<()> {
    let mut cfg = config::load_config();

    println!("musicdl 설정\n");

    let base_url: String = Input::new()
        .with_prompt("API 주소")
        .with_initial_text(cfg.api.base_url.clone())
        .interact_text()?;

    let current_dir = cfg
        .download
        .directory
        .as_ref()
        .map(|d| d.display().to_string())
        .unwrap_or_default();

    let directory: String = Input::new()
        .with_prompt("다운로드 디렉토리 (비우면 시스템 기본값)")
        .with_initial_text(current_dir)
        .allow_empty(true)
        .interact_text()?;

    cfg.api.base_url = base_url.trim().to_string();
    cfg.download.directory = match directory.trim() {
        "" => None,
        d => Some(PathBuf::from(d)),
    };

    config::save_config(&cfg)?;
    println!("\n설정이 저장되었습니다!");
    Ok(())
}
