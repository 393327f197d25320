mod catalog_view;
mod layout;
pub mod state;
mod theme;

use crate::config::Config;
use crate::reconciler::Reconciler;
use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use state::App;
use std::io;

/// 调度周期：每轮最多等待输入这么久，然后推进一次 Reconciler
const TICK_MS: u64 = 100;

pub async fn run(reconciler: Reconciler, config: Config) -> Result<()> {
    // 终端初始化
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(reconciler, config.manifest_url.clone());

    // 打开时先获取一次清单
    app.refresh();

    // 主循环
    loop {
        app.reconciler.tick();
        // 每轮都会重绘，这里只需消费掉请求
        app.reconciler.take_repaint();
        app.clamp_selection();

        terminal.draw(|f| ui(f, &app))?;

        // 处理事件
        if event::poll(std::time::Duration::from_millis(TICK_MS))? {
            if let Event::Key(key) = event::read()? {
                let term_size = terminal.size()?;

                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        app.should_quit = true;
                    }
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        app.should_quit = true;
                    }
                    _ => {
                        catalog_view::handle_catalog_key(key, &mut app, term_size.height);
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    if app.reconciler.is_busy() {
        // 后端操作不会被终止，只是不再等待
        log::warn!("退出时仍有操作未完成: {}", app.reconciler.operation().message);
    }

    // 恢复终端
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    Ok(())
}

fn ui(f: &mut Frame, app: &App) {
    catalog_view::render_catalog(f, app);
}
