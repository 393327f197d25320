//! 软件包列表视图

use super::layout;
use super::state::App;
use super::theme;
use crate::catalog::PackageStatus;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tokio::time::Instant;

const NAME_WIDTH: usize = 36;
const VERSION_WIDTH: usize = 14;

/// 处理列表视图的按键，返回 true 表示已消费该按键
pub fn handle_catalog_key(key: KeyEvent, app: &mut App, term_height: u16) -> bool {
    // 操作进行中只响应退出；真正的互斥由 Reconciler 保证
    if app.reconciler.is_busy() {
        return false;
    }

    let page = layout::visible_content_height(term_height).max(1);
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            app.select_prev(1);
            true
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.select_next(1);
            true
        }
        KeyCode::PageUp => {
            app.select_prev(page);
            true
        }
        KeyCode::PageDown => {
            app.select_next(page);
            true
        }
        KeyCode::Char('r') => {
            app.refresh();
            true
        }
        KeyCode::Enter => {
            app.activate_selected();
            true
        }
        KeyCode::Char('i') => {
            app.install_selected();
            true
        }
        KeyCode::Char('u') => {
            app.update_selected();
            true
        }
        _ => false,
    }
}

pub fn render_catalog(f: &mut Frame, app: &App) {
    let chunks = layout::main_layout(f.area());

    layout::render_header(f, &header_text(app), chunks[0]);

    if app.reconciler.is_busy() {
        render_progress(f, app, chunks[1]);
    } else {
        render_packages(f, app, chunks[1]);
    }

    match &app.reconciler.state().notice {
        Some(notice) => layout::render_footer(f, notice, true, chunks[2]),
        None => {
            let hints = if app.reconciler.is_busy() {
                "操作进行中，请稍候... | q 退出"
            } else {
                "↑↓ 选择 | Enter 安装/更新 | i 安装 | u 更新 | r 刷新 | q 退出"
            };
            layout::render_footer(f, hints, false, chunks[2]);
        }
    }
}

fn header_text(app: &App) -> String {
    let catalog = app.reconciler.catalog();
    let mut title = format!(
        "📦 pkgwatch | 最新 {} · 可更新 {} · 未安装 {}",
        catalog.count(PackageStatus::UpToDate),
        catalog.count(PackageStatus::Outdated),
        catalog.count(PackageStatus::NotInstalled)
    );
    if app.reconciler.is_refreshing() {
        title.push_str(" | 正在刷新清单...");
    } else if let Some(at) = app.reconciler.state().last_refreshed {
        title.push_str(&format!(" | 刷新于 {}", at.format("%H:%M:%S")));
    }
    title
}

fn render_progress(f: &mut Frame, app: &App, area: Rect) {
    let op = app.reconciler.operation();
    let now = Instant::now();
    let elapsed = op.elapsed(now).map(|d| d.as_secs()).unwrap_or(0);
    let remaining = op
        .deadline
        .map(|d| d.saturating_duration_since(now).as_secs())
        .unwrap_or(0);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            op.message.clone(),
            Style::default().fg(theme::BLUE).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("操作进行中，请稍候..."),
        Line::from(Span::styled(
            format!("已用 {} 秒，最多再等 {} 秒", elapsed, remaining),
            Style::default().fg(theme::DIM),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn render_packages(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(" {} ", app.manifest_url))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let padded = inner.inner(Margin {
        horizontal: 1,
        vertical: 0,
    });

    let catalog = app.reconciler.catalog();
    if catalog.is_empty() {
        let text = if app.reconciler.is_refreshing() {
            "正在加载清单..."
        } else {
            "清单为空，按 r 重新获取"
        };
        let paragraph = Paragraph::new(text).style(Style::default().fg(theme::DIM));
        f.render_widget(paragraph, padded);
        return;
    }

    let visible_height = padded.height as usize;
    let offset = layout::scroll_offset(app.selected, visible_height);

    let lines: Vec<Line> = catalog
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible_height)
        .map(|(i, package)| {
            let selected = i == app.selected;
            let base = if selected {
                Style::default().bg(theme::SEL_BG).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let marker = if selected { "▶ " } else { "  " };
            Line::from(vec![
                Span::styled(marker, base.fg(theme::PINK)),
                Span::styled(
                    format!("{:<width$}", package.name, width = NAME_WIDTH),
                    base.fg(Color::White),
                ),
                Span::styled(
                    format!("{:<width$}", package.version, width = VERSION_WIDTH),
                    base.fg(theme::DIM),
                ),
                Span::styled(
                    package.status.label(),
                    base.fg(theme::status_color(package.status)),
                ),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines), padded);
}
