use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// 标准三段式布局：Header(3) + Content(弹性) + Footer(3)
pub fn main_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area)
        .to_vec()
}

/// 渲染通用 header
pub fn render_header(f: &mut Frame, title: &str, area: Rect) {
    let header = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    f.render_widget(header, area);
}

/// 渲染通用 footer，`alert` 为 true 时用醒目颜色
pub fn render_footer(f: &mut Frame, text: &str, alert: bool, area: Rect) {
    let color = if alert { Color::Red } else { Color::Green };
    let footer = Paragraph::new(format!(" {}", text))
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);
    f.render_widget(footer, area);
}

/// 估算内容区域可见行数（总高度减去 header/footer/borders）
pub fn visible_content_height(term_height: u16) -> usize {
    term_height.saturating_sub(8) as usize
}

/// 让选中行保持在可见范围内的滚动偏移
pub fn scroll_offset(selected: usize, visible_height: usize) -> usize {
    if visible_height == 0 {
        return selected;
    }
    selected.saturating_sub(visible_height - 1)
}
