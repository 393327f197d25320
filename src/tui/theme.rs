//! 主题色定义，全局统一使用

use crate::catalog::PackageStatus;
use ratatui::style::Color;

/// 粉色
pub const PINK: Color = Color::Rgb(245, 169, 184);
/// 蓝色
pub const BLUE: Color = Color::Rgb(91, 206, 250);
/// 选中行背景色
pub const SEL_BG: Color = Color::Rgb(45, 35, 55);
/// 暗灰色（次要信息）
pub const DIM: Color = Color::Rgb(130, 130, 140);

pub fn status_color(status: PackageStatus) -> Color {
    match status {
        PackageStatus::NotInstalled => PINK,
        PackageStatus::Outdated => Color::Yellow,
        PackageStatus::UpToDate => Color::Green,
        PackageStatus::Unknown => DIM,
    }
}
