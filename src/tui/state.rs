use crate::catalog::{Package, PackageStatus};
use crate::reconciler::Reconciler;

pub struct App {
    pub reconciler: Reconciler,
    pub manifest_url: String,
    /// 选中行（清单中的下标）
    pub selected: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(reconciler: Reconciler, manifest_url: String) -> Self {
        Self {
            reconciler,
            manifest_url,
            selected: 0,
            should_quit: false,
        }
    }

    pub fn selected_package(&self) -> Option<&Package> {
        self.reconciler.catalog().get(self.selected)
    }

    pub fn select_prev(&mut self, step: usize) {
        self.selected = self.selected.saturating_sub(step);
    }

    pub fn select_next(&mut self, step: usize) {
        let len = self.reconciler.catalog().len();
        self.selected = (self.selected + step).min(len.saturating_sub(1));
    }

    /// 清单被整体替换后选中行可能越界
    pub fn clamp_selection(&mut self) {
        let len = self.reconciler.catalog().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    pub fn refresh(&mut self) {
        self.reconciler.refresh_catalog();
    }

    /// Enter：未安装则安装，可更新则更新，其余状态不做任何事
    pub fn activate_selected(&mut self) {
        let Some((name, status)) = self
            .selected_package()
            .map(|p| (p.name.clone(), p.status))
        else {
            return;
        };
        match status {
            PackageStatus::NotInstalled => self.install(&name),
            PackageStatus::Outdated => self.update(&name),
            PackageStatus::UpToDate | PackageStatus::Unknown => {}
        }
    }

    pub fn install_selected(&mut self) {
        if let Some(name) = self.selected_package().map(|p| p.name.clone()) {
            self.install(&name);
        }
    }

    pub fn update_selected(&mut self) {
        if let Some(name) = self.selected_package().map(|p| p.name.clone()) {
            self.update(&name);
        }
    }

    // 被拒绝的请求已由 Reconciler 记录并显示在状态栏
    fn install(&mut self, name: &str) {
        let _ = self.reconciler.install_package(name);
    }

    fn update(&mut self, name: &str) {
        let _ = self.reconciler.update_package(name);
    }
}
