//! 软件包目录：清单中的软件包及其安装状态
//!
//! 只由 Reconciler 修改，视图层只读。

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageStatus {
    NotInstalled,
    Outdated,
    UpToDate,
    /// 清单刚加载、尚未与后端比对
    Unknown,
}

impl PackageStatus {
    /// 按已安装版本推导状态，版本字符串必须完全一致才算最新
    pub fn derive(catalog_version: &str, installed_version: Option<&str>) -> Self {
        match installed_version {
            Some(v) if v == catalog_version => PackageStatus::UpToDate,
            Some(_) => PackageStatus::Outdated,
            None => PackageStatus::NotInstalled,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PackageStatus::NotInstalled => "未安装",
            PackageStatus::Outdated => "可更新",
            PackageStatus::UpToDate => "已是最新",
            PackageStatus::Unknown => "检查中",
        }
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    /// 清单中的版本
    pub version: String,
    /// 安装地址
    pub url: String,
    pub status: PackageStatus,
}

impl Package {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            url: url.into(),
            status: PackageStatus::Unknown,
        }
    }
}

/// 保持清单顺序的软件包集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    packages: Vec<Package>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 整体替换，不与旧内容合并
    pub fn replace_all(&mut self, packages: Vec<Package>) {
        self.packages = packages;
    }

    /// 同名时返回第一个
    pub fn find_by_name(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Package> {
        self.packages.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&Package> {
        self.packages.get(index)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn count(&self, status: PackageStatus) -> usize {
        self.packages.iter().filter(|p| p.status == status).count()
    }
}
