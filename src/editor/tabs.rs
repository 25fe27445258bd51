//! 输出标签页管理。
//!
//! 选中状态只是一个 [`TabHandle`]，界面通过 [`OutputTabManager::render`] 投影得到，
//! 任意时刻最多只有一个内容视图可见。

use thiserror::Error;

use crate::codegen::Language;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TabError {
    #[error("unknown output tab handle: {0:?}")]
    UnknownHandle(TabHandle),

    #[error("dropdown needs one content per file name ({filenames} names, {contents} contents)")]
    MismatchedLengths { filenames: usize, contents: usize },

    #[error("dropdown '{0}' needs at least one file")]
    EmptyGroup(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(u64);

/// 指向单文件标签或下拉组成员的句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabHandle {
    tab: TabId,
    member: Option<usize>,
}

impl TabHandle {
    pub fn tab_id(&self) -> TabId {
        self.tab
    }

    pub fn member_index(&self) -> Option<usize> {
        self.member
    }
}

/// 只读内容视图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputView {
    pub mode: &'static str,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub view: OutputView,
}

#[derive(Debug, Clone)]
enum OutputEntry {
    Single {
        id: TabId,
        language: Language,
        file: OutputFile,
    },
    Group {
        id: TabId,
        language: Language,
        label: String,
        members: Vec<OutputFile>,
    },
}

impl OutputEntry {
    fn id(&self) -> TabId {
        match self {
            OutputEntry::Single { id, .. } | OutputEntry::Group { id, .. } => *id,
        }
    }

    fn file(&self, member: Option<usize>) -> Option<&OutputFile> {
        match (self, member) {
            (OutputEntry::Single { file, .. }, None) => Some(file),
            (OutputEntry::Group { members, .. }, Some(index)) => members.get(index),
            _ => None,
        }
    }
}

/// 渲染用的标签投影
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabView {
    Single {
        handle: TabHandle,
        label: String,
        language: Language,
        selected: bool,
    },
    Group {
        /// 选中组内成员时显示该成员文件名，否则显示组的默认标签
        label: String,
        language: Language,
        selected: bool,
        members: Vec<MemberView>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberView {
    pub handle: TabHandle,
    pub label: String,
    pub selected: bool,
}

/// 选择变化，供界面隐藏旧视图、显示新视图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Unchanged,
    Switched {
        hidden: Option<TabHandle>,
        shown: TabHandle,
    },
}

#[derive(Debug, Default)]
pub struct OutputTabManager {
    entries: Vec<OutputEntry>,
    selection: Option<TabHandle>,
    next_id: u64,
}

impl OutputTabManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 删除所有标签及其内容视图并清空选中状态
    pub fn clear_output_nav(&mut self) {
        self.entries.clear();
        self.selection = None;
    }

    pub fn add_output(&mut self, language: Language, filename: &str, content: &str) -> TabHandle {
        let id = self.allocate_id();
        self.entries.push(OutputEntry::Single {
            id,
            language,
            file: make_file(language, filename, content),
        });

        TabHandle { tab: id, member: None }
    }

    pub fn add_output_dropdown<N, C>(
        &mut self,
        language: Language,
        group_label: &str,
        filenames: &[N],
        contents: &[C],
    ) -> Result<Vec<TabHandle>, TabError>
    where
        N: AsRef<str>,
        C: AsRef<str>,
    {
        if filenames.len() != contents.len() {
            return Err(TabError::MismatchedLengths {
                filenames: filenames.len(),
                contents: contents.len(),
            });
        }
        if filenames.is_empty() {
            return Err(TabError::EmptyGroup(group_label.to_string()));
        }

        let id = self.allocate_id();
        let members: Vec<OutputFile> = filenames
            .iter()
            .zip(contents)
            .map(|(name, content)| make_file(language, name.as_ref(), content.as_ref()))
            .collect();
        let handles = (0..members.len())
            .map(|index| TabHandle { tab: id, member: Some(index) })
            .collect();

        self.entries.push(OutputEntry::Group {
            id,
            language,
            label: group_label.to_string(),
            members,
        });

        Ok(handles)
    }

    /// 选中句柄对应的视图；选中已选中的句柄不做任何事
    pub fn select_output(&mut self, handle: TabHandle) -> Result<SelectionChange, TabError> {
        if self.selection == Some(handle) {
            return Ok(SelectionChange::Unchanged);
        }
        if self.lookup(handle).is_none() {
            return Err(TabError::UnknownHandle(handle));
        }

        let hidden = self.selection.replace(handle);
        Ok(SelectionChange::Switched { hidden, shown: handle })
    }

    pub fn selected(&self) -> Option<TabHandle> {
        self.selection
    }

    pub fn content_view(&self, handle: TabHandle) -> Option<&OutputView> {
        self.lookup(handle).map(|file| &file.view)
    }

    /// 当前可见的内容视图，最多一个
    pub fn visible_views(&self) -> Vec<(TabHandle, &OutputView)> {
        self.selection
            .and_then(|handle| self.content_view(handle).map(|view| (handle, view)))
            .into_iter()
            .collect()
    }

    pub fn render(&self) -> Vec<TabView> {
        self.entries
            .iter()
            .map(|entry| match entry {
                OutputEntry::Single { id, language, file } => {
                    let handle = TabHandle { tab: *id, member: None };
                    TabView::Single {
                        handle,
                        label: file.name.clone(),
                        language: *language,
                        selected: self.selection == Some(handle),
                    }
                }
                OutputEntry::Group { id, language, label, members } => {
                    let selected_member = self
                        .selection
                        .filter(|handle| handle.tab == *id)
                        .and_then(|handle| handle.member);
                    let label = selected_member
                        .and_then(|index| members.get(index))
                        .map(|file| file.name.clone())
                        .unwrap_or_else(|| label.clone());

                    TabView::Group {
                        label,
                        language: *language,
                        selected: selected_member.is_some(),
                        members: members
                            .iter()
                            .enumerate()
                            .map(|(index, file)| MemberView {
                                handle: TabHandle { tab: *id, member: Some(index) },
                                label: file.name.clone(),
                                selected: selected_member == Some(index),
                            })
                            .collect(),
                    }
                }
            })
            .collect()
    }

    /// 顶层标签数，一个下拉组算一个
    pub fn tab_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 全部文件（名称与已解码内容），按标签顺序
    pub fn files(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .flat_map(|entry| -> Vec<&OutputFile> {
                match entry {
                    OutputEntry::Single { file, .. } => vec![file],
                    OutputEntry::Group { members, .. } => members.iter().collect(),
                }
            })
            .map(|file| (file.name.as_str(), file.view.content.as_str()))
            .collect()
    }

    fn lookup(&self, handle: TabHandle) -> Option<&OutputFile> {
        self.entries
            .iter()
            .find(|entry| entry.id() == handle.tab)
            .and_then(|entry| entry.file(handle.member))
    }

    fn allocate_id(&mut self) -> TabId {
        let id = TabId(self.next_id);
        self.next_id += 1;
        id
    }
}

fn make_file(language: Language, name: &str, content: &str) -> OutputFile {
    OutputFile {
        name: name.to_string(),
        view: OutputView {
            mode: language.editor_mode(),
            content: content.to_string(),
        },
    }
}
