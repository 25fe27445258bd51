//! 浏览器历史与编辑器开关的同步。
//!
//! 打开编辑器时压入 "editor" 条目，关闭时执行后退而不是再压入一条，
//! 因此历史中始终只有 home → editor 两级。

use super::shell::{EditorShell, KeyAction, KeyPress, Redraw};
use super::tabs::TabHandle;

/// 历史条目状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryState {
    Home,
    Editor,
}

impl HistoryState {
    pub fn id(&self) -> u8 {
        match self {
            HistoryState::Home => 0,
            HistoryState::Editor => 1,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(HistoryState::Home),
            1 => Some(HistoryState::Editor),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            HistoryState::Home => "home",
            HistoryState::Editor => "editor",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            HistoryState::Home => "/",
            HistoryState::Editor => "/editor",
        }
    }
}

/// 浏览器历史的抽象
pub trait BrowserHistory {
    fn replace_state(&mut self, state: HistoryState);
    fn push_state(&mut self, state: HistoryState);
    /// 后退一步，返回新的当前条目状态；已在最前时返回 None
    fn back(&mut self) -> Option<HistoryState>;
    /// 前进一步，返回新的当前条目状态；已在最后时返回 None
    fn forward(&mut self) -> Option<HistoryState>;
    fn current(&self) -> Option<HistoryState>;
}

/// 内存中的会话历史，行为与浏览器一致：压入会截断前进分支
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    entries: Vec<HistoryState>,
    index: usize,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HistoryState] {
        &self.entries
    }
}

impl BrowserHistory for SessionHistory {
    fn replace_state(&mut self, state: HistoryState) {
        if self.entries.is_empty() {
            self.entries.push(state);
            self.index = 0;
        } else {
            self.entries[self.index] = state;
        }
    }

    fn push_state(&mut self, state: HistoryState) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(state);
        self.index = self.entries.len() - 1;
    }

    fn back(&mut self) -> Option<HistoryState> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.current()
    }

    fn forward(&mut self) -> Option<HistoryState> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.current()
    }

    fn current(&self) -> Option<HistoryState> {
        self.entries.get(self.index).copied()
    }
}

/// 把编辑器开关状态挂到浏览器历史上
#[derive(Debug)]
pub struct HistoryController<H: BrowserHistory> {
    shell: EditorShell,
    history: H,
}

impl<H: BrowserHistory> HistoryController<H> {
    pub fn new(mut history: H) -> Self {
        history.replace_state(HistoryState::Home);
        Self {
            shell: EditorShell::new(),
            history,
        }
    }

    pub fn is_open(&self) -> bool {
        self.shell.is_open()
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    /// 用户触发的切换：打开时压入历史，关闭时后退
    pub fn toggle_editor(&mut self, selected: Option<TabHandle>) -> Vec<Redraw> {
        if self.shell.is_open() {
            match self.history.back() {
                Some(state) => self.on_pop_state(Some(state), selected),
                // 页面直接以打开状态进入时没有可后退的条目
                None => {
                    self.history.replace_state(HistoryState::Home);
                    self.shell.toggle_editor(selected)
                }
            }
        } else {
            self.history.push_state(HistoryState::Editor);
            self.shell.toggle_editor(selected)
        }
    }

    /// 处理 popstate；状态与当前可见性一致时不做任何事，避免重复改动历史
    pub fn on_pop_state(&mut self, state: Option<HistoryState>, selected: Option<TabHandle>) -> Vec<Redraw> {
        match state {
            Some(HistoryState::Home) if self.shell.is_open() => self.shell.toggle_editor(selected),
            Some(HistoryState::Editor) if !self.shell.is_open() => self.shell.toggle_editor(selected),
            _ => Vec::new(),
        }
    }

    /// 浏览器后退按钮
    pub fn navigate_back(&mut self, selected: Option<TabHandle>) -> Vec<Redraw> {
        let state = self.history.back();
        self.on_pop_state(state, selected)
    }

    /// 浏览器前进按钮
    pub fn navigate_forward(&mut self, selected: Option<TabHandle>) -> Vec<Redraw> {
        let state = self.history.forward();
        self.on_pop_state(state, selected)
    }

    pub fn handle_key(&mut self, press: KeyPress, selected: Option<TabHandle>) -> Vec<Redraw> {
        match self.shell.key_action(press) {
            Some(KeyAction::Toggle) | Some(KeyAction::Close) => self.toggle_editor(selected),
            None => Vec::new(),
        }
    }
}
