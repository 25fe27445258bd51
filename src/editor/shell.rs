use super::tabs::TabHandle;

/// 切换编辑器的快捷键
pub const TOGGLE_KEY: char = 'e';

/// 编辑器打开后需要重绘的内容
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    /// 聚焦并刷新编辑区
    EditSurface,
    /// 隐藏期间渲染的输出视图需要刷新
    OutputView(TabHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
}

/// 按键发生时的焦点位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Global,
    TextField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub focus: Focus,
}

impl KeyPress {
    pub fn global(key: Key) -> Self {
        Self { key, focus: Focus::Global }
    }

    pub fn in_text_field(key: Key) -> Self {
        Self { key, focus: Focus::TextField }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Toggle,
    Close,
}

/// 编辑器浮层的开关状态
#[derive(Debug, Clone, Default)]
pub struct EditorShell {
    is_open: bool,
}

impl EditorShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// 翻转开关状态，返回打开时需要的重绘
    pub fn toggle_editor(&mut self, selected: Option<TabHandle>) -> Vec<Redraw> {
        self.is_open = !self.is_open;
        if !self.is_open {
            return Vec::new();
        }

        let mut redraws = vec![Redraw::EditSurface];
        if let Some(handle) = selected {
            redraws.push(Redraw::OutputView(handle));
        }
        redraws
    }

    /// 快捷键映射：文本框内输入的字符不触发切换，Esc 只在打开时关闭
    pub fn key_action(&self, press: KeyPress) -> Option<KeyAction> {
        match press.key {
            Key::Escape if self.is_open => Some(KeyAction::Close),
            Key::Char(c) if c == TOGGLE_KEY && press.focus == Focus::Global => Some(KeyAction::Toggle),
            _ => None,
        }
    }
}
