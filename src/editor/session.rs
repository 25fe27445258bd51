use std::sync::Arc;

use super::history::{BrowserHistory, HistoryController, HistoryState};
use super::shell::{KeyPress, Redraw};
use super::tabs::{OutputTabManager, TabHandle};
use crate::archive::OutputArchive;
use crate::client::{GenerationFailure, GenerationService};
use crate::codegen::{GenerationPayload, GenerationResult, Language};
use crate::infrastructure::error::SiteError;

/// 类文件下拉组的标签
pub const CLASSES_GROUP_LABEL: &str = "Classes";

/// 已发出、尚未应用的生成请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingGeneration {
    pub sequence: u64,
    pub language: Language,
    pub source: String,
}

/// 应用生成结果后的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// 标签已替换，`selected` 为自动选中的主文件
    Applied { selected: TabHandle, tabs: usize },
    /// 失败，标签未改动
    Failed(GenerationFailure),
    /// 有更新的请求已发出，此响应被丢弃
    Stale { sequence: u64, latest: u64 },
}

/// 编辑器会话：开关状态、输出标签与生成服务的组合
pub struct EditorSession<H: BrowserHistory> {
    controller: HistoryController<H>,
    tabs: OutputTabManager,
    service: Arc<dyn GenerationService>,
    language: Language,
    source: String,
    latest_sequence: u64,
    last_failure: Option<GenerationFailure>,
}

impl<H: BrowserHistory> EditorSession<H> {
    pub fn new(history: H, service: Arc<dyn GenerationService>) -> Self {
        Self {
            controller: HistoryController::new(history),
            tabs: OutputTabManager::new(),
            service,
            language: Language::default(),
            source: String::new(),
            latest_sequence: 0,
            last_failure: None,
        }
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn tabs(&self) -> &OutputTabManager {
        &self.tabs
    }

    pub fn tabs_mut(&mut self) -> &mut OutputTabManager {
        &mut self.tabs
    }

    pub fn last_failure(&self) -> Option<&GenerationFailure> {
        self.last_failure.as_ref()
    }

    pub fn history(&self) -> &H {
        self.controller.history()
    }

    pub fn is_open(&self) -> bool {
        self.controller.is_open()
    }

    pub fn toggle_editor(&mut self) -> Vec<Redraw> {
        let selected = self.tabs.selected();
        self.controller.toggle_editor(selected)
    }

    pub fn handle_key(&mut self, press: KeyPress) -> Vec<Redraw> {
        let selected = self.tabs.selected();
        self.controller.handle_key(press, selected)
    }

    pub fn on_pop_state(&mut self, state: Option<HistoryState>) -> Vec<Redraw> {
        let selected = self.tabs.selected();
        self.controller.on_pop_state(state, selected)
    }

    pub fn clear_output_nav(&mut self) {
        self.tabs.clear_output_nav();
    }

    /// 记录一次新的生成请求，之前未完成的请求随之过期
    pub fn begin_generation(&mut self) -> PendingGeneration {
        self.latest_sequence += 1;
        PendingGeneration {
            sequence: self.latest_sequence,
            language: self.language,
            source: self.source.clone(),
        }
    }

    /// 应用某次请求的响应。失败或过期的响应不会改动标签。
    pub fn finish_generation(
        &mut self,
        pending: &PendingGeneration,
        response: Result<GenerationResult, GenerationFailure>,
    ) -> GenerationOutcome {
        if pending.sequence != self.latest_sequence {
            tracing::warn!(
                sequence = pending.sequence,
                latest = self.latest_sequence,
                "Discarding stale generation response"
            );
            return GenerationOutcome::Stale {
                sequence: pending.sequence,
                latest: self.latest_sequence,
            };
        }

        let outcome = response
            .and_then(|result| match &result.payload {
                GenerationPayload::Classes(files) if files.is_empty() => {
                    Err(GenerationFailure::Malformed("empty class list".to_string()))
                }
                _ => result
                    .decoded()
                    .map_err(|e| GenerationFailure::Malformed(e.to_string())),
            })
            .map(|decoded| self.apply_result(pending.language, &decoded));

        match outcome {
            Ok(selected) => {
                self.last_failure = None;
                GenerationOutcome::Applied {
                    selected,
                    tabs: self.tabs.tab_count(),
                }
            }
            Err(failure) => {
                tracing::error!(error = %failure, "Code generation failed, keeping previous output");
                self.last_failure = Some(failure.clone());
                GenerationOutcome::Failed(failure)
            }
        }
    }

    /// 发送当前源码并应用响应
    pub async fn compile(&mut self) -> GenerationOutcome {
        let pending = self.begin_generation();
        let service = Arc::clone(&self.service);
        let response = service.generate(pending.language, &pending.source).await;
        self.finish_generation(&pending, response)
    }

    /// 用已解码的结果替换全部标签，并选中主文件
    fn apply_result(&mut self, language: Language, result: &GenerationResult) -> TabHandle {
        self.tabs.clear_output_nav();

        let main = self.tabs.add_output(language, &result.main.name, &result.main.content);
        self.tabs.add_output(language, &result.util.name, &result.util.content);

        match &result.payload {
            GenerationPayload::Data(file) => {
                self.tabs.add_output(language, &file.name, &file.content);
            }
            GenerationPayload::Classes(files) => {
                let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
                let contents: Vec<&str> = files.iter().map(|f| f.content.as_str()).collect();
                // 空列表已在 finish_generation 中拒绝
                if let Err(e) = self.tabs.add_output_dropdown(language, CLASSES_GROUP_LABEL, &names, &contents) {
                    tracing::error!(error = %e, "Unable to add class dropdown");
                }
            }
        }

        if let Err(e) = self.tabs.select_output(main) {
            tracing::error!(error = %e, "Unable to select main output");
        }
        main
    }

    /// 把当前所有生成文件打包成 parser.zip
    pub fn download_output(&self) -> Result<OutputArchive, SiteError> {
        OutputArchive::build(self.tabs.files())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::GeneratedFile;
    use crate::editor::history::SessionHistory;
    use async_trait::async_trait;

    struct NeverCalled;

    #[async_trait]
    impl GenerationService for NeverCalled {
        async fn generate(&self, _: Language, _: &str) -> Result<GenerationResult, GenerationFailure> {
            Err(GenerationFailure::Service("not expected".to_string()))
        }
    }

    fn session() -> EditorSession<SessionHistory> {
        EditorSession::new(SessionHistory::new(), Arc::new(NeverCalled))
    }

    fn python_result() -> GenerationResult {
        GenerationResult {
            main: GeneratedFile::new("Main.py", "print%20'main'"),
            util: GeneratedFile::new("util.py", "util"),
            payload: GenerationPayload::Data(GeneratedFile::new("data.py", "data")),
        }
    }

    #[test]
    fn test_sequences_increase() {
        let mut session = session();
        let first = session.begin_generation();
        let second = session.begin_generation();
        assert!(second.sequence > first.sequence);
    }

    #[test]
    fn test_apply_python_result() {
        let mut session = session();
        session.set_language(Language::Python);
        let pending = session.begin_generation();

        let outcome = session.finish_generation(&pending, Ok(python_result()));
        let selected = match outcome {
            GenerationOutcome::Applied { selected, tabs } => {
                assert_eq!(tabs, 3);
                selected
            }
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert_eq!(session.tabs().selected(), Some(selected));
        assert_eq!(session.tabs().content_view(selected).unwrap().content, "print 'main'");
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut session = session();
        let first = session.begin_generation();
        let second = session.begin_generation();

        session.finish_generation(&second, Ok(python_result()));
        let before = session.tabs().files().len();

        let outcome = session.finish_generation(&first, Ok(python_result()));
        assert_eq!(outcome, GenerationOutcome::Stale { sequence: first.sequence, latest: second.sequence });
        assert_eq!(session.tabs().files().len(), before);
    }

    #[test]
    fn test_undecodable_content_fails_closed() {
        let mut session = session();
        let pending = session.begin_generation();
        session.finish_generation(&pending, Ok(python_result()));
        let selected = session.tabs().selected();

        let mut broken = python_result();
        broken.main.content = "%FF%FE".to_string();
        let pending = session.begin_generation();
        let outcome = session.finish_generation(&pending, Ok(broken));

        assert!(matches!(outcome, GenerationOutcome::Failed(GenerationFailure::Malformed(_))));
        assert_eq!(session.tabs().tab_count(), 3);
        assert_eq!(session.tabs().selected(), selected);
        assert!(session.last_failure().is_some());
    }

    #[test]
    fn test_empty_class_list_is_rejected() {
        let mut session = session();
        let pending = session.begin_generation();
        session.finish_generation(&pending, Ok(python_result()));
        let before = session.tabs().render();

        let empty = GenerationResult {
            main: GeneratedFile::new("Main.java", ""),
            util: GeneratedFile::new("InstaParseUtil.java", ""),
            payload: GenerationPayload::Classes(Vec::new()),
        };
        let pending = session.begin_generation();
        let outcome = session.finish_generation(&pending, Ok(empty));

        assert!(matches!(outcome, GenerationOutcome::Failed(GenerationFailure::Malformed(_))));
        assert_eq!(session.tabs().render(), before);
    }

    #[test]
    fn test_toggle_requests_redraw_of_selected_output() {
        let mut session = session();
        let pending = session.begin_generation();
        session.finish_generation(&pending, Ok(python_result()));
        let selected = session.tabs().selected().unwrap();

        let redraws = session.toggle_editor();
        assert_eq!(redraws, vec![Redraw::EditSurface, Redraw::OutputView(selected)]);
        assert!(session.toggle_editor().is_empty());
    }
}
