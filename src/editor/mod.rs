pub mod history;
pub mod session;
pub mod shell;
pub mod tabs;

pub use history::{BrowserHistory, HistoryController, HistoryState, SessionHistory};
pub use session::{EditorSession, GenerationOutcome, PendingGeneration, CLASSES_GROUP_LABEL};
pub use shell::{EditorShell, Focus, Key, KeyPress, Redraw};
pub use tabs::{OutputTabManager, OutputView, SelectionChange, TabError, TabHandle, TabView};
