mod activity;
mod ids;
mod question;
mod settings;
mod summary;

pub use activity::{ActivityConfig, ActivityError, Presentation};
pub use ids::{ActivityId, ParseIdError, QuestionId, RunId};
pub use question::{
    MAX_OPERANDS, OperandKey, OperandSlots, Question, QuestionDraft, QuestionError, format_number,
};
pub use settings::{RunSettings, SettingsError};
pub use summary::{RunSummary, RunSummaryError};
