mod goal;
mod ids;
mod summary;

pub use ids::{CompletionId, GoalId, ParseIdError};

pub use goal::{Goal, GoalCompletion, GoalError, TitledCompletion};
pub use summary::{CompletedGoal, WeekSummary};
