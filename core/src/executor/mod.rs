mod command;
mod history;

pub use command::CommandExecutor;
pub use history::CommandHistory;
