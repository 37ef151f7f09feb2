// Core module definition
mod adapters;
mod parallel;
mod runnable;

// Re-export module content
pub use adapters::{ModelRunnable, OutputRunnable, PromptRunnable};
pub use parallel::{BranchResults, RunnableParallel};
pub use runnable::{pipe, Runnable, RunnableFuture};
