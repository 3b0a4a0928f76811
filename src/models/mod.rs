pub mod todo;
pub mod user;

pub use todo::{Projection, Todo, TodoId, TodoInput, TodoQuery, TodoSummary};
pub use user::{normalize_email, User};
