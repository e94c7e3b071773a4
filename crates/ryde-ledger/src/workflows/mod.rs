pub mod history;
pub mod jobs;
