pub mod checklist;
pub mod controller;
pub mod error;
pub mod gate;
pub mod interceptors;
pub mod parser;
pub mod report;
pub mod rules;
pub mod run;
pub mod submission;
