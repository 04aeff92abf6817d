pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod scanner;
pub mod validator;
