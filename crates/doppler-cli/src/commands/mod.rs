pub mod clean;
pub mod config;
pub mod info;
pub mod measure;
pub mod run;
