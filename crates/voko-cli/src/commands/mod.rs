pub mod reset;
pub mod run;
pub mod show;
