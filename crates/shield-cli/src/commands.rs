pub mod rank;
pub mod run;
