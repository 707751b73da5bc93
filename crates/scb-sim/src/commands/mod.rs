pub mod aggregate;
pub mod dispatch;
pub mod plot;
pub mod points;
pub mod run;
pub mod worker;

