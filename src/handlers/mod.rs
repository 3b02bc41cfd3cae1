pub mod chart;
pub mod demo;
pub mod export;
pub mod health;
pub mod period;

pub use chart::*;
pub use demo::*;
pub use export::*;
pub use health::*;
pub use period::*;
