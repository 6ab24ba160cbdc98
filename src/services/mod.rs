pub mod sweeper;

pub use sweeper::OverdueSweeper;
