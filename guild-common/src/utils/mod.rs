pub mod time;
pub mod amount;
