pub mod alert;
pub mod message;
pub mod reading;
