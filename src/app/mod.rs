pub mod dispatch;
pub mod doctor;
