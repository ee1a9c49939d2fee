pub mod analytics;
pub mod balance;
pub mod calendar;
pub mod department;
pub mod leave_request;
pub mod leave_type;
pub mod user;
