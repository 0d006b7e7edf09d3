pub mod mailer;
pub mod reading;
pub mod sessions;
pub mod upstream;
