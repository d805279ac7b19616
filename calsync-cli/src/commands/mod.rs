pub mod configure;
pub mod list_calendars;
pub mod status;
pub mod sync;
