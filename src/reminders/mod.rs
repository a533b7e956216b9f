pub mod schedule;
pub mod service;

pub use schedule::{calculate_next_notification, calculate_next_notification_at, check_due_reminders};
pub use service::ReminderService;
