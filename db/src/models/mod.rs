pub mod attendance_record;
pub mod user;

pub use attendance_record::Entity as AttendanceRecord;
pub use user::Entity as User;
