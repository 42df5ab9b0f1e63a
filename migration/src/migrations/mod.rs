pub mod m202608290001_create_users;
pub mod m202608290002_create_attendance_records;
