//! Small helpers shared by the route handlers

pub mod dates;
pub mod sanitize;

pub use dates::{format_display, is_past, normalize_deadline, parse_date_field};
pub use sanitize::{clean_optional, strip_html};
