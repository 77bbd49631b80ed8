// Request validation: structured issues, identifier parsing and field validators.

pub mod issue;
pub mod object_id;
pub mod validators;

pub use issue::{format_issues, issue_details, PathSegment, ValidationIssue};
pub use object_id::ObjectId;
