pub mod activity;
pub mod candidate;
pub mod import_file;
pub mod issue;
pub mod member;
pub mod project;
