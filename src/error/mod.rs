mod db;

pub use db::{DbError, ErrorCode};
