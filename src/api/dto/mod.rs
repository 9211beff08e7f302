//! Data Transfer Objects for REST request/response serialization.
//!
//! DTOs keep the wire shapes apart from the domain types: sides, phases
//! and event kinds travel as plain strings.

pub mod bracket_dto;
pub mod common_dto;
pub mod session_dto;

pub use bracket_dto::*;
pub use common_dto::*;
pub use session_dto::*;
