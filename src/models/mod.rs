//! Data models for the asset management backend

pub mod asset;
pub mod assignment;
pub mod category;
pub mod enums;
pub mod returning_request;
pub mod user;

// Re-export commonly used types
pub use asset::{Asset, AssetDetails, AssetListItem};
pub use assignment::{Assignment, AssignmentListItem, MyAssignmentItem};
pub use category::Category;
pub use enums::{AssetState, AssignmentState, Gender, ReturningRequestState, Role};
pub use returning_request::{ReturningRequest, ReturningRequestListItem};
pub use user::{User, UserClaims, UserDetails, UserListItem};
