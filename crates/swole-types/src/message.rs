//! Response messages
//!
//! Every non-collection response body is one of these strings, JSON-encoded.

pub const USER_CREATED: &str = "Let's get SWOLE";
pub const USERNAME_TAKEN: &str = "Error: the username is already in use.";
pub const USER_VERIFIED: &str = "User has been verified";
pub const USER_NOT_VERIFIED: &str = "User NOT verified";
pub const PASSWORD_NOT_VERIFIED: &str = "Password NOT verified";
pub const USER_DELETED: &str = "User is no longer swole";
pub const USER_NOT_FOUND: &str = "Error: user not found";

pub const WORKOUT_CREATED: &str = "A new workout has been created";
pub const WORKOUT_UPDATED: &str = "Your workout has been updated";
pub const WORKOUT_DELETED: &str = "The workout has been deleted";
pub const WORKOUT_NOT_FOUND: &str = "Error: workout not found";

pub const INVALID_ID: &str = "Error: id must be an integer";
pub const NOT_JSON: &str = "Error: Data must be json";
pub const INTERNAL_ERROR: &str = "Error: internal server error";
