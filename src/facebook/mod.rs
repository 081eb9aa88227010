//! Facebook integration: Graph API client and signed_request verification

pub mod graph;
pub mod signed_request;

pub use graph::{FriendList, GraphClient, GraphError, GraphFriend, LongLivedToken};
pub use signed_request::{parse_signed_request, SignedRequest, SignedRequestError};
