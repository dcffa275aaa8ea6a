//! Domain models and API DTOs.

pub mod pull_request;
pub mod team;
pub mod user;

pub use pull_request::{
    CreatePullRequestRequest, MAX_PR_ID_LEN, MergePullRequestRequest, MergeResponse, PrId,
    PrStatus, PullRequest, PullRequestRecord, PullRequestResponse, ReassignResponse,
    ReassignReviewerRequest, ReviewListResponse,
};
pub use team::{CreateTeamRequest, Team, TeamId, TeamQuery, TeamRecord, TeamResponse};
pub use user::{
    CreateUserRequest, DeactivateTeamRequest, MAX_USER_ID_LEN, SetIsActiveRequest, TeamMember, User,
    UserId, UserQuery, UserResponse, UserStats,
};
