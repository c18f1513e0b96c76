//! Numeric error codes and the reason-string lookup.
//!
//! Codes follow the backend's banding: `0` is success, `-10xxx` are general
//! session errors, `-11xxx` channel errors, `-12xxx` storage, `-13xxx`
//! presence, `-14xxx` lock, `-15xxx` history. [`error_reason`] is total over
//! `i32`; unknown codes map to a fallback string rather than an error.

/// Every error code a result frame or the core itself can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Operation succeeded.
    Ok,

    // General
    /// Client instance was never initialized.
    NotInitialized,
    /// Operation requires a logged-in session.
    NotLoggedIn,
    /// Application identifier rejected by the backend.
    InvalidAppId,
    /// Token rejected at login or renew.
    InvalidToken,
    /// User id failed validation.
    InvalidUserId,
    /// Channel name failed validation.
    InvalidChannelName,
    /// Token reached its expiry.
    TokenExpired,
    /// Login did not complete in time.
    LoginTimeout,
    /// Backend refused the login.
    LoginRejected,
    /// Argument failed local or server validation.
    InvalidParameter,
    /// Same operation already in flight.
    DuplicateOperation,
    /// Client instance already released.
    InstanceReleased,
    /// Channel type not valid for this operation.
    InvalidChannelType,
    /// Too many operations in a short window.
    RateLimited,
    /// No usable link for the operation's service.
    NotConnected,
    /// No result arrived before the request deadline.
    OperationTimeout,
    /// Session ended while the request was pending.
    OperationCancelled,
    /// Link was aborted; the request can never complete.
    LinkAborted,

    // Channels
    /// Stream channel operation before join.
    ChannelNotJoined,
    /// Message channel operation before subscribe.
    ChannelNotSubscribed,
    /// Topic name failed validation.
    InvalidTopicName,
    /// Message payload rejected.
    InvalidMessage,
    /// Message payload over the size limit.
    MessageTooLarge,
    /// Too many topics joined in one channel.
    TopicLimitExceeded,
    /// Join attempt failed on the backend.
    ChannelJoinFailed,
    /// Subscribe attempt failed on the backend.
    ChannelSubscribeFailed,
    /// Subscribe did not complete in time.
    ChannelSubscribeTimeout,

    // Storage
    /// Storage backend rejected the operation.
    StorageOperationFailed,
    /// Too many metadata items.
    MetadataItemLimitExceeded,
    /// Metadata item failed validation.
    InvalidMetadataItem,
    /// Compare-and-set revision did not match.
    OutdatedMetadataRevision,

    // Presence
    /// Presence service unreachable.
    PresenceNotConnected,
    /// Presence state key or value rejected.
    InvalidPresenceState,
    /// Too many presence state keys.
    PresenceStateLimitExceeded,

    // Locks
    /// Lock backend rejected the operation.
    LockOperationFailed,
    /// Lock with this name already exists.
    LockAlreadyExists,
    /// Lock name failed validation.
    InvalidLockName,
    /// Lock is owned by another user.
    LockNotOwned,
    /// Lock does not exist.
    LockNotFound,

    // History
    /// History backend rejected the query.
    HistoryOperationFailed,
    /// History time range rejected.
    InvalidHistoryTimestamp,
}

impl ErrorCode {
    /// Numeric value carried on the wire and surfaced to the application.
    pub fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::NotInitialized => -10001,
            Self::NotLoggedIn => -10002,
            Self::InvalidAppId => -10003,
            Self::InvalidToken => -10005,
            Self::InvalidUserId => -10006,
            Self::InvalidChannelName => -10008,
            Self::TokenExpired => -10009,
            Self::LoginTimeout => -10011,
            Self::LoginRejected => -10012,
            Self::InvalidParameter => -10014,
            Self::DuplicateOperation => -10017,
            Self::InstanceReleased => -10018,
            Self::InvalidChannelType => -10019,
            Self::RateLimited => -10021,
            Self::NotConnected => -10022,
            Self::OperationTimeout => -10023,
            Self::OperationCancelled => -10024,
            Self::LinkAborted => -10025,
            Self::ChannelNotJoined => -11001,
            Self::ChannelNotSubscribed => -11002,
            Self::InvalidTopicName => -11008,
            Self::InvalidMessage => -11009,
            Self::MessageTooLarge => -11010,
            Self::TopicLimitExceeded => -11014,
            Self::ChannelJoinFailed => -11015,
            Self::ChannelSubscribeFailed => -11019,
            Self::ChannelSubscribeTimeout => -11020,
            Self::StorageOperationFailed => -12001,
            Self::MetadataItemLimitExceeded => -12002,
            Self::InvalidMetadataItem => -12003,
            Self::OutdatedMetadataRevision => -12005,
            Self::PresenceNotConnected => -13001,
            Self::InvalidPresenceState => -13002,
            Self::PresenceStateLimitExceeded => -13004,
            Self::LockOperationFailed => -14001,
            Self::LockAlreadyExists => -14004,
            Self::InvalidLockName => -14005,
            Self::LockNotOwned => -14006,
            Self::LockNotFound => -14008,
            Self::HistoryOperationFailed => -15001,
            Self::InvalidHistoryTimestamp => -15002,
        }
    }

    /// Parse a numeric code. Returns `None` for codes outside the table.
    pub fn from_code(code: i32) -> Option<Self> {
        ALL.iter().copied().find(|c| c.code() == code)
    }

    /// True for the success code.
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// True for the codes the core uses to report request deadlines.
    pub fn is_timeout(self) -> bool {
        matches!(
            self,
            Self::OperationTimeout | Self::LoginTimeout | Self::ChannelSubscribeTimeout
        )
    }

    /// Human-readable reason for this code.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotInitialized => "client instance not initialized",
            Self::NotLoggedIn => "operation requires a logged-in session",
            Self::InvalidAppId => "invalid application id",
            Self::InvalidToken => "invalid token",
            Self::InvalidUserId => "invalid user id",
            Self::InvalidChannelName => "invalid channel name",
            Self::TokenExpired => "token expired",
            Self::LoginTimeout => "login timed out",
            Self::LoginRejected => "login rejected by server",
            Self::InvalidParameter => "invalid parameter",
            Self::DuplicateOperation => "duplicate operation in flight",
            Self::InstanceReleased => "client instance already released",
            Self::InvalidChannelType => "invalid channel type",
            Self::RateLimited => "operation rate limit exceeded",
            Self::NotConnected => "service link not connected",
            Self::OperationTimeout => "operation timed out",
            Self::OperationCancelled => "operation cancelled by session shutdown",
            Self::LinkAborted => "link aborted",
            Self::ChannelNotJoined => "stream channel not joined",
            Self::ChannelNotSubscribed => "channel not subscribed",
            Self::InvalidTopicName => "invalid topic name",
            Self::InvalidMessage => "invalid message payload",
            Self::MessageTooLarge => "message exceeds size limit",
            Self::TopicLimitExceeded => "too many topics joined",
            Self::ChannelJoinFailed => "stream channel join failed",
            Self::ChannelSubscribeFailed => "channel subscribe failed",
            Self::ChannelSubscribeTimeout => "channel subscribe timed out",
            Self::StorageOperationFailed => "storage operation failed",
            Self::MetadataItemLimitExceeded => "too many metadata items",
            Self::InvalidMetadataItem => "invalid metadata item",
            Self::OutdatedMetadataRevision => "metadata revision outdated",
            Self::PresenceNotConnected => "presence service not connected",
            Self::InvalidPresenceState => "invalid presence state",
            Self::PresenceStateLimitExceeded => "too many presence state keys",
            Self::LockOperationFailed => "lock operation failed",
            Self::LockAlreadyExists => "lock already exists",
            Self::InvalidLockName => "invalid lock name",
            Self::LockNotOwned => "lock owned by another user",
            Self::LockNotFound => "lock does not exist",
            Self::HistoryOperationFailed => "history query failed",
            Self::InvalidHistoryTimestamp => "invalid history time range",
        }
    }
}

/// All known codes, used by [`ErrorCode::from_code`].
const ALL: &[ErrorCode] = &[
    ErrorCode::Ok,
    ErrorCode::NotInitialized,
    ErrorCode::NotLoggedIn,
    ErrorCode::InvalidAppId,
    ErrorCode::InvalidToken,
    ErrorCode::InvalidUserId,
    ErrorCode::InvalidChannelName,
    ErrorCode::TokenExpired,
    ErrorCode::LoginTimeout,
    ErrorCode::LoginRejected,
    ErrorCode::InvalidParameter,
    ErrorCode::DuplicateOperation,
    ErrorCode::InstanceReleased,
    ErrorCode::InvalidChannelType,
    ErrorCode::RateLimited,
    ErrorCode::NotConnected,
    ErrorCode::OperationTimeout,
    ErrorCode::OperationCancelled,
    ErrorCode::LinkAborted,
    ErrorCode::ChannelNotJoined,
    ErrorCode::ChannelNotSubscribed,
    ErrorCode::InvalidTopicName,
    ErrorCode::InvalidMessage,
    ErrorCode::MessageTooLarge,
    ErrorCode::TopicLimitExceeded,
    ErrorCode::ChannelJoinFailed,
    ErrorCode::ChannelSubscribeFailed,
    ErrorCode::ChannelSubscribeTimeout,
    ErrorCode::StorageOperationFailed,
    ErrorCode::MetadataItemLimitExceeded,
    ErrorCode::InvalidMetadataItem,
    ErrorCode::OutdatedMetadataRevision,
    ErrorCode::PresenceNotConnected,
    ErrorCode::InvalidPresenceState,
    ErrorCode::PresenceStateLimitExceeded,
    ErrorCode::LockOperationFailed,
    ErrorCode::LockAlreadyExists,
    ErrorCode::InvalidLockName,
    ErrorCode::LockNotOwned,
    ErrorCode::LockNotFound,
    ErrorCode::HistoryOperationFailed,
    ErrorCode::InvalidHistoryTimestamp,
];

/// Map any numeric code to a reason string.
///
/// Total over `i32`: codes not in the table return `"unknown error"` so a
/// newer backend never breaks an older client.
pub fn error_reason(code: i32) -> &'static str {
    ErrorCode::from_code(code).map_or("unknown error", ErrorCode::reason)
}
