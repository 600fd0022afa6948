// 队列错误
// 11xxx
pub const QUEUE_ITEM_NOT_FOUND: u32 = 11001;
pub const INVALID_TRANSITION: u32 = 11002;
pub const SUBMISSION_DISABLED: u32 = 11003;
pub const SLOT_BUSY: u32 = 11004;
pub const HISTORY_NOT_FOUND: u32 = 11005;

// db错误
// 13xxx
pub const SOMETHING_WENT_WRONG: u32 = 13001;
pub const UNIQUE_CONSTRAINT_VIOLATION: u32 = 13002;

// request错误
// 20xxx
pub const VALIDATION_ERROR: u32 = 20001;
pub const JSON_REJECTION: u32 = 20002;
pub const COMMON_REQUEST_ERROR: u32 = 20004;
