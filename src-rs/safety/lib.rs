pub mod rate_limit;
pub mod sensitive;
pub mod validator;
pub mod zones;

pub use rate_limit::RateLimiter;
pub use sensitive::{SensitiveDataDetector, SENSITIVE_KEYWORDS};
pub use validator::{default_blocklist, SafetyValidator, Verdict};
pub use zones::{SafetyZone, ZoneSeverity};
