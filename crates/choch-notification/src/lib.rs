//! # CHoCH Notification
//!
//! CHoCH 시그널 알림 서비스.
//!
//! 지원 채널:
//! - Telegram (Bot API)
//!
//! 엔진은 [`NotificationSender`] trait만 바라봅니다. 채널 구현체는
//! 바이너리 쪽에서 싱크 어댑터로 감싸 연결합니다.

pub mod telegram;
pub mod types;

pub use telegram::*;
pub use types::*;
