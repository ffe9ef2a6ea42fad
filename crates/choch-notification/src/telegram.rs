//! 텔레그램 알림 서비스.
//!
//! Telegram Bot API를 통해 CHoCH 시그널 알림을 전송합니다.

use crate::types::{NotificationError, NotificationResult, NotificationSender};
use async_trait::async_trait;
use choch_core::ChochSignal;
use tracing::{debug, info};

/// Telegram Bot API 기본 URL.
const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// 텔레그램 알림 전송 설정.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// @BotFather에서 받은 봇 토큰
    pub bot_token: String,
    /// 메시지를 보낼 채팅 ID
    pub chat_id: String,
    /// 전송 활성화 여부
    pub enabled: bool,
    /// 파싱 모드 (HTML 또는 MarkdownV2)
    pub parse_mode: String,
}

impl TelegramConfig {
    /// 새 텔레그램 설정을 생성합니다.
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            bot_token,
            chat_id,
            enabled: true,
            parse_mode: "HTML".to_string(),
        }
    }

    /// 환경 변수에서 설정을 생성합니다.
    ///
    /// `TELEGRAM_BOT_TOKEN`과 `TELEGRAM_CHAT_ID`가 없으면 `None`.
    pub fn from_env() -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok()?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID").ok()?;
        let enabled = std::env::var("TELEGRAM_ENABLED")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(true);

        Some(Self {
            bot_token,
            chat_id,
            enabled,
            parse_mode: "HTML".to_string(),
        })
    }
}

/// 텔레그램 알림 전송기.
pub struct TelegramSender {
    config: TelegramConfig,
    client: reqwest::Client,
    api_base: String,
}

impl TelegramSender {
    /// 새 텔레그램 전송기를 생성합니다.
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// 환경 변수에서 전송기를 생성합니다.
    pub fn from_env() -> Option<Self> {
        TelegramConfig::from_env().map(Self::new)
    }

    /// API 기본 URL을 바꿉니다 (테스트용).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// 시그널을 텔레그램 메시지로 포맷합니다.
    fn format_message(signal: &ChochSignal) -> String {
        let direction_emoji = match signal.direction.label() {
            "Long" => "🟢",
            _ => "🔴",
        };

        format!(
            "{direction_emoji} <b>{signal_type}</b>\n\n\
             심볼: <code>{symbol}</code>\n\
             타임프레임: {timeframe}\n\
             방향: {direction}\n\
             그룹: {group}\n\
             가격: {price}\n\
             시각: {signal_time} UTC",
            signal_type = signal.signal_type(),
            symbol = signal.symbol.to_exchange_symbol(),
            timeframe = signal.timeframe,
            direction = signal.direction.label(),
            group = signal.group,
            price = signal.price,
            signal_time = signal.signal_time.format("%Y-%m-%d %H:%M"),
        )
    }

    /// 연결을 확인합니다 (`getMe`).
    pub async fn test_connection(&self) -> NotificationResult<()> {
        let url = format!("{}/bot{}/getMe", self.api_base, self.config.bot_token);
        let response = self.client.get(&url).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotificationError::InvalidConfig(format!(
                "getMe 실패: {}",
                response.status()
            )))
        }
    }
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send_signal(&self, signal: &ChochSignal) -> NotificationResult<()> {
        if !self.config.enabled {
            debug!("텔레그램 전송 비활성화, 건너뜀");
            return Ok(());
        }

        let url = format!("{}/bot{}/sendMessage", self.api_base, self.config.bot_token);
        let body = serde_json::json!({
            "chat_id": self.config.chat_id,
            "text": Self::format_message(signal),
            "parse_mode": self.config.parse_mode,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v["parameters"]["retry_after"].as_u64())
                .unwrap_or(30);
            return Err(NotificationError::RateLimited(retry_after));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(NotificationError::SendFailed(format!(
                "{}: {}",
                status, text
            )));
        }

        info!(
            symbol = %signal.symbol,
            timeframe = %signal.timeframe,
            signal_type = signal.signal_type(),
            "텔레그램 알림 전송 완료"
        );
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn name(&self) -> &str {
        "telegram"
    }
}
