//! CHoCH 실시간 모니터 CLI.

use choch_core::{init_logging, LogConfig, Symbol, Timeframe};
use choch_data::{BinanceFetcher, CandleFetcher};
use choch_engine::{EngineConfig, LogSink, ScanEngine, SignalSink};
use choch_monitor::{MonitorConfig, SymbolsSpec, TelegramSink};
use choch_notification::TelegramSender;
use clap::{Parser, Subcommand};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "choch-monitor")]
#[command(about = "CHoCH 시그널 실시간 모니터", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 실시간 모니터링 데몬 (Ctrl-C로 종료)
    Run,

    /// 단일 (심볼, 타임프레임)을 즉시 한 번 스캔
    Scan {
        /// 심볼 (예: "BTC/USDT" 또는 "BTCUSDT")
        #[arg(long)]
        symbol: String,

        /// 타임프레임 (예: "5m", "25m", "1h")
        #[arg(long, default_value = "5m")]
        timeframe: String,
    },
}

/// SYMBOLS 지정을 실제 심볼 목록으로 변환합니다.
async fn resolve_symbols(
    config: &MonitorConfig,
    fetcher: &dyn CandleFetcher,
) -> Result<Vec<Symbol>, Box<dyn std::error::Error>> {
    match &config.symbols {
        SymbolsSpec::List(symbols) => Ok(symbols.clone()),
        SymbolsSpec::All => {
            tracing::info!(
                quote = %config.quote_currency,
                min_volume_24h = %config.min_volume_24h,
                "전체 심볼 탐색 중..."
            );
            let symbols = fetcher
                .list_symbols(&config.quote_currency, config.min_volume_24h)
                .await?;
            tracing::info!(count = symbols.len(), "감시 대상 심볼 확정");
            Ok(symbols)
        }
    }
}

/// 텔레그램이 설정되어 있으면 텔레그램 싱크, 아니면 로그 싱크.
async fn build_sink() -> Arc<dyn SignalSink> {
    match TelegramSender::from_env() {
        Some(sender) => {
            if let Err(e) = sender.test_connection().await {
                tracing::warn!(error = %e, "텔레그램 연결 확인 실패, 계속 진행합니다");
            }
            tracing::info!("텔레그램 알림 활성화");
            Arc::new(TelegramSink::new(sender))
        }
        None => {
            tracing::info!("텔레그램 미설정, 로그 싱크 사용");
            Arc::new(LogSink)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging(LogConfig::new(cli.log_level.clone()))?;
    tracing::info!("CHoCH Monitor 시작");

    let config = MonitorConfig::from_env()?;
    let fetcher = Arc::new(BinanceFetcher::new());

    match cli.command {
        Commands::Run => {
            let symbols = resolve_symbols(&config, fetcher.as_ref()).await?;
            let sink = build_sink().await;

            tracing::info!(
                symbols = symbols.len(),
                timeframes = ?config.timeframes.iter().map(|tf| tf.to_string()).collect::<Vec<_>>(),
                window_size = config.window_size,
                grace_seconds = config.scan_grace_seconds,
                "모니터링 설정"
            );

            let engine_config = EngineConfig {
                symbols,
                timeframes: config.timeframes.clone(),
                window_size: config.window_size,
                scan_grace_seconds: config.scan_grace_seconds,
                fetch_timeout_seconds: config.fetch_timeout_seconds,
                detector: config.detector.clone(),
            };

            ScanEngine::new(engine_config, fetcher, sink)?.run().await?;
        }

        Commands::Scan { symbol, timeframe } => {
            let symbol = Symbol::from_pair(&symbol)
                .or_else(|| Symbol::from_exchange(&symbol, &config.quote_currency))
                .ok_or_else(|| format!("잘못된 심볼: {}", symbol))?;
            let timeframe = Timeframe::from_str(&timeframe)?;

            let sink = build_sink().await;
            let engine_config = EngineConfig {
                symbols: vec![symbol.clone()],
                timeframes: vec![timeframe],
                window_size: config.window_size,
                scan_grace_seconds: config.scan_grace_seconds,
                fetch_timeout_seconds: config.fetch_timeout_seconds,
                detector: config.detector.clone(),
            };
            let engine = ScanEngine::new(engine_config, fetcher, sink)?;

            match engine.scan_key(&symbol, timeframe).await? {
                Some(signal) => {
                    println!(
                        "✅ {} | {} {} | 그룹 {} | 가격 {} | {}",
                        signal.signal_type(),
                        signal.symbol,
                        signal.timeframe,
                        signal.group,
                        signal.price,
                        signal.signal_time
                    );
                }
                None => {
                    println!("시그널 없음: {} {}", symbol, timeframe);
                }
            }
        }
    }

    tracing::info!("CHoCH Monitor 종료");
    Ok(())
}
