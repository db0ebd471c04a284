use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use scanrelay_forwarder::{
    EcrFindingsFetcher, HttpPipelineSink, ScanForwarder, SecretsManagerProvider,
    TriggerNotification, config::ScanRelayConfig, metrics,
};

mod logging;

/// ScanRelay CLI — 이미지 스캔 결과 전달 명령줄 도구
#[derive(Parser)]
#[command(name = "scanrelay", version, about)]
struct Cli {
    /// 설정 파일 경로
    #[arg(short, long, default_value = "scanrelay.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 트리거 알림 한 건을 처리하여 findings를 전달
    Forward {
        /// 트리거 알림 JSON 파일 경로 ("-"이면 표준 입력)
        #[arg(short, long)]
        event: String,
    },
    /// 설정 관련 명령
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// 병합된 설정을 TOML로 출력
    Show,
    /// 설정 유효성 검증
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config).await?;
    logging::init_tracing(&config.general)?;
    metrics::describe_all();

    tracing::info!(config = %cli.config, "scanrelay starting");

    match cli.command {
        Commands::Forward { event } => {
            handle_forward(config, &event).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let toml_str =
                    toml::to_string_pretty(&config).context("failed to serialize config")?;
                println!("{toml_str}");
            }
            ConfigAction::Validate => {
                // load_config가 이미 검증을 통과시켰다
                println!("✓ configuration is valid");
            }
        },
    }

    Ok(())
}

/// 설정 파일이 있으면 파일+환경변수로, 없으면 환경변수만으로 설정을 구성합니다.
async fn load_config(path: &str) -> Result<ScanRelayConfig> {
    if PathBuf::from(path).exists() {
        ScanRelayConfig::load(path)
            .await
            .with_context(|| format!("failed to load config from {path}"))
    } else {
        ScanRelayConfig::from_env().context("no config file found and environment is incomplete")
    }
}

async fn handle_forward(config: ScanRelayConfig, event: &str) -> Result<()> {
    let raw = read_event(event).await?;
    let trigger =
        TriggerNotification::parse(&raw).context("failed to parse trigger notification")?;

    let forwarder = ScanForwarder::new(
        config.forward.clone(),
        SecretsManagerProvider::connect(&trigger.region).await,
        EcrFindingsFetcher::connect(&trigger.region).await,
        HttpPipelineSink::new(
            &config.forward.domain,
            Duration::from_secs(config.forward.http_timeout_secs),
        )?,
    )?;

    let report = forwarder
        .forward(&trigger)
        .await
        .context("forward invocation failed")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// 이벤트 JSON을 파일 또는 표준 입력에서 읽습니다.
async fn read_event(source: &str) -> Result<String> {
    if source == "-" {
        use tokio::io::AsyncReadExt;
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("failed to read event from stdin")?;
        Ok(buf)
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("failed to read event file {source}"))
    }
}
