use clap::Parser;
use jsoniter::core::ConfigProvider;
use jsoniter::utils::error::{ErrorSeverity, JsonError};
use jsoniter::utils::{logger, validation::Validate};
use jsoniter::{CliConfig, ExtractEngine, ExtractPipeline, JobConfig, LocalStorage};

fn main() {
    let cli = CliConfig::parse();

    // --config 指定的 TOML 取代其他抽取參數
    let job = cli.config.as_deref().map(JobConfig::from_file).transpose();

    // 初始化日誌
    let (verbose, log_format) = match &job {
        Ok(Some(job)) => (
            cli.verbose || job.verbose(),
            job.log_format().unwrap_or(cli.log_format.as_str()).to_string(),
        ),
        _ => (cli.verbose, cli.log_format.clone()),
    };
    logger::init_logger(verbose, &log_format);

    tracing::info!("Starting jsoniter CLI");

    let result = match job {
        Ok(Some(job)) => {
            tracing::debug!("Job config: {:?}", job);
            run(job)
        }
        Ok(None) => {
            tracing::debug!("CLI config: {:?}", cli);
            run(cli)
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(outputs) => {
            tracing::info!("✅ Extraction completed successfully!");
            println!("✅ Extraction completed successfully!");
            for output in outputs {
                println!("📁 Output saved to: {}", output);
            }
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Extraction failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let code = exit_code(&e);
            if code > 0 {
                std::process::exit(code);
            }
        }
    }
}

fn run<C: ConfigProvider + Validate>(config: C) -> jsoniter::Result<Vec<String>> {
    config.validate()?;

    let storage = LocalStorage::new(".".to_string());
    let engine = ExtractEngine::new(ExtractPipeline::new(storage, config));
    engine.run()
}

/// 根據錯誤嚴重程度決定退出碼
fn exit_code(e: &JsonError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,      // 警告，但成功
        ErrorSeverity::Medium => 2,   // 處理錯誤
        ErrorSeverity::High => 1,     // 輸入或設定錯誤
        ErrorSeverity::Critical => 3, // 系統錯誤
    }
}
