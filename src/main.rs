// ==========================================
// FatturaAnalyzer 导入核心 - 命令行入口
// ==========================================
// 命令: preview / submit / template
// 输出: 文本摘要（默认）或 JSON
// ==========================================

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fattura_import::config::ConfigManager;
use fattura_import::i18n::{self, t, t_with_args};
use fattura_import::importer::{render_template, transaction_schema, Delimiter};
use fattura_import::session::{preview_summary, ImportSession, JsonLinesSink};
use fattura_import::{logging, ImportError, PreviewBuilder, PreviewResult};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "fattura-import",
    version,
    about = "Bank statement import preview and submission"
)]
struct Cli {
    /// 配置文件路径（缺省: 用户配置目录下 fattura-import/import.json）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 输出语言 (en / it / zh-CN)
    #[arg(
        long,
        global = true,
        default_value = "en",
        value_parser = i18n::SUPPORTED_LOCALES
    )]
    locale: String,

    /// JSON 格式日志
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 解析并校验文件，输出预览
    Preview {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// 预览后提交有效记录到 JSON Lines 文件
    Submit {
        file: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// 取消勾选的有效记录下标（0 起）
        #[arg(long = "exclude", value_delimiter = ',')]
        exclude: Vec<usize>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// 输出导入模板
    Template {
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value = ",")]
        delimiter: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.json_logs);

    i18n::set_locale(&cli.locale);

    info!(version = fattura_import::VERSION, "{}", fattura_import::APP_NAME);

    let config = match &cli.config {
        Some(path) => ConfigManager::load(path)?,
        None => ConfigManager::load_default()?,
    };

    match cli.command {
        Command::Preview { file, format } => {
            let builder = PreviewBuilder::from_config(&config).await?;
            let text = read_input(&file).await?;
            let preview = builder
                .build(fattura_import::ImportType::Transactions, &text)
                .map_err(explain_rejection)?;
            print_preview(&preview, format)?;
        }
        Command::Submit {
            file,
            out,
            mut exclude,
            format,
        } => {
            let builder = PreviewBuilder::from_config(&config).await?;
            let mut session = ImportSession::new(builder, JsonLinesSink::new(out));

            if !file.exists() {
                return Err(file_not_found(&file));
            }
            let preview = session.load_file(&file).await.map_err(explain_rejection)?;
            if format == OutputFormat::Text {
                println!("{}", preview_summary(preview));
            }

            exclude.sort_unstable();
            exclude.dedup();
            for index in exclude {
                session.toggle(index)?;
            }

            match session.submit().await {
                Ok(report) => match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                    OutputFormat::Text => println!("{}", report.summary_message()),
                },
                Err(ImportError::EmptySelection) => bail!(t("submission.empty_selection")),
                Err(e @ ImportError::SinkRejection(_)) => {
                    eprintln!("{}", t("submission.retry"));
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Template { out, delimiter } => {
            let delimiter = match Delimiter::from_config_str(&delimiter) {
                Some(Delimiter::Fixed(b)) => b,
                _ => bail!("delimiter must be a single character"),
            };
            let template = render_template(&transaction_schema(), delimiter)?;
            match out {
                Some(path) => {
                    tokio::fs::write(&path, template)
                        .await
                        .with_context(|| format!("cannot write {}", path.display()))?;
                    let shown = path.display().to_string();
                    println!(
                        "{}",
                        t_with_args("import.template_written", &[("path", shown.as_str())])
                    );
                }
                None => print!("{}", template),
            }
        }
    }

    Ok(())
}

async fn read_input(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(file_not_found(path));
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))
}

fn file_not_found(path: &Path) -> anyhow::Error {
    let shown = path.display().to_string();
    anyhow::anyhow!(t_with_args("import.file_not_found", &[("path", shown.as_str())]))
}

/// 文件级拒绝附带本地化提示
fn explain_rejection(err: ImportError) -> anyhow::Error {
    if err.is_fatal_for_file() {
        let reason = err.to_string();
        anyhow::Error::new(err).context(format!(
            "{} {}",
            t_with_args("import.rejected", &[("reason", reason.as_str())]),
            t("import.reselect")
        ))
    } else {
        err.into()
    }
}

fn print_preview(preview: &PreviewResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(preview)?),
        OutputFormat::Text => {
            println!("{}", preview_summary(preview));
            for (idx, record) in preview.valid.iter().enumerate() {
                println!(
                    "  [{idx}] row {:>4}  {}  {:>12}  {}",
                    record.row, record.date, record.amount, record.description
                );
            }
            for failure in &preview.invalid {
                println!("  invalid row {:>4}: {}", failure.row, failure.reasons.join("; "));
            }
            for flag in &preview.duplicates {
                println!("  duplicate row {:>4}: {}", flag.row, flag.reason);
            }
            for skipped in &preview.skipped {
                println!("  skipped row {:>4}: {}", skipped.row, skipped.reason);
            }
            if preview.valid.is_empty() {
                println!("{}", t("preview.nothing_valid"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_locale_is_accepted() {
        let cli = Cli::try_parse_from(["fattura-import", "--locale", "it", "template"]).unwrap();
        assert_eq!(cli.locale, "it");
        assert!(matches!(cli.command, Command::Template { .. }));
    }

    #[test]
    fn test_unsupported_locale_is_rejected() {
        let err =
            Cli::try_parse_from(["fattura-import", "--locale", "fr", "template"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn test_locale_defaults_to_english() {
        let cli = Cli::try_parse_from(["fattura-import", "preview", "estratto.csv"]).unwrap();
        assert_eq!(cli.locale, "en");
    }
}
