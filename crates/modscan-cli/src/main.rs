use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use modscan_core::{
    scan_dir_and_write, BatchOptions, CompiledDictionary, Decision, FileSource, Moderator,
    PrecheckRequest, PreviewRequest, RuleFile, SubmissionKind,
};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "modscan", version, about = "需求/报价提交内容审核扫描器")]
struct Cli {
    /// 规则文件路径（TOML），默认 ./rules/default.toml
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// 文本来源：--text 优先，其次 --input 文件，都没有时读取 stdin
#[derive(clap::Args, Debug)]
struct TextArgs {
    /// 直接给出待扫描文本
    #[arg(long, conflicts_with = "input")]
    text: Option<String>,

    /// 从文件读取待扫描文本
    #[arg(long)]
    input: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 扫描文本，输出命中、合并后的高亮段与决策
    Scan {
        #[command(flatten)]
        source: TextArgs,
    },

    /// 提交前预检，输出 {"level": ...}
    Precheck {
        /// 提交类型
        #[arg(long, value_enum, default_value = "need")]
        kind: KindArg,

        /// 规则字典不可用时的决策（pass / review / block），覆盖规则文件中的配置
        #[arg(long)]
        on_unavailable: Option<Decision>,

        #[command(flatten)]
        source: TextArgs,
    },

    /// 生成审核预览，输出 {"html": ...}
    Preview {
        #[command(flatten)]
        source: TextArgs,
    },

    /// 校验规则文件；存在被拒绝的规则时以非零码退出
    CheckRules,

    /// 对目录中的提交文本批量重审，生成 JSON 数组
    Batch {
        /// 输入目录
        #[arg(long)]
        input: PathBuf,

        /// 输出文件（JSON 数组）
        #[arg(long, default_value = "./moderation.json")]
        output: PathBuf,

        /// 线程数（"auto" = CPU 核心数）
        #[arg(long, default_value = "auto")]
        threads: String,

        /// 最大扫描文件大小（单位字节）
        #[arg(long)]
        max_file_size: Option<u64>,

        /// 目录遍历深度
        #[arg(long, default_value_t = 1)]
        max_depth: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Need,
    Offer,
    Message,
    Profile,
    Other,
}

impl From<KindArg> for SubmissionKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Need => SubmissionKind::Need,
            KindArg::Offer => SubmissionKind::Offer,
            KindArg::Message => SubmissionKind::Message,
            KindArg::Profile => SubmissionKind::Profile,
            KindArg::Other => SubmissionKind::Other,
        }
    }
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();
    let rules_path = cli.rules.unwrap_or_else(|| PathBuf::from("./rules/default.toml"));

    match cli.command {
        Commands::Scan { source } => {
            let (file, dict) = load_dictionary(&rules_path)?;
            let policy = file.decision_policy()?;
            let text = read_text(&source)?;
            let result = dict.scan(&text);
            let out = serde_json::json!({
                "matches": result.matches,
                "runs": result.runs,
                "original_runs": result.original_runs(),
                "highest_severity": result.highest_severity,
                "aligned": result.is_aligned(),
                "decision": policy.decide(&result),
            });
            print_json(&out)?;
        }
        Commands::Precheck { kind, on_unavailable, source } => {
            let mut moderator = build_moderator(&rules_path)?;
            if let Some(decision) = on_unavailable {
                moderator = moderator.on_unavailable(decision);
            }
            let req = PrecheckRequest { kind: kind.into(), text: Some(read_text(&source)?) };
            let resp = moderator.precheck("cli", &req, Instant::now())?;
            print_json(&resp)?;
        }
        Commands::Preview { source } => {
            let moderator = build_moderator(&rules_path)?;
            let req = PreviewRequest { text: Some(read_text(&source)?) };
            let resp = moderator.preview(&req)?;
            print_json(&resp)?;
        }
        Commands::CheckRules => {
            let (file, dict) = load_dictionary(&rules_path)?;
            let policy = file.decision_policy()?;
            info!(
                total = file.rules.len(),
                active = dict.len(),
                rejected = dict.rejected().len(),
                review_at = %policy.review_at(),
                block_at = %policy.block_at(),
                "rule file checked"
            );
            for err in dict.rejected() {
                eprintln!("rejected: {err}");
            }
            if !dict.rejected().is_empty() {
                bail!("{} rule(s) rejected in {}", dict.rejected().len(), rules_path.display());
            }
        }
        Commands::Batch { input, output, threads, max_file_size, max_depth } => {
            info!(?input, ?output, "starting batch re-moderation");
            let (file, dict) = load_dictionary(&rules_path)?;
            let policy = file.decision_policy()?;

            // 以缓冲方式打开输出文件，按 JSON 数组流式写入
            let mut out = BufWriter::new(File::create(&output).context("create output file")?);
            let opts = BatchOptions { max_file_size, threads: parse_threads(&threads), max_depth };
            let stats = scan_dir_and_write(&input, &mut out, &Arc::new(dict), policy, &opts)
                .context("batch scan failed")?;
            out.flush().context("flush output file")?;

            info!(
                files_scanned = stats.files_scanned,
                files_flagged = stats.files_flagged,
                outputs_written = stats.outputs_written,
                "batch finished"
            );
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 日志写到 stderr，stdout 只输出 JSON 结果
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn load_dictionary(path: &Path) -> Result<(RuleFile, CompiledDictionary)> {
    let file = RuleFile::load(path).with_context(|| format!("load rule file {}", path.display()))?;
    let dict = CompiledDictionary::compile(&file.rules);
    Ok((file, dict))
}

/// 预检/预览走网关：规则文件可读时沿用其中的策略配置，读取失败留给网关的降级逻辑（默认 pass）
fn build_moderator(path: &Path) -> Result<Moderator<FileSource>> {
    let moderator = Moderator::new(FileSource::new(path));
    match RuleFile::load(path) {
        Ok(file) => Ok(moderator
            .with_policy(file.decision_policy()?)
            .on_unavailable(file.policy.on_unavailable)),
        Err(err) => {
            warn!(
                rules = %path.display(),
                error = %err,
                "rule file unreadable; using default policy and fallback decision"
            );
            Ok(moderator)
        }
    }
}

fn read_text(args: &TextArgs) -> Result<String> {
    if let Some(t) = &args.text {
        return Ok(t.clone());
    }
    if let Some(p) = &args.input {
        let bytes = std::fs::read(p).with_context(|| format!("read input {}", p.display()))?;
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }
    let mut buf = Vec::new();
    std::io::stdin().read_to_end(&mut buf).context("read stdin")?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    serde_json::to_writer_pretty(&mut lock, value)?;
    writeln!(lock)?;
    Ok(())
}

/// 解析线程参数
fn parse_threads(s: &str) -> Option<usize> {
    if s.eq_ignore_ascii_case("auto") {
        return None;
    }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_threads_accepts_auto_and_positive_numbers() {
        assert_eq!(parse_threads("auto"), None);
        assert_eq!(parse_threads("AUTO"), None);
        assert_eq!(parse_threads("4"), Some(4));
        assert_eq!(parse_threads("0"), None);
        assert_eq!(parse_threads("lots"), None);
    }

    #[test]
    fn cli_parses_precheck_with_global_rules() {
        let cli = Cli::try_parse_from([
            "modscan", "precheck", "--kind", "offer", "--text", "hi", "--rules", "r.toml",
        ])
        .expect("parse cli");
        assert_eq!(cli.rules, Some(PathBuf::from("r.toml")));
        match cli.command {
            Commands::Precheck { kind, on_unavailable, source } => {
                assert!(matches!(SubmissionKind::from(kind), SubmissionKind::Offer));
                assert_eq!(on_unavailable, None);
                assert_eq!(source.text.as_deref(), Some("hi"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn bundled_rule_file_compiles_cleanly() {
        let file = RuleFile::from_toml_str(include_str!("../../../rules/default.toml"))
            .expect("parse bundled rules");
        let dict = CompiledDictionary::compile(&file.rules);
        assert!(dict.rejected().is_empty());
        assert_eq!(dict.len(), file.rules.iter().filter(|r| r.enabled).count());
        assert!(file.decision_policy().is_ok());
    }

    #[test]
    fn precheck_fallback_decision_is_parsed() {
        let cli = Cli::try_parse_from([
            "modscan", "precheck", "--on-unavailable", "Review", "--text", "hi",
        ])
        .expect("parse cli");
        match cli.command {
            Commands::Precheck { on_unavailable, .. } => {
                assert_eq!(on_unavailable, Some(Decision::Review));
            }
            other => panic!("unexpected command {other:?}"),
        }
        let bad = Cli::try_parse_from(["modscan", "precheck", "--on-unavailable", "allow"]);
        assert!(bad.is_err());
    }

    #[test]
    fn missing_rule_file_still_builds_moderator() {
        let moderator = build_moderator(Path::new("/nonexistent/modscan/rules.toml"))
            .expect("fallback moderator");
        let req = PrecheckRequest { kind: SubmissionKind::Need, text: Some("scam".into()) };
        let resp = moderator.precheck("cli", &req, Instant::now()).expect("precheck");
        assert_eq!(resp.level, Decision::Pass);
    }

    #[test]
    fn text_and_input_conflict() {
        let res = Cli::try_parse_from(["modscan", "scan", "--text", "a", "--input", "f.txt"]);
        assert!(res.is_err());
    }
}
