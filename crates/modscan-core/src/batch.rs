//! 批量重审：规则字典变更后对已有提交文本逐文件重新扫描，流式输出 JSON 数组
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::decision::DecisionPolicy;
use crate::detectors::CompiledDictionary;
use crate::options::{BatchOptions, BatchStats};
use crate::types::{Decision, Run, Severity};

/// 单个文件的重审结果（runs 为原文字节偏移）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileVerdict {
    pub file: String,
    pub level: Decision,
    pub highest_severity: Option<Severity>,
    pub runs: Vec<Run>,
}

/// 扫描目录并将结果以 JSON 数组流式写入 `out`
/// 稳定性保证：先收集文件并按相对路径排序，输出顺序与线程数无关
pub fn scan_dir_and_write(
    input_dir: &Path,
    out: &mut dyn Write,
    dict: &Arc<CompiledDictionary>,
    policy: DecisionPolicy,
    opts: &BatchOptions,
) -> Result<BatchStats> {
    let files = collect_files(input_dir, opts.max_depth);
    let mut stats = BatchStats::default();

    let threads = opts.threads.unwrap_or_else(num_cpus::get);
    if threads > 1 && files.len() > 1 {
        scan_and_write_parallel(&files, out, dict, policy, opts, &mut stats, threads)?;
    } else {
        write!(out, "[")?;
        let mut first = true;
        for (name, path) in &files {
            let verdict = scan_one(name, path, dict, policy, opts.max_file_size);
            emit(out, verdict, &mut first, &mut stats)?;
        }
        write!(out, "]")?;
    }

    tracing::info!(
        files_scanned = stats.files_scanned,
        files_skipped = stats.files_skipped,
        files_flagged = stats.files_flagged,
        "batch re-moderation finished"
    );
    Ok(stats)
}

/// 收集普通文件：(相对路径, 绝对路径)，按相对路径排序
fn collect_files(input_dir: &Path, max_depth: usize) -> Vec<(String, PathBuf)> {
    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for entry in WalkDir::new(input_dir).min_depth(1).max_depth(max_depth.max(1)) {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::debug!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry
            .path()
            .strip_prefix(input_dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        files.push((name, entry.into_path()));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    files
}

/// 扫描单个文件；超限或读取失败返回 None（计为跳过）
fn scan_one(
    name: &str,
    path: &Path,
    dict: &CompiledDictionary,
    policy: DecisionPolicy,
    max_file_size: Option<u64>,
) -> Option<FileVerdict> {
    if let Some(max) = max_file_size {
        if let Ok(md) = std::fs::metadata(path) {
            if md.len() > max {
                return None;
            }
        }
    }
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(err) => {
            tracing::debug!(file = name, error = %err, "skipping unreadable file");
            return None;
        }
    };
    // 非 UTF-8 字节按有损方式转换，保证可扫描、可写入 JSON
    let text = String::from_utf8_lossy(&bytes);
    let result = dict.scan(&text);
    Some(FileVerdict {
        file: name.to_string(),
        level: policy.decide(&result),
        highest_severity: result.highest_severity,
        runs: result.original_runs(),
    })
}

fn emit(
    out: &mut dyn Write,
    verdict: Option<FileVerdict>,
    first: &mut bool,
    stats: &mut BatchStats,
) -> Result<()> {
    let verdict = match verdict {
        Some(v) => v,
        None => {
            stats.files_skipped += 1;
            return Ok(());
        }
    };
    stats.files_scanned += 1;
    if verdict.level != Decision::Pass {
        stats.files_flagged += 1;
    }
    if !*first {
        write!(out, ",")?;
    } else {
        *first = false;
    }
    serde_json::to_writer(&mut *out, &verdict)?;
    stats.outputs_written += 1;
    Ok(())
}

/// 并行调度：
/// - 后台线程内创建 Rayon 线程池并行扫描
/// - 单线程 Writer 按 idx 重排并流式写 JSON，保证稳定顺序
fn scan_and_write_parallel(
    files: &[(String, PathBuf)],
    out: &mut dyn Write,
    dict: &Arc<CompiledDictionary>,
    policy: DecisionPolicy,
    opts: &BatchOptions,
    stats: &mut BatchStats,
    threads: usize,
) -> Result<()> {
    use crossbeam_channel as channel;
    use rayon::prelude::*;

    type Msg = (usize /*idx*/, Option<FileVerdict>);
    let (tx, rx) = channel::bounded::<Msg>(256);

    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    let dict = Arc::clone(dict);
    let max_file_size = opts.max_file_size;
    let jobs: Vec<(usize, String, PathBuf)> = files
        .iter()
        .enumerate()
        .map(|(i, (name, path))| (i, name.clone(), path.clone()))
        .collect();

    // Writer 保持在当前线程，扫描在后台线程的线程池内执行
    let scan_thread = std::thread::spawn(move || {
        pool.install(|| {
            jobs.par_iter().for_each_with(tx, |tx, (idx, name, path)| {
                let verdict = scan_one(name, path, &dict, policy, max_file_size);
                let _ = tx.send((*idx, verdict));
            });
        });
    });

    // 写出失败时先释放接收端（后台发送不再阻塞），再回收扫描线程，最后上抛错误
    let written = write_ordered(out, &rx, stats);
    drop(rx);
    let joined = scan_thread.join();
    written?;
    if joined.is_err() {
        anyhow::bail!("batch scan worker panicked");
    }
    Ok(())
}

fn write_ordered(
    out: &mut dyn Write,
    rx: &crossbeam_channel::Receiver<(usize, Option<FileVerdict>)>,
    stats: &mut BatchStats,
) -> Result<()> {
    use std::collections::BTreeMap;

    write!(out, "[")?;
    let mut first = true;
    let mut next_idx: usize = 0;
    let mut buffer: BTreeMap<usize, Option<FileVerdict>> = BTreeMap::new();
    while let Ok((idx, verdict)) = rx.recv() {
        buffer.insert(idx, verdict);
        while let Some(verdict) = buffer.remove(&next_idx) {
            emit(out, verdict, &mut first, stats)?;
            next_idx += 1;
        }
    }
    write!(out, "]")?;
    Ok(())
}
