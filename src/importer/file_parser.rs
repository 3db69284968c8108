// ==========================================
// FatturaAnalyzer 导入核心 - 文本解析器实现
// ==========================================
// 职责: 原始文本 → 表头 + 有序数据行
// 支持: 可配置分隔符 / 分隔符嗅探 / 引号包裹的单元格
// ==========================================

use crate::domain::transaction::{ParsedFile, RawRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_trait::TextParser;
use csv::ReaderBuilder;
use tracing::debug;

/// 嗅探候选分隔符（平局时按此顺序优先）
const SNIFF_CANDIDATES: [u8; 3] = [b';', b',', b'\t'];

// ==========================================
// Delimiter - 分隔符设置
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Fixed(u8), // 固定分隔符
    Auto,      // 按表头行嗅探
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter::Fixed(b',')
    }
}

impl Delimiter {
    /// 从配置字符串解析: "auto" / "tab" / "\t" / 单个 ASCII 字符
    pub fn from_config_str(value: &str) -> Option<Self> {
        match value {
            "auto" => Some(Delimiter::Auto),
            "tab" | "\\t" | "\t" => Some(Delimiter::Fixed(b'\t')),
            _ => {
                let bytes = value.as_bytes();
                if bytes.len() == 1 && bytes[0].is_ascii() && bytes[0] != b'"' {
                    Some(Delimiter::Fixed(bytes[0]))
                } else {
                    None
                }
            }
        }
    }

    /// 确定实际分隔符
    pub fn resolve(&self, header_line: &str) -> u8 {
        match self {
            Delimiter::Fixed(b) => *b,
            Delimiter::Auto => sniff_delimiter(header_line),
        }
    }
}

/// 统计表头行中各候选分隔符出现次数，取最多者；全为 0 时回退逗号
fn sniff_delimiter(header_line: &str) -> u8 {
    let mut best = b',';
    let mut best_count = 0;
    for candidate in SNIFF_CANDIDATES {
        let count = header_line.bytes().filter(|b| *b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

/// 单元格清洗: TRIM + 去掉成对的首尾单/双引号
fn clean_cell(value: &str) -> String {
    let trimmed = value.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].trim().to_string();
        }
    }
    trimmed.to_string()
}

/// 物理行号计算器
///
/// csv 读取器会跳过空行且不计入行号，这里按记录的字节偏移自行计数
struct LineTracker<'a> {
    bytes: &'a [u8],
    offset: usize, // 已计数到的字节位置
    line: usize,   // offset 所在行号（1 起）
}

impl<'a> LineTracker<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            offset: 0,
            line: 1,
        }
    }

    /// 记录起始字节偏移 → 行号（越过记录前的空行）
    fn line_at(&mut self, record_start: usize) -> usize {
        let mut start = record_start.min(self.bytes.len());
        while start < self.bytes.len() && matches!(self.bytes[start], b'\n' | b'\r') {
            start += 1;
        }
        if start > self.offset {
            self.line += self.bytes[self.offset..start]
                .iter()
                .filter(|b| **b == b'\n')
                .count();
            self.offset = start;
        }
        self.line
    }
}

// ==========================================
// DelimitedTextParser 实现
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct DelimitedTextParser {
    delimiter: Delimiter,
}

impl DelimitedTextParser {
    pub fn new(delimiter: Delimiter) -> Self {
        Self { delimiter }
    }
}

impl TextParser for DelimitedTextParser {
    fn parse(&self, text: &str) -> ImportResult<ParsedFile> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        // 无非空行 → 空文件
        let header_line = text
            .lines()
            .find(|line| !line.trim().is_empty())
            .ok_or(ImportError::EmptyFile)?;

        let delimiter = self.delimiter.resolve(header_line);
        debug!(delimiter = %(delimiter as char).escape_default(), "分隔符已确定");

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        let mut lines = LineTracker::new(text);
        let mut header: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for result in reader.records() {
            let record = result?;

            // 跳过仅含空白的行
            if record.len() <= 1 && record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            let cells: Vec<String> = record.iter().map(clean_cell).collect();
            match header {
                None => header = Some(cells),
                Some(_) => {
                    let position = match record.position() {
                        Some(pos) => lines.line_at(pos.byte() as usize),
                        None => rows.len() + 2,
                    };
                    rows.push(RawRow { position, cells });
                }
            }
        }

        let header = header.ok_or(ImportError::EmptyFile)?;
        Ok(ParsedFile { header, rows })
    }
}
