use crate::error::Result;
use crate::model::LineCounts;
use std::path::Path;

pub const BINARY_LANGUAGE: &str = "__binary__";
pub const EMPTY_LANGUAGE: &str = "__empty__";
pub const UNKNOWN_LANGUAGE: &str = "__unknown__";

/// Language tag and line composition of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLines {
    pub language: String,
    pub counts: LineCounts,
}

pub trait LineClassifier: Send + Sync {
    fn classify(&self, path: &Path) -> Result<FileLines>;
}

/// Comment syntax of a language. Prose languages count every non-empty
/// line as documentation.
#[derive(Debug, Clone, Copy)]
pub struct Syntax {
    pub name: &'static str,
    pub line_comments: &'static [&'static str],
    pub block_comment: Option<(&'static str, &'static str)>,
    pub prose: bool,
}

const fn code(
    name: &'static str,
    line_comments: &'static [&'static str],
    block_comment: Option<(&'static str, &'static str)>,
) -> Syntax {
    Syntax { name, line_comments, block_comment, prose: false }
}

const fn prose(name: &'static str) -> Syntax {
    Syntax { name, line_comments: &[], block_comment: None, prose: true }
}

const C_BLOCK: Option<(&str, &str)> = Some(("/*", "*/"));
const XML_BLOCK: Option<(&str, &str)> = Some(("<!--", "-->"));

const LANGUAGES: &[(&[&str], Syntax)] = &[
    (&["rs"], code("Rust", &["//"], C_BLOCK)),
    (&["py", "pyi", "pyw"], code("Python", &["#"], None)),
    (&["js", "mjs", "cjs", "jsx"], code("JavaScript", &["//"], C_BLOCK)),
    (&["ts", "tsx", "mts", "cts"], code("TypeScript", &["//"], C_BLOCK)),
    (&["go"], code("Go", &["//"], C_BLOCK)),
    (&["java"], code("Java", &["//"], C_BLOCK)),
    (&["kt", "kts"], code("Kotlin", &["//"], C_BLOCK)),
    (&["scala", "sc"], code("Scala", &["//"], C_BLOCK)),
    (&["c", "h"], code("C", &["//"], C_BLOCK)),
    (&["cpp", "cc", "cxx", "hpp", "hh", "hxx"], code("C++", &["//"], C_BLOCK)),
    (&["cs"], code("C#", &["//"], C_BLOCK)),
    (&["swift"], code("Swift", &["//"], C_BLOCK)),
    (&["dart"], code("Dart", &["//"], C_BLOCK)),
    (&["php"], code("PHP", &["//", "#"], C_BLOCK)),
    (&["rb", "rake"], code("Ruby", &["#"], Some(("=begin", "=end")))),
    (&["pl", "pm"], code("Perl", &["#"], None)),
    (&["lua"], code("Lua", &["--"], Some(("--[[", "]]")))),
    (&["hs"], code("Haskell", &["--"], Some(("{-", "-}")))),
    (&["r"], code("R", &["#"], None)),
    (&["sql"], code("SQL", &["--"], C_BLOCK)),
    (&["sh", "bash", "zsh"], code("Bash", &["#"], None)),
    (&["ps1", "psm1"], code("PowerShell", &["#"], Some(("<#", "#>")))),
    (&["html", "htm"], code("HTML", &[], XML_BLOCK)),
    (&["xml", "xsd", "svg"], code("XML", &[], XML_BLOCK)),
    (&["css"], code("CSS", &[], C_BLOCK)),
    (&["scss", "sass", "less"], code("SCSS", &["//"], C_BLOCK)),
    (&["json"], code("JSON", &[], None)),
    (&["yml", "yaml"], code("YAML", &["#"], None)),
    (&["toml"], code("TOML", &["#"], None)),
    (&["ini", "cfg"], code("INI", &[";", "#"], None)),
    (&["md", "markdown"], prose("Markdown")),
    (&["rst"], prose("reStructuredText")),
    (&["txt"], prose("Text only")),
];

const FILE_NAMES: &[(&str, Syntax)] = &[
    ("Makefile", code("Makefile", &["#"], None)),
    ("makefile", code("Makefile", &["#"], None)),
    ("Dockerfile", code("Docker", &["#"], None)),
    ("CMakeLists.txt", code("CMake", &["#"], None)),
];

/// Syntax for `path`, chosen by file name first, then by extension.
pub fn detect_syntax(path: &Path) -> Option<Syntax> {
    let file_name = path.file_name().and_then(|n| n.to_str())?;
    if let Some((_, syntax)) = FILE_NAMES.iter().find(|(name, _)| *name == file_name) {
        return Some(*syntax);
    }

    let ext = path.extension().and_then(|e| e.to_str())?.to_ascii_lowercase();
    LANGUAGES
        .iter()
        .find(|(exts, _)| exts.contains(&ext.as_str()))
        .map(|(_, syntax)| *syntax)
}

pub fn classify_text(syntax: &Syntax, text: &str) -> LineCounts {
    let mut counts = LineCounts::default();
    let mut in_block: Option<&str> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            counts.empty += 1;
            continue;
        }
        if syntax.prose {
            counts.documentation += 1;
            continue;
        }

        if let Some(end) = in_block {
            if let Some(pos) = trimmed.find(end) {
                in_block = None;
                if trimmed[pos + end.len()..].trim().is_empty() {
                    counts.documentation += 1;
                } else {
                    counts.code += 1;
                }
            } else {
                counts.documentation += 1;
            }
            continue;
        }

        // block openers first: Lua's `--[[` also starts with its line comment
        if let Some((start, end)) = syntax.block_comment {
            if let Some(after) = trimmed.strip_prefix(start) {
                match after.find(end) {
                    Some(pos) if after[pos + end.len()..].trim().is_empty() => {
                        counts.documentation += 1;
                    }
                    Some(_) => counts.code += 1,
                    None => {
                        in_block = Some(end);
                        counts.documentation += 1;
                    }
                }
                continue;
            }
        }

        if syntax.line_comments.iter().any(|p| trimmed.starts_with(p)) {
            counts.documentation += 1;
        } else {
            counts.code += 1;
        }
    }

    counts
}

/// Classifies files by name and extension, detecting binaries by a NUL
/// byte in the first 8 KiB.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionClassifier;

impl LineClassifier for ExtensionClassifier {
    fn classify(&self, path: &Path) -> Result<FileLines> {
        let data = std::fs::read(path)?;

        if data.is_empty() {
            return Ok(FileLines {
                language: EMPTY_LANGUAGE.to_string(),
                counts: LineCounts::default(),
            });
        }
        if data.iter().take(8192).any(|&b| b == 0) {
            return Ok(FileLines {
                language: BINARY_LANGUAGE.to_string(),
                counts: LineCounts::default(),
            });
        }

        let text = String::from_utf8_lossy(&data);
        match detect_syntax(path) {
            Some(syntax) => Ok(FileLines {
                language: syntax.name.to_string(),
                counts: classify_text(&syntax, &text),
            }),
            None => Ok(FileLines {
                language: UNKNOWN_LANGUAGE.to_string(),
                counts: classify_text(&prose(UNKNOWN_LANGUAGE), &text),
            }),
        }
    }
}
