use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use viewer::display::fragment_to_html;
use viewer::{RenderError, Session};

const TEST_SUFFIX: &str = ".test.json";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Node paths to click, in order, after the initial render.
    #[serde(default)]
    pub clicks: Vec<Vec<usize>>,

    /// Node path to hover after the clicks.
    #[serde(default)]
    pub hover: Option<Vec<usize>>,

    /// Substrings the final trace HTML must contain.
    #[serde(default)]
    pub expect_contains: Vec<String>,

    /// Substrings the final trace HTML must not contain.
    #[serde(default)]
    pub expect_absent: Vec<String>,

    /// Exact code slot text after the hover (trimmed comparison).
    #[serde(default)]
    pub expect_code: Option<String>,

    /// Expected render error: its Display string must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// If true, the test expects loading the trace to fail.
    #[serde(default)]
    pub expect_parse_error: bool,
}

/// A `.test.json` file is a TOML header fenced by `---` lines, then the trace.
fn split_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');
    let opening = lines.next().unwrap_or_default();
    if !is_fence(opening) {
        return Err("test file must start with a `---` line".into());
    }

    let header_start = opening.len();
    let mut offset = header_start;
    for line in lines {
        if is_fence(line) {
            let header = &content[header_start..offset];
            let config =
                toml::from_str(header).map_err(|e| format!("invalid test header: {}", e))?;
            return Ok((config, &content[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err("test header is not closed by a `---` line".into())
}

fn is_fence(line: &str) -> bool {
    line.trim_end() == "---"
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("cannot read file: {}", e)),
            };
        }
    };

    let (config, source) = match split_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("bad test file: {}", e)),
            };
        }
    };

    let outcome = match check(&config, source) {
        Ok(()) => TestOutcome::Pass,
        Err(reason) => TestOutcome::Fail(reason),
    };
    TestResult {
        path: path.to_path_buf(),
        description: config.description,
        outcome,
    }
}

/// Load, render and interact with one trace. `Err` carries the failure reason.
fn check(config: &TestConfig, source: &str) -> Result<(), String> {
    let loaded = pdl::parse_trace(source, 0);
    if config.expect_parse_error {
        return match loaded {
            Err(_) => Ok(()),
            Ok(_) => Err("expected parse error, but loading succeeded".into()),
        };
    }
    let trace = loaded.map_err(|e| format!("unexpected parse error: {}", e))?;

    let interaction = Session::new(&trace, "code").and_then(|mut session| {
        for path in &config.clicks {
            session.activate(path)?;
        }
        if let Some(path) = &config.hover {
            session.hover(path)?;
        }
        Ok(session)
    });

    let session = match (&config.expect_error, interaction) {
        (Some(expected), Err(err)) => return expect_error_message(expected, &err),
        (Some(expected), Ok(_)) => {
            return Err(format!(
                "expected error containing \"{}\", but rendering succeeded",
                expected
            ));
        }
        (None, Err(err)) => return Err(format!("unexpected render error: {}", err)),
        (None, Ok(session)) => session,
    };

    let html = fragment_to_html(session.root());
    for needle in &config.expect_contains {
        if !html.contains(needle.as_str()) {
            return Err(format!("expected HTML containing \"{}\"\n  actual: {}", needle, html));
        }
    }
    for needle in &config.expect_absent {
        if html.contains(needle.as_str()) {
            return Err(format!("expected HTML without \"{}\"\n  actual: {}", needle, html));
        }
    }

    if let Some(expected) = &config.expect_code {
        let actual = session.code().text.as_deref().unwrap_or_default();
        if actual.trim() != expected.trim() {
            return Err(format!(
                "code mismatch\n  expected: {}\n  actual:   {}",
                expected.trim(),
                actual.trim()
            ));
        }
    }

    Ok(())
}

fn expect_error_message(expected: &str, err: &RenderError) -> Result<(), String> {
    let message = err.to_string();
    if message.contains(expected) {
        Ok(())
    } else {
        Err(format!(
            "expected error containing \"{}\", got: {}",
            expected, message
        ))
    }
}

/// `.test.json` files under `root`, keyed by their directory relative to
/// `root` (`""` for `root` itself). Files within a category are sorted.
fn find_tests(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut found: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        let category = category_of(&dir, root);
        for path in entries.flatten().map(|entry| entry.path()) {
            if path.is_dir() {
                pending.push(path);
            } else if is_test_file(&path) {
                found.entry(category.clone()).or_default().push(path);
            }
        }
    }
    found.values_mut().for_each(|files| files.sort());
    found
}

fn category_of(dir: &Path, root: &Path) -> String {
    dir.strip_prefix(root)
        .map(|relative| {
            relative
                .components()
                .map(|part| part.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}

fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(TEST_SUFFIX))
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// Print the categories found under `path` with their test counts.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("{} is a single test; categories are directories", path.display());
        return;
    }
    let found = find_tests(path);
    if found.is_empty() {
        eprintln!("no {} files under {}", TEST_SUFFIX, path.display());
        return;
    }
    eprintln!("categories under {}:", path.display());
    for (category, files) in &found {
        eprintln!("  {:<24} {} test(s)", category_label(category), files.len());
    }
}

fn paint(text: &str, code: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    }
}

fn label_for(result: &TestResult) -> String {
    result.description.clone().unwrap_or_else(|| {
        let name = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("?");
        name.trim_end_matches(TEST_SUFFIX).to_string()
    })
}

fn print_failure(result: &TestResult) {
    if let TestOutcome::Fail(reason) = &result.outcome {
        eprintln!();
        eprintln!("  --- {} ---", result.path.display());
        for line in reason.lines() {
            eprintln!("  {}", line);
        }
    }
}

/// Run every test file under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let selected: BTreeMap<String, Vec<PathBuf>> = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        let all_categories = find_tests(path);
        if all_categories.is_empty() {
            eprintln!("no {} files under {}", TEST_SUFFIX, path.display());
            return 1;
        }
        select_categories(all_categories, categories)
    };

    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &selected {
        if !path.is_file() {
            eprintln!();
            eprintln!("{}", paint(category_label(cat), "1", no_color));
        }

        for file in files {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", paint("PASS", "32", no_color), label_for(&result));
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", paint("FAIL", "31", no_color), label_for(&result));
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        failures.iter().for_each(print_failure);
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", paint("ok", "32", no_color), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failures.len(),
            passed + failures.len()
        );
        1
    }
}

fn select_categories(
    all_categories: BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<String, Vec<PathBuf>> {
    if requested.is_empty() {
        return all_categories;
    }
    let mut filtered = BTreeMap::new();
    for requested in requested {
        let req = requested.trim_matches('/');
        let matching: Vec<&String> = all_categories
            .keys()
            .filter(|cat| cat.as_str() == req || cat.starts_with(&format!("{}/", req)))
            .collect();
        if matching.is_empty() {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all_categories
                    .keys()
                    .map(|k| category_label(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        for cat in matching {
            filtered.insert(cat.clone(), all_categories[cat].clone());
        }
    }
    filtered
}
