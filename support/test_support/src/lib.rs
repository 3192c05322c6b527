use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaseClass {
    TranslateSuccess,
    SyntaxError,
    Degraded,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ExpectedOutcome {
    pub output_file: Option<String>,
    pub error_contains_file: Option<String>,
    #[serde(default)]
    pub degradations: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CaseSpec {
    pub class: CaseClass,
    /// Run the program under python3 and the translation under node and
    /// compare stdout.
    #[serde(default)]
    pub parity: bool,
    #[serde(default)]
    pub options_file: Option<String>,
    #[serde(default)]
    pub expected: ExpectedOutcome,
}

#[derive(Debug, Clone)]
pub struct Case {
    pub name: String,
    pub dir: PathBuf,
    pub program_path: PathBuf,
    pub spec: CaseSpec,
}

impl Case {
    /// Reads `dir/case.yaml`. Returns `None` for directories without one.
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let manifest = dir.join("case.yaml");
        if !manifest.is_file() {
            return Ok(None);
        }
        let program_path = dir.join("program.py");
        ensure!(program_path.is_file(), "{} has no program.py", dir.display());

        let name = dir
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("Non UTF-8 case directory {}", dir.display()))?
            .to_string();
        let raw = fs::read_to_string(&manifest)
            .with_context(|| format!("Reading {}", manifest.display()))?;
        let spec = serde_yaml::from_str(&raw)
            .with_context(|| format!("Parsing {}", manifest.display()))?;
        Ok(Some(Self {
            name,
            dir: dir.to_path_buf(),
            program_path,
            spec,
        }))
    }

    pub fn read_text(&self, relative_path: &str) -> Result<String> {
        let path = self.dir.join(relative_path);
        fs::read_to_string(&path)
            .with_context(|| format!("Case {}: reading {}", self.name, path.display()))
    }

    pub fn program(&self) -> Result<String> {
        fs::read_to_string(&self.program_path)
            .with_context(|| format!("Case {}: reading program.py", self.name))
    }

    pub fn options_text(&self) -> Result<Option<String>> {
        self.spec
            .options_file
            .as_deref()
            .map(|file| self.read_text(file))
            .transpose()
    }
}

/// Every case directory under `root`, sorted by name.
pub fn load_cases(root: &Path) -> Result<Vec<Case>> {
    let mut dirs = fs::read_dir(root)
        .with_context(|| format!("Listing {}", root.display()))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<Vec<PathBuf>>>()?;
    dirs.retain(|path| path.is_dir());
    dirs.sort();

    let mut cases = Vec::with_capacity(dirs.len());
    for dir in dirs {
        if let Some(case) = Case::load(&dir)? {
            cases.push(case);
        }
    }
    ensure!(!cases.is_empty(), "{} holds no cases", root.display());
    Ok(cases)
}

pub fn normalize_output(output: &str) -> String {
    output.replace("\r\n", "\n").trim_end().to_string()
}

fn runs(program: &str, version_flag: &str) -> bool {
    Command::new(program)
        .arg(version_flag)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

/// First runnable interpreter among `$env_var` and `candidates`.
pub fn detect_program(env_var: &str, candidates: &[&str]) -> Option<String> {
    if let Ok(program) = std::env::var(env_var) {
        if runs(&program, "--version") {
            return Some(program);
        }
    }
    candidates
        .iter()
        .find(|candidate| runs(candidate, "--version"))
        .map(|candidate| (*candidate).to_string())
}

pub fn detect_python_interpreter() -> Option<String> {
    detect_program("PYTHON", &["python3", "python"])
}

pub fn detect_node() -> Option<String> {
    detect_program("NODE", &["node", "nodejs"])
}

pub fn run_python_file(interpreter: &str, path: &Path) -> Result<String> {
    let output = Command::new(interpreter)
        .arg(path)
        .output()
        .with_context(|| format!("Running python file {}", path.display()))?;
    ensure!(
        output.status.success(),
        "python failed for {}: {}",
        path.display(),
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Feeds `script` to node on stdin and returns its stdout.
pub fn run_node_script(node: &str, script: &str) -> Result<String> {
    let mut child = Command::new(node)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Starting {node}"))?;
    child
        .stdin
        .take()
        .context("node stdin unavailable")?
        .write_all(script.as_bytes())
        .context("Writing script to node")?;
    let output = child.wait_with_output().context("Waiting for node")?;
    ensure!(
        output.status.success(),
        "node failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

pub fn parity_required(env_var: &str) -> bool {
    std::env::var(env_var)
        .map(|value| value == "1")
        .unwrap_or(false)
}
