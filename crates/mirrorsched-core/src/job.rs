//! Job descriptors: one fully materialized tool invocation per folder pair.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::catalog::FolderPair;
use crate::config::ToolConfig;
use crate::throttle::ThrottleSettings;

/// Job identifier; sequence number assigned when the job list is built.
pub type JobId = u64;

/// Program and arguments of one external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Immutable unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobDescriptor {
    pub id: JobId,
    pub name: String,
    pub source: String,
    pub target: String,
    /// Declared in the catalog; selects the non-recursive parameter profile.
    pub is_root: bool,
    pub command: ToolCommand,
    /// Where the tool writes its own log for this job.
    pub log_path: PathBuf,
}

/// Builds descriptors with sequential ids and the shared throttle flag.
pub struct JobBuilder<'a> {
    tool: &'a ToolConfig,
    throttle: Option<ThrottleSettings>,
    log_dir: &'a Path,
    next_id: JobId,
}

impl<'a> JobBuilder<'a> {
    pub fn new(tool: &'a ToolConfig, throttle: Option<ThrottleSettings>, log_dir: &'a Path) -> Self {
        Self {
            tool,
            throttle,
            log_dir,
            next_id: 1,
        }
    }

    pub fn build(&mut self, pair: &FolderPair) -> JobDescriptor {
        let id = self.next_id;
        self.next_id += 1;

        let log_path = self.log_dir.join(log_file_name(id, &pair.name));
        let profile = if pair.is_root {
            &self.tool.root_args
        } else {
            &self.tool.subfolder_args
        };

        let mut args = Vec::with_capacity(profile.len() + 4);
        args.push(pair.source.clone());
        args.push(pair.target.clone());
        args.extend(profile.iter().cloned());
        if let Some(throttle) = self.throttle {
            args.push(format!("{}{}", self.tool.throttle_flag, throttle.delay_ms));
        }
        args.push(format!("{}{}", self.tool.log_flag, log_path.display()));

        JobDescriptor {
            id,
            name: pair.name.clone(),
            source: pair.source.clone(),
            target: pair.target.clone(),
            is_root: pair.is_root,
            command: ToolCommand::new(self.tool.program.clone(), args),
            log_path,
        }
    }
}

/// Build one descriptor per pair, ids starting at 1 in input order.
pub fn build_jobs(
    pairs: &[FolderPair],
    tool: &ToolConfig,
    throttle: Option<ThrottleSettings>,
    log_dir: &Path,
) -> Vec<JobDescriptor> {
    let mut builder = JobBuilder::new(tool, throttle, log_dir);
    pairs.iter().map(|p| builder.build(p)).collect()
}

/// `0007_Projects_2024.log`: id prefix keeps names unique, the rest is sanitized.
fn log_file_name(id: JobId, name: &str) -> String {
    const NAME_MAX: usize = 120;

    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;
    for c in name.chars() {
        let c = if c.is_control() || c.is_whitespace() || "/\\:*?\"<>|".contains(c) {
            '_'
        } else {
            c
        };
        if c == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }
    let mut trimmed = out.trim_matches(|c| c == '.' || c == '_').to_string();
    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed.truncate(take);
    }
    if trimmed.is_empty() {
        format!("{:04}.log", id)
    } else {
        format!("{:04}_{}.log", id, trimmed)
    }
}
