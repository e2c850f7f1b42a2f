//! External tool invocations.
//!
//! Every subprocess is described by a [`ToolInvocation`] value carrying its
//! program, arguments and working directory. Nothing here changes the
//! working directory of the current process.

use std::ffi::OsString;
use std::io;
use std::path::{self, Path, PathBuf};
use std::process::{Command, Stdio};

use bids_model::ArchiveLayout;
use tracing::debug;

use crate::error::ToolError;

/// Program names or paths of the three external converters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub dcm2bids: PathBuf,
    pub pydeface: PathBuf,
    pub physio: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            dcm2bids: PathBuf::from("dcm2bids"),
            pydeface: PathBuf::from("pydeface"),
            physio: PathBuf::from("physio2bidsphysio"),
        }
    }
}

/// A fully described subprocess call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Working directory for the child only.
    pub current_dir: Option<PathBuf>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Program file name, for messages.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map_or_else(
                || self.program.to_string_lossy(),
                |name| name.to_string_lossy(),
            )
            .into_owned()
    }

    /// Space-joined command line, for logging.
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.to_string_lossy().into_owned()];
        parts.extend(self.args.iter().map(|arg| arg.to_string_lossy().into_owned()));
        parts.join(" ")
    }

    /// Args as UTF-8 (lossy), mostly for assertions.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }
}

/// `dcm2bids -d <subject_dir> -p <anon> -s <session> -c <config> -o <archive> --auto_extract_entities`
pub fn dcm2bids_invocation(
    tools: &ToolPaths,
    subject_dir: &Path,
    anonymized_id: &str,
    layout: &ArchiveLayout,
    config: &Path,
) -> ToolInvocation {
    ToolInvocation::new(&tools.dcm2bids)
        .arg("-d")
        .arg(subject_dir)
        .arg("-p")
        .arg(anonymized_id)
        .arg("-s")
        .arg(&layout.session)
        .arg("-c")
        .arg(config)
        .arg("-o")
        .arg(layout.root())
        .arg("--auto_extract_entities")
}

/// `pydeface <volume>`
pub fn pydeface_invocation(tools: &ToolPaths, volume: &Path) -> ToolInvocation {
    ToolInvocation::new(&tools.pydeface).arg(volume)
}

/// `physio2bidsphysio -i <source> -b sub-<anon>`, run inside `target_dir`.
///
/// The child starts in `target_dir`, so relative paths are resolved against
/// the current directory first. A bare program name is left for `PATH` lookup.
///
/// # Errors
///
/// Returns an error if the current directory cannot be read.
pub fn physio_invocation(
    tools: &ToolPaths,
    source: &Path,
    anonymized_id: &str,
    target_dir: &Path,
) -> io::Result<ToolInvocation> {
    Ok(ToolInvocation::new(resolve_program(&tools.physio)?)
        .arg("-i")
        .arg(path::absolute(source)?)
        .arg("-b")
        .arg(ArchiveLayout::subject_label(anonymized_id))
        .current_dir(path::absolute(target_dir)?))
}

fn resolve_program(program: &Path) -> io::Result<PathBuf> {
    if program.is_absolute() || program.components().count() < 2 {
        Ok(program.to_path_buf())
    } else {
        path::absolute(program)
    }
}

/// Executes tool invocations.
///
/// The batch passes only ever talk to tools through this trait.
pub trait ToolRunner {
    /// Run `invocation` to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be started or exits unsuccessfully.
    fn run(&mut self, invocation: &ToolInvocation) -> Result<(), ToolError>;
}

/// Runs tools as child processes, blocking until each exits.
///
/// The child inherits stdout/stderr so converter progress stays visible.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&mut self, invocation: &ToolInvocation) -> Result<(), ToolError> {
        debug!(
            command = %invocation.command_line(),
            cwd = ?invocation.current_dir,
            "spawning tool"
        );
        let status = invocation
            .to_command()
            .stdin(Stdio::null())
            .status()
            .map_err(|source| ToolError::Spawn {
                program: invocation.program_name(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(ToolError::Exit {
                program: invocation.program_name(),
                status: status.to_string(),
            })
        }
    }
}
