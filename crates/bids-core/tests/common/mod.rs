//! Shared fixtures: a recording tool runner and filesystem helpers.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use bids_core::{ToolError, ToolInvocation, ToolRunner};

/// Records every invocation instead of spawning processes.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    pub invocations: Vec<ToolInvocation>,
    fail_programs: Vec<String>,
    fail_args: Vec<String>,
    write_anat: bool,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call of `program` exits unsuccessfully.
    pub fn failing_program(mut self, program: &str) -> Self {
        self.fail_programs.push(program.to_string());
        self
    }

    /// Calls with an argument containing `fragment` exit unsuccessfully.
    pub fn failing_on_arg(mut self, fragment: &str) -> Self {
        self.fail_args.push(fragment.to_string());
        self
    }

    /// Successful `dcm2bids` calls write a T1w volume into `anat/`.
    pub fn writing_anat_outputs(mut self) -> Self {
        self.write_anat = true;
        self
    }

    pub fn calls_to(&self, program: &str) -> Vec<&ToolInvocation> {
        self.invocations
            .iter()
            .filter(|invocation| invocation.program_name() == program)
            .collect()
    }

    fn should_fail(&self, invocation: &ToolInvocation) -> bool {
        let program = invocation.program_name();
        self.fail_programs.contains(&program)
            || invocation.args_lossy().iter().any(|arg| {
                self.fail_args
                    .iter()
                    .any(|fragment| arg.contains(fragment.as_str()))
            })
    }
}

impl ToolRunner for RecordingRunner {
    fn run(&mut self, invocation: &ToolInvocation) -> Result<(), ToolError> {
        self.invocations.push(invocation.clone());
        if self.should_fail(invocation) {
            return Err(ToolError::Exit {
                program: invocation.program_name(),
                status: "exit status: 1".to_string(),
            });
        }
        if self.write_anat && invocation.program_name() == "dcm2bids" {
            write_fake_anat(invocation);
        }
        Ok(())
    }
}

/// Value following `flag` in the invocation's arguments.
pub fn arg_after(invocation: &ToolInvocation, flag: &str) -> Option<String> {
    let args = invocation.args_lossy();
    let index = args.iter().position(|arg| arg == flag)?;
    args.get(index + 1).cloned()
}

fn write_fake_anat(invocation: &ToolInvocation) {
    let (Some(anon), Some(session), Some(root)) = (
        arg_after(invocation, "-p"),
        arg_after(invocation, "-s"),
        arg_after(invocation, "-o"),
    ) else {
        return;
    };
    let anat = PathBuf::from(root)
        .join(format!("sub-{anon}"))
        .join(format!("ses-{session}"))
        .join("anat");
    fs::create_dir_all(&anat).expect("create anat dir");
    fs::write(
        anat.join(format!("sub-{anon}_ses-{session}_T1w.nii.gz")),
        b"nifti",
    )
    .expect("write volume");
}

pub fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(&path, b"data").expect("write file");
    path
}

pub fn write_mapping(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("mapping.csv");
    fs::write(&path, contents).expect("write mapping");
    path
}
