//! Fake process runner for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::config::ToolPrograms;
use crate::core::STAGING_SUFFIX;
use crate::errors::ToolError;
use crate::process::{Invocation, ProcessRunner};
use crate::store::InMemoryArtifactStore;

/// Size given to every file the fake tools write.
pub const SIMULATED_SIZE: u64 = 1024;

/// One call seen by a [`RecordingRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// The stage that issued the call.
    pub stage: String,
    /// The invocation.
    pub invocation: Invocation,
}

/// A process runner that records invocations and fakes their file effects.
///
/// Instead of spawning anything it writes the files the real tools would
/// write into an [`InMemoryArtifactStore`]: any argument ending in the
/// staging suffix, the downloader's `-O` target, the decompressed reference
/// and the reference indexes.
#[derive(Debug)]
pub struct RecordingRunner {
    store: InMemoryArtifactStore,
    tools: ToolPrograms,
    calls: Mutex<Vec<RecordedCall>>,
    failing: Mutex<HashSet<String>>,
    silent: Mutex<HashSet<String>>,
}

impl RecordingRunner {
    /// Creates a runner writing into `store`, for the default tool set.
    #[must_use]
    pub fn new(store: InMemoryArtifactStore) -> Self {
        Self {
            store,
            tools: ToolPrograms::default(),
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            silent: Mutex::new(HashSet::new()),
        }
    }

    /// Makes every invocation of `program` exit with status 1.
    pub fn fail_program(&self, program: impl Into<String>) {
        self.failing.lock().insert(program.into());
    }

    /// Makes `program` exit 0 without writing anything.
    pub fn silence_program(&self, program: impl Into<String>) {
        self.silent.lock().insert(program.into());
    }

    /// Returns all recorded calls in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Returns the stages that issued calls, in order.
    #[must_use]
    pub fn stages(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.stage.clone()).collect()
    }

    /// Returns the number of recorded calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the number of calls whose chain runs `program`.
    #[must_use]
    pub fn calls_to(&self, program: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.invocation.runs(program))
            .count()
    }

    /// Forgets recorded calls.
    pub fn reset(&self) {
        self.calls.lock().clear();
    }

    fn simulate(&self, invocation: &Invocation) {
        for step in invocation.chain() {
            let args = step.arguments();
            for arg in args.iter().filter(|a| a.ends_with(STAGING_SUFFIX)) {
                self.store.put(arg.as_str(), SIMULATED_SIZE);
            }

            let program = step.program();
            if program == self.tools.downloader {
                if let Some(target) = args.iter().skip_while(|a| *a != "-O").nth(1) {
                    self.store.put(target.as_str(), SIMULATED_SIZE);
                }
            } else if program == self.tools.decompressor {
                if let Some(archive) = args.last() {
                    if let Some(plain) = archive.strip_suffix(".gz") {
                        self.store.remove(archive.as_str());
                        self.store.put(plain, SIMULATED_SIZE);
                    }
                }
            } else if args.first().map(String::as_str) == Some("index") && program == self.tools.aligner {
                if let Some(fasta) = args.last() {
                    for suffix in [".bwt", ".sa"] {
                        self.store.put(PathBuf::from(format!("{fasta}{suffix}")), SIMULATED_SIZE);
                    }
                }
            } else if args.first().map(String::as_str) == Some("faidx") && program == self.tools.converter {
                if let Some(fasta) = args.last() {
                    self.store.put(PathBuf::from(format!("{fasta}.fai")), SIMULATED_SIZE);
                }
            }
        }
    }
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn run(&self, stage: &str, invocation: &Invocation) -> Result<(), ToolError> {
        self.calls.lock().push(RecordedCall {
            stage: stage.to_string(),
            invocation: invocation.clone(),
        });

        let failing = self.failing.lock().clone();
        if let Some(step) = invocation.chain().find(|s| failing.contains(s.program())) {
            return Err(ToolError::non_zero_exit(stage, step.own_command_line(), "exit code 1"));
        }

        let silent = self.silent.lock().clone();
        if !invocation.chain().any(|s| silent.contains(s.program())) {
            self.simulate(invocation);
        }
        Ok(())
    }
}
