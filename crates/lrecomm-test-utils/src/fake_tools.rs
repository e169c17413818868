// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fake external program runner.
//!
//! Every invocation is recorded. Non-probe programs "produce" their output
//! by writing fixed bytes to their last argument, which is the output path in
//! every codec invocation. Programs whose name contains `ffprobe` return the
//! configured stdout instead.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use lrecomm_core::{LrecommError, ToolOutput, ToolRunner};

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug)]
struct State {
    calls: Vec<ToolCall>,
    failing_programs: HashSet<String>,
    failing_inputs: Vec<String>,
    output_bytes: Vec<u8>,
    probe_output: String,
}

/// Recording [`ToolRunner`] double.
#[derive(Debug, Clone)]
pub struct FakeToolRunner {
    state: Arc<Mutex<State>>,
}

impl FakeToolRunner {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                calls: Vec::new(),
                failing_programs: HashSet::new(),
                failing_inputs: Vec::new(),
                output_bytes: b"fake-encoded-audio".to_vec(),
                probe_output: "5.0\n".to_string(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every call of `program` exit non-zero.
    pub fn failing_program(self, program: &str) -> Self {
        self.state().failing_programs.insert(program.to_string());
        self
    }

    /// Make any call whose arguments mention `fragment` exit non-zero.
    pub fn failing_input(self, fragment: &str) -> Self {
        self.state().failing_inputs.push(fragment.to_string());
        self
    }

    /// Bytes written to each output file.
    pub fn with_output_bytes(self, bytes: Vec<u8>) -> Self {
        self.state().output_bytes = bytes;
        self
    }

    /// Stdout returned by the duration prober.
    pub fn with_probe_output(self, stdout: &str) -> Self {
        self.state().probe_output = stdout.to_string();
        self
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.state().calls.clone()
    }

    pub fn calls_to(&self, program: &str) -> usize {
        self.state().calls.iter().filter(|c| c.program == program).count()
    }
}

impl Default for FakeToolRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolRunner for FakeToolRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, LrecommError> {
        let (fails, output_bytes, probe_output) = {
            let mut state = self.state();
            state.calls.push(ToolCall {
                program: program.to_string(),
                args: args.to_vec(),
            });
            let fails = state.failing_programs.contains(program)
                || state
                    .failing_inputs
                    .iter()
                    .any(|f| args.iter().any(|a| a.contains(f.as_str())));
            (fails, state.output_bytes.clone(), state.probe_output.clone())
        };

        if fails {
            return Err(LrecommError::Tool {
                program: program.to_string(),
                status: "exit code 1".to_string(),
                stderr: "simulated failure".to_string(),
            });
        }

        if program.contains("ffprobe") {
            return Ok(ToolOutput {
                stdout: probe_output.into_bytes(),
                stderr: Vec::new(),
            });
        }

        if let Some(output) = args.last() {
            tokio::fs::write(output, &output_bytes)
                .await
                .map_err(|e| LrecommError::io("write fake output", output, e))?;
        }
        Ok(ToolOutput::default())
    }
}
