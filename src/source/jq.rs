use crate::error::{Error, Result};
use crate::source::{LeafStream, PairLines, StreamSource};
use crate::types::LeafPair;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;
use tracing::{debug, warn};

/// Keeps only `[path, leaf]` events, dropping the closing `[path]` markers
const STREAM_FILTER: &str = "select(length==2)";

/// Walks a document by running `jq --stream` on it
#[derive(Debug, Clone)]
pub struct JqSource {
    program: String,
    input: PathBuf,
    unbuffered: bool,
}

impl JqSource {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        JqSource {
            program: String::from("jq"),
            input: input.into(),
            unbuffered: true,
        }
    }

    /// Use a different jq executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Ask jq to flush after every record
    pub fn with_unbuffered(mut self, unbuffered: bool) -> Self {
        self.unbuffered = unbuffered;
        self
    }

    /// The command line a pass runs
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-c").arg("--stream");
        if self.unbuffered {
            cmd.arg("--unbuffered");
        }
        cmd.arg(STREAM_FILTER)
            .arg(&self.input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl StreamSource for JqSource {
    fn describe(&self) -> String {
        format!("{} --stream {}", self.program, self.input.display())
    }

    fn open(&self) -> Result<LeafStream> {
        let mut child = self.command().spawn().map_err(|source| Error::SourceSpawn {
            program: self.program.clone(),
            source,
        })?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::SourceSpawn {
                program: self.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "stdout was not captured"),
            });
        };

        // Drained on its own thread so a chatty stderr cannot block stdout
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        debug!(command = %self.describe(), pid = child.id(), "started stream source");

        Ok(Box::new(JqStream {
            program: self.program.clone(),
            child: Some(child),
            lines: PairLines::new(BufReader::new(stdout)),
            stderr,
        }))
    }
}

struct JqStream {
    program: String,
    child: Option<Child>,
    lines: PairLines<BufReader<ChildStdout>>,
    stderr: Option<JoinHandle<String>>,
}

impl JqStream {
    fn collect_stderr(&mut self) -> String {
        self.stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .map(|text| text.trim().to_string())
            .unwrap_or_default()
    }

    /// Reap the child once stdout is exhausted
    fn finish(&mut self) -> Option<Result<LeafPair>> {
        let mut child = self.child.take()?;
        let status = match child.wait() {
            Ok(status) => status,
            Err(e) => return Some(Err(e.into())),
        };
        let stderr = self.collect_stderr();

        if !status.success() {
            return Some(Err(Error::SourceExit {
                program: self.program.clone(),
                status,
                stderr,
            }));
        }
        if !stderr.is_empty() {
            warn!(program = %self.program, %stderr, "stream source wrote to stderr");
        }
        debug!(lines = self.lines.line_no(), "stream source finished");
        None
    }
}

impl Iterator for JqStream {
    type Item = Result<LeafPair>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.child.is_none() {
            return None;
        }
        match self.lines.next() {
            Some(item) => Some(item),
            None => self.finish(),
        }
    }
}

impl Drop for JqStream {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
