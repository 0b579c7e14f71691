use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tracing::debug;

use super::CropBackend;
use crate::{CropError, CropRect};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Shells out to ImageMagick: `<program> <args..> <source> -crop WxH+X+Y <output>`.
#[derive(Clone, Debug)]
pub struct MagickBackend {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub timeout: Option<Duration>,
}

impl Default for MagickBackend {
    fn default() -> Self {
        Self {
            program: PathBuf::from("magick"),
            args: vec!["convert".to_string()],
            timeout: None,
        }
    }
}

impl MagickBackend {
    pub fn command_args(&self, source: &Path, rect: CropRect, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        args.push(source.into());
        args.push("-crop".into());
        args.push(rect.to_string().into());
        args.push(output.into());
        args
    }

    pub fn command(&self, source: &Path, rect: CropRect, output: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(self.command_args(source, rect, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        command
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, CropError> {
        let timeout = match self.timeout {
            Some(timeout) => timeout,
            None => return Ok(child.wait()?),
        };

        let deadline = Instant::now() + timeout;

        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }

            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();

                return Err(CropError::TimedOut {
                    program: self.program.clone(),
                    after: timeout,
                });
            }

            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl CropBackend for MagickBackend {
    fn name(&self) -> &str {
        "magick"
    }

    fn crop(&self, source: &Path, rect: CropRect, output: &Path) -> Result<(), CropError> {
        let mut command = self.command(source, rect, output);
        debug!("running {:?}", command);

        let mut child = command.spawn().map_err(|source| CropError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let stderr_reader = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut text = String::new();
                let _ = stderr.read_to_string(&mut text);
                text
            })
        });

        let status = self.wait(&mut child)?;

        let stderr = stderr_reader
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();

        if status.success() {
            if !output.is_file() {
                return Err(CropError::NoOutput {
                    program: self.program.clone(),
                    output: output.to_path_buf(),
                });
            }

            Ok(())
        } else {
            Err(CropError::ToolFailed {
                program: self.program.clone(),
                status,
                stderr: stderr.trim().to_string(),
            })
        }
    }
}
