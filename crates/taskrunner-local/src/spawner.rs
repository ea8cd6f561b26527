use std::io;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// Starts OS processes. Kept behind a trait so the runner can be driven by
/// a fake in tests.
#[async_trait::async_trait]
pub trait ProcessSpawner: Send + Sync {
    /// Start `argv[0]` with the remaining arguments, stdout and stderr merged.
    async fn spawn(&self, argv: &[String]) -> io::Result<Box<dyn RunningProcess>>;
}

/// Handle to one started process.
#[async_trait::async_trait]
pub trait RunningProcess: Send {
    /// Wait for exit. A process ended by a signal reports -1.
    async fn wait(&mut self) -> io::Result<i32>;

    /// Kill the process and stop collecting its output.
    async fn force_kill(&mut self) -> io::Result<()>;

    /// Everything the process wrote, stdout and stderr interleaved in the
    /// order it arrived. After `force_kill` this is whatever was read before
    /// the kill.
    async fn read_all_output(&mut self) -> io::Result<String>;
}

/// Spawns real processes through `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawner;

#[async_trait::async_trait]
impl ProcessSpawner for TokioSpawner {
    async fn spawn(&self, argv: &[String]) -> io::Result<Box<dyn RunningProcess>> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty argv"))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let buffer = Arc::new(Mutex::new(Vec::new()));
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(pump(stdout, Arc::clone(&buffer))));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(pump(stderr, Arc::clone(&buffer))));
        }

        Ok(Box::new(TokioProcess {
            child,
            buffer,
            readers,
        }))
    }
}

/// Copy a pipe into the shared buffer chunk by chunk. Both pipes write to
/// the same buffer, which gives the merged stream.
async fn pump<R: AsyncRead + Unpin>(mut pipe: R, buffer: Arc<Mutex<Vec<u8>>>) -> io::Result<()> {
    let mut chunk = [0u8; 4096];
    loop {
        let n = pipe.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend_from_slice(&chunk[..n]);
    }
}

struct TokioProcess {
    child: Child,
    buffer: Arc<Mutex<Vec<u8>>>,
    readers: Vec<JoinHandle<io::Result<()>>>,
}

impl TokioProcess {
    fn snapshot(&self) -> String {
        let bytes = self
            .buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

#[async_trait::async_trait]
impl RunningProcess for TokioProcess {
    async fn wait(&mut self) -> io::Result<i32> {
        let status = self.child.wait().await?;
        Ok(status.code().unwrap_or(-1))
    }

    async fn force_kill(&mut self) -> io::Result<()> {
        // A grandchild may still hold the pipes open, so the readers are
        // stopped rather than drained.
        for reader in &self.readers {
            reader.abort();
        }
        self.readers.clear();
        // The shell may already have been reaped while its pipes stayed open.
        match self.child.try_wait()? {
            Some(_) => Ok(()),
            None => self.child.kill().await,
        }
    }

    async fn read_all_output(&mut self) -> io::Result<String> {
        for reader in self.readers.drain(..) {
            match reader.await {
                Ok(result) => result?,
                Err(e) if e.is_cancelled() => {}
                Err(e) => return Err(io::Error::new(io::ErrorKind::Other, e)),
            }
        }
        Ok(self.snapshot())
    }
}
