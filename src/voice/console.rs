//! Terminal speech adapter: stdin lines in, stdout lines out

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use super::{Prompt, Speech};
use crate::{Error, Result};

/// Reads utterances from stdin and prints speech to stdout
pub struct ConsoleSpeech {
    lines: Mutex<Lines<BufReader<Stdin>>>,
    window: Duration,
}

impl ConsoleSpeech {
    /// Create an adapter that waits at most `window` per listen
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
            window,
        }
    }
}

#[async_trait]
impl Speech for ConsoleSpeech {
    async fn listen(&self) -> Result<String> {
        let mut lines = self.lines.lock().await;
        // next_line is cancel safe, a timed out read loses nothing
        match tokio::time::timeout(self.window, lines.next_line()).await {
            Err(_) => Ok(String::new()),
            Ok(Ok(Some(line))) => Ok(line.trim().to_string()),
            Ok(Ok(None)) => Err(Error::InputClosed),
            Ok(Err(e)) => Err(e.into()),
        }
    }

    async fn speak(&self, text: &str, prompt: Option<Prompt>) -> Result<()> {
        let mut out = String::new();
        if let Some(prompt) = prompt {
            out.push_str(&format!("[{} cue]\n", prompt.as_str()));
        }
        if !text.is_empty() {
            out.push_str(text);
            out.push('\n');
        }

        let mut stdout = tokio::io::stdout();
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
        Ok(())
    }
}
