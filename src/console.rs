//! Line-oriented chat transport over stdin/stdout
//!
//! Input lines are `<sender> <target> <text...>`; a target equal to the bot's
//! nick is a private message. Notices are written as `NOTICE <target> :<text>`.

use crate::commands::{CommandRouter, InboundMessage};
use crate::runtime::NoticeSink;
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Notice sink writing IRC-style NOTICE lines
pub struct ConsoleNotices<W> {
    out: Mutex<W>,
}

impl<W> ConsoleNotices<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    pub async fn written(&self) -> W
    where
        W: Clone,
    {
        self.out.lock().await.clone()
    }
}

/// One notice line; embedded newlines would split it on the wire
pub fn format_notice(target: &str, text: &str) -> String {
    let text = text.replace(['\r', '\n'], " ");
    format!("NOTICE {target} :{text}\n")
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> NoticeSink for ConsoleNotices<W> {
    async fn notify(&self, target: &str, text: &str) -> Result<(), String> {
        let line = format_notice(target, text);
        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes())
            .await
            .map_err(|e| e.to_string())?;
        out.flush().await.map_err(|e| e.to_string())
    }
}

/// Parse `<sender> <target> <text...>`; lines without text are ignored
pub fn parse_line(line: &str) -> Option<InboundMessage> {
    let line = line.trim();
    let (sender, rest) = line.split_once(char::is_whitespace)?;
    let (target, text) = rest.trim_start().split_once(char::is_whitespace)?;
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(InboundMessage {
        sender: sender.to_string(),
        target: target.to_string(),
        text: text.to_string(),
    })
}

/// Next input line, or None at EOF. Bytes that are not UTF-8 are replaced
/// rather than failing the stream.
async fn next_line<R: AsyncBufRead + Unpin>(input: &mut R) -> std::io::Result<Option<String>> {
    let mut buf = Vec::new();
    if input.read_until(b'\n', &mut buf).await? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Feed lines from `input` to the router until EOF or shutdown
pub async fn run<R: AsyncBufRead + Unpin>(
    mut input: R,
    router: &CommandRouter,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,

            line = next_line(&mut input) => {
                let Some(line) = line? else {
                    tracing::info!("Console input closed");
                    break;
                };
                match parse_line(&line) {
                    Some(message) => router.handle(message).await,
                    None if line.trim().is_empty() => {}
                    None => tracing::debug!(line = %line, "Ignoring malformed input line"),
                }
            }
        }
    }

    Ok(())
}
