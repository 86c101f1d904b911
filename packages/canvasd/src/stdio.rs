//! Line-based command channel over stdout.
//!
//! Every paint operation becomes a `place <x> <y> <#rrggbb> <origin>` line,
//! where origin is `job=<id>` or `guard`, and every notice or operator reply
//! a `say <text>` line. Observed canvas writes are
//! fed in through [`StdioChannel::publish`].

use actors::{CommandChannel, SendFuture, write_stream};
use canvas_core::{CanvasWrite, Notice, PaintOp, SendFailure, SendOrigin};
use futures_util::stream::BoxStream;
use tokio::io::AsyncWriteExt;
use tokio::sync::{broadcast, mpsc, oneshot};

type Ack = oneshot::Sender<std::io::Result<()>>;

pub struct StdioChannel {
    lines: mpsc::UnboundedSender<(String, Option<Ack>)>,
    inbound: broadcast::Sender<CanvasWrite>,
}

impl StdioChannel {
    /// Create the channel and its stdout writer task.
    pub fn spawn() -> Self {
        let (lines, mut rx) = mpsc::unbounded_channel::<(String, Option<Ack>)>();
        tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some((line, ack)) = rx.recv().await {
                let result = write_line(&mut stdout, &line).await;
                if let Err(e) = &result {
                    tracing::warn!("Failed to write to stdout: {}", e);
                }
                if let Some(ack) = ack {
                    let _ = ack.send(result);
                }
            }
        });

        let (inbound, _) = broadcast::channel(1024);
        Self { lines, inbound }
    }

    /// Write a free-form reply line.
    pub fn say(&self, text: &str) {
        let _ = self.lines.send((format!("say {text}"), None));
    }

    /// Report a write observed on the canvas.
    pub fn publish(&self, write: CanvasWrite) {
        // no subscribers is fine
        let _ = self.inbound.send(write);
    }
}

async fn write_line(stdout: &mut tokio::io::Stdout, line: &str) -> std::io::Result<()> {
    stdout.write_all(line.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await
}

fn place_line(op: &PaintOp, origin: &SendOrigin) -> String {
    match origin {
        SendOrigin::Job(id) => format!("place {} {} {} job={}", op.x, op.y, op.color, id),
        SendOrigin::Guard => format!("place {} {} {} guard", op.x, op.y, op.color),
    }
}

impl CommandChannel for StdioChannel {
    fn send(&self, op: PaintOp, origin: SendOrigin) -> SendFuture {
        let (ack, done) = oneshot::channel();
        let line = place_line(&op, &origin);
        tracing::debug!("-> {}", line);
        let queued = self.lines.send((line, Some(ack)));

        Box::pin(async move {
            queued.map_err(|_| SendFailure::new("stdout writer stopped"))?;
            match done.await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(SendFailure::new(e.to_string())),
                Err(_) => Err(SendFailure::new("stdout writer stopped")),
            }
        })
    }

    fn announce(&self, notice: Notice) {
        self.say(&notice.description());
    }

    fn subscribe(&self) -> BoxStream<'static, CanvasWrite> {
        write_stream(self.inbound.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use canvas_core::{JobId, Rgb};

    use super::*;

    #[test]
    fn place_lines_carry_their_origin() -> Result<(), Box<dyn std::error::Error>> {
        let op = PaintOp::new(3, -7, Rgb::new(255, 0, 16));
        let id = JobId::parse("01J0000000000000000000000A").ok_or("bad id")?;

        assert_eq!(
            place_line(&op, &SendOrigin::Job(id)),
            "place 3 -7 #ff0010 job=01J0000000000000000000000A"
        );
        assert_eq!(place_line(&op, &SendOrigin::Guard), "place 3 -7 #ff0010 guard");
        Ok(())
    }
}
