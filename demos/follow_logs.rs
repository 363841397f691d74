use std::io::Write;

use engine_client::{Client, ContainerOutput, Endpoint, StreamTag, api::LogsOptions};

#[tokio::main(flavor = "current_thread")]
async fn main() -> engine_client::Result<()> {
    let Some(container) = std::env::args().nth(1) else {
        eprintln!("usage: follow_logs <container>");
        return Ok(());
    };

    let client = Client::connect(Endpoint::default()).await?;
    let options = LogsOptions {
        follow: true,
        ..Default::default()
    };

    match client.logs(&container, options).await? {
        ContainerOutput::Multiplexed(mut frames) => {
            while let Some(frame) = frames.try_next().await? {
                match frame.tag {
                    StreamTag::Stderr => std::io::stderr().write_all(&frame.payload)?,
                    _ => std::io::stdout().write_all(&frame.payload)?,
                }
            }
        }
        ContainerOutput::Raw(mut chunks) => {
            while let Some(text) = chunks.try_next().await? {
                print!("{text}");
            }
        }
        ContainerOutput::Buffered(bytes) => std::io::stdout().write_all(&bytes)?,
    }

    Ok(())
}
