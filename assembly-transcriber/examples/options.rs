//! Transcribe with an explicit language and a bounded polling policy,
//! driving each API call separately.
//!
//! Usage: ASSEMBLYAI_API_KEY=... cargo run --example options -- path/to/audio.mp3

use std::time::Duration;

use assembly_transcriber::{Client, Config, PollPolicy};

#[tokio::main]
async fn main() -> assembly_transcriber::Result<()> {
    let input = std::env::args()
        .nth(1)
        .expect("usage: options <audio-file>");
    let api_key = std::env::var("ASSEMBLYAI_API_KEY").expect("ASSEMBLYAI_API_KEY must be set");

    let config = Config::for_input(api_key, &input)?
        .language("en_us")?
        .poll(
            PollPolicy::new()
                .initial_delay(Duration::from_secs(3))
                .max_delay(Duration::from_secs(15))
                .timeout(Some(Duration::from_secs(30 * 60))),
        )
        .validate()?;

    let client = Client::new(&config)?;
    let audio_url = client.upload(&config.input_file).await?;
    println!("uploaded: {audio_url}");

    let id = client.request_transcript(&audio_url, &config.language).await?;
    println!("job: {id}");

    let text = client.wait_for_transcript(&id, &config.poll).await?;
    println!("{text}");

    Ok(())
}
