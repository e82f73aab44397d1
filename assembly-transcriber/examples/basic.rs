//! Transcribe a file using an appsettings.json settings file.
//!
//! Usage: cargo run --example basic -- path/to/appsettings.json

use std::path::PathBuf;

#[tokio::main]
async fn main() -> assembly_transcriber::Result<()> {
    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .expect("usage: basic <appsettings.json>");

    let config = assembly_transcriber::Settings::load(&settings_path)?
        .into_config()?
        .validate()?;

    let saved = assembly_transcriber::transcribe_file(&config).await?;

    println!("{}", saved.text);
    eprintln!("saved to {}", saved.path.display());

    Ok(())
}
