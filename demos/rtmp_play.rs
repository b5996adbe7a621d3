// Play Client Example
//
// This example demonstrates:
// - Connecting to an RTMP server
// - Creating a stream and playing a file to the end
// - Saving the received FLV data
//
// Usage:
//   cargo run --example rtmp_play -- rtmp://localhost/vod movie.flv [output]

use cygnal::{ClientConfig, Result, RtmpClient};
use log::info;
use std::env;
use std::process;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <url> <stream_name> [output]", args[0]);
        eprintln!("Example:");
        eprintln!("  {} rtmp://localhost/vod movie.flv movie-copy.flv", args[0]);
        process::exit(1);
    }
    let url = &args[1];
    let stream_name = &args[2];

    let config = ClientConfig::builder().chunk_size(4096).build()?;
    let mut client = RtmpClient::with_config(config);

    info!("Connecting to {}", url);
    client.connect(url)?;

    let stream_id = client.create_stream()?;
    info!("Playing {} on stream {}", stream_name, stream_id);
    let data = client.play(stream_name)?;
    info!("Received {} bytes", data.len());

    if let Some(output) = args.get(3) {
        std::fs::write(output, &data)?;
        info!("Saved to {}", output);
    }

    client.close();
    Ok(())
}
