use aetheris_voice::{
    CaptureConfig, Config, CpalCapture, CpalPlayback, LiveSession, SessionConfig, WsConnector,
};
use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "aetheris-voice", about = "Live voice conversation session")]
struct Args {
    /// Config file path (without extension)
    #[arg(long, default_value = "config/aetheris-voice")]
    config: String,

    /// Override the live service URL
    #[arg(long)]
    url: Option<String>,

    /// Override the model identifier
    #[arg(long)]
    model: Option<String>,

    /// Override the voice identifier
    #[arg(long)]
    voice: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let session_config = SessionConfig {
        url: args.url.unwrap_or(cfg.live.url),
        model: args.model.unwrap_or(cfg.live.model),
        voice: args.voice.unwrap_or(cfg.live.voice),
        preamble: cfg.live.preamble,
        capture_sample_rate: cfg.audio.capture_sample_rate,
        playback_sample_rate: cfg.audio.playback_sample_rate,
        frame_samples: cfg.audio.frame_samples,
        capture_queue_capacity: cfg.audio.capture_queue_capacity,
        ..SessionConfig::default()
    };

    let capture = CpalCapture::new(CaptureConfig {
        sample_rate: session_config.capture_sample_rate,
        frame_samples: session_config.frame_samples,
        queue_capacity: session_config.capture_queue_capacity,
        device: None,
    });

    let playback = CpalPlayback::open(session_config.playback_sample_rate)?;

    let connector = WsConnector {
        url: session_config.url.clone(),
    };

    let mut session = LiveSession::new(
        session_config,
        Box::new(capture),
        Box::new(connector),
        Box::new(playback),
    );

    session.start().await?;

    let stop = session.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping session");
            stop.request_stop();
        }
    });

    if let Err(e) = session.run().await {
        error!("Session ended with error: {}", e);
    }

    for entry in session.transcript() {
        println!("{:?}: {}", entry.role, entry.text);
    }

    let stats = session.stats();
    info!(
        "Session summary: {:.1}s, {} frames sent ({} dropped), {} chunks played, {} turns",
        stats.duration_secs,
        stats.frames_sent,
        stats.frames_dropped,
        stats.chunks_scheduled,
        stats.turns_completed
    );

    Ok(())
}
