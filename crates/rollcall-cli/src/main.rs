//! rollcall CLI: standalone voice checklist server.
//!
//! ```text
//! rollcall serve [--port 2010] [--host 127.0.0.1] [--voice af_heart]
//! rollcall start [--server http://localhost:2010]
//! rollcall status / cancel [--server ...]
//! ```

use std::sync::Arc;

use clap::{Parser, Subcommand};

use rollcall_lib::engine::ChecklistEngine;
use rollcall_lib::rollcall_core::definition::SURGICAL_SAFETY_CHECKLIST;
use rollcall_lib::rollcall_core::types::{InputDevice, RecognizerConfig, RunPolicy, SynthConfig};
use rollcall_lib::stt::WhisperListener;
use rollcall_lib::synth::HttpSpeaker;

/// rollcall, a voice-driven surgical safety checklist
#[derive(Parser)]
#[command(name = "rollcall", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the checklist server
    Serve {
        /// Listen port
        #[arg(long, default_value = "2010")]
        port: u16,
        /// Listen host
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Speech synthesis server URL
        #[arg(long, default_value = "http://localhost:8880")]
        speech_url: String,
        /// Synthesis voice
        #[arg(long, default_value = "af_heart")]
        voice: String,
        /// Synthesis playback speed
        #[arg(long, default_value = "1.0")]
        speed: f32,
        /// whisper-server URL
        #[arg(long, default_value = "http://localhost:2022")]
        stt_url: String,
        /// Whisper model name
        #[arg(long, default_value = "base", value_parser = ["tiny", "base", "small", "medium", "large"])]
        stt_model: String,
        /// Capture device name (system default when omitted)
        #[arg(long)]
        input_device: Option<String>,
        /// Capture attempts per question before it is skipped
        #[arg(long, default_value = "3")]
        max_attempts: u32,
    },
    /// Ask the running server to start a checklist run
    Start {
        /// Server URL
        #[arg(long, default_value = "http://localhost:2010")]
        server: String,
    },
    /// Print the current checklist snapshot
    Status {
        #[arg(long, default_value = "http://localhost:2010")]
        server: String,
    },
    /// Ask the running server to cancel the live run
    Cancel {
        #[arg(long, default_value = "http://localhost:2010")]
        server: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            port,
            host,
            speech_url,
            voice,
            speed,
            stt_url,
            stt_model,
            input_device,
            max_attempts,
        } => {
            let synth = SynthConfig {
                url: speech_url,
                voice,
                speed,
            };
            let recognizer = RecognizerConfig {
                url: stt_url,
                model: stt_model,
                device: input_device.map_or(InputDevice::SystemDefault, InputDevice::Named),
            };

            let speaker = Arc::new(HttpSpeaker::new(synth));
            let listener =
                Arc::new(WhisperListener::new(recognizer).expect("invalid recognizer config"));

            let engine = ChecklistEngine::new(
                SURGICAL_SAFETY_CHECKLIST,
                speaker,
                listener,
                RunPolicy { max_attempts },
            );
            let app = rollcall_lib::server::router(engine);

            let addr = format!("{host}:{port}");
            eprintln!("rollcall listening on {addr}");

            let socket = tokio::net::TcpListener::bind(&addr)
                .await
                .expect("failed to bind");

            axum::serve(socket, app).await.expect("server error");
        }

        Command::Start { server } => get_simple(&server, "start").await,
        Command::Status { server } => get_simple(&server, "api/status").await,
        Command::Cancel { server } => get_simple(&server, "cancel").await,
    }
}

async fn get_simple(server: &str, endpoint: &str) {
    let resp = reqwest::Client::new()
        .get(format!("{server}/{endpoint}"))
        .send()
        .await
        .expect("request failed");
    println!("{}", resp.text().await.unwrap_or_default());
}
