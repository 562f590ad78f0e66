use std::io::Write as _;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::EnvFilter;

use sophia_voice::config::DEFAULT_SERVICE_ORIGIN;
use sophia_voice::voice::{Player, Recorder};
use sophia_voice::{Assistant, Config, ui};

/// Sophia - push-to-talk voice assistant client
#[derive(Parser)]
#[command(name = "sophia", version, about)]
struct Cli {
    /// Origin of the transcription service
    #[arg(long, env = "SOPHIA_SERVICE_ORIGIN", default_value = DEFAULT_SERVICE_ORIGIN)]
    service_origin: String,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,sophia_voice=warn",
        1 => "info,sophia_voice=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
        };
    }

    let config = Config::new(&cli.service_origin)?;
    tracing::info!(origin = %config.service_origin, "starting voice assistant");

    run_assistant(config).await
}

/// Interactive toggle loop: Enter starts/stops recording, q quits
#[allow(clippy::future_not_send)]
async fn run_assistant(config: Config) -> anyhow::Result<()> {
    let mut assistant = Assistant::new(config)?;

    // Reader task: select! needs a cancel-safe input source
    let (input_tx, mut input_rx) = tokio::sync::mpsc::channel::<String>(8);
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if input_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let mut last = assistant.view();
    draw(&ui::render(&last, assistant.assistant_name()))?;

    loop {
        tokio::select! {
            line = input_rx.recv() => {
                let Some(line) = line else { break };
                match line.trim() {
                    "q" | "quit" => break,
                    "" => {
                        if let Err(e) = assistant.toggle() {
                            tracing::error!(error = %e, "toggle failed");
                        }
                        last = assistant.view();
                        draw(&ui::render(&last, assistant.assistant_name()))?;
                    }
                    other => {
                        tracing::warn!(input = other, "unrecognized input");
                    }
                }
            }
            () = tokio::time::sleep(Duration::from_millis(200)) => {
                // Repaint when an exchange finishes and updates the view
                let view = assistant.view();
                if view != last {
                    draw(&ui::render(&view, assistant.assistant_name()))?;
                    last = view;
                }
            }
        }
    }

    Ok(())
}

fn draw(rendered: &str) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Test microphone input
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Recording for {duration} seconds, speak into your microphone...");

    let mut recorder = Recorder::new()?;
    recorder.start()?;

    tokio::time::sleep(Duration::from_secs(duration)).await;

    let Some(session) = recorder.stop() else {
        anyhow::bail!("no recording session was active");
    };

    let fragments = session.fragment_count();
    let samples = session.finalize();
    let energy = calculate_rms(&samples);
    let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

    println!("Captured {fragments} fragments, {} samples", samples.len());
    println!("RMS: {energy:.4} | Peak: {peak:.4}");

    if energy < 0.001 {
        println!("RMS stayed near 0 - check your microphone connection and levels");
    } else {
        println!("Your mic is working!");
    }

    Ok(())
}

/// Calculate RMS energy
#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Playing a 440Hz tone for 2 seconds...");

    let mut player = Player::new()?;

    let sample_rate = 24000_f32;
    let frequency = 440.0_f32;
    let duration_secs = 2.0_f32;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let num_samples = (sample_rate * duration_secs) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    player.play_samples(samples);

    // Playback runs on its own thread; wait for the tone plus a little drain
    tokio::time::sleep(Duration::from_millis(2500)).await;

    println!("If you heard the tone, your speakers are working!");

    Ok(())
}
