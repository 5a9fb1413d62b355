use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chat_core::{ChatClient, HttpTransport, Message, Role};
use chatstream::{
    normalize_display, run_session, AppConfig, ChatSession, SessionCommand, SessionEvent,
    SessionPhase,
};
use speech_core::{AudioPlayer, HttpSynthesizer, RodioPlayer, SilentPlayer, Speaker};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

const STARTER_PROMPTS: [&str; 4] = [
    "Tell me about the latest AI advancements",
    "Explain quantum computing",
    "What are the best practices in cybersecurity?",
    "How does blockchain technology work?",
];

const METER_BARS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const METER_BINS: usize = 24;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _ = dotenv::dotenv();

    async_main().await
}

async fn async_main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    info!("chat endpoint: {}", config.chat_endpoint);
    info!(
        "tts endpoint: {} (voice {})",
        config.tts_endpoint, config.tts_voice
    );

    let transport = HttpTransport::new(config.chat_endpoint.clone(), config.connect_timeout())
        .context("building the chat transport")?;
    let client = ChatClient::new(Arc::new(transport));

    let synthesizer = Arc::new(
        HttpSynthesizer::new(
            config.tts_endpoint.clone(),
            config.voice_options(),
            config.connect_timeout(),
        )
        .context("building the speech synthesizer")?,
    );

    let player: Arc<dyn AudioPlayer> = if config.voice_output {
        match RodioPlayer::new() {
            Ok(player) => Arc::new(player),
            Err(e) => {
                warn!("no audio output, continuing silently: {e}");
                Arc::new(SilentPlayer::new())
            }
        }
    } else {
        Arc::new(SilentPlayer::new())
    };

    let speaker = Speaker::spawn(synthesizer, player);

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let session = ChatSession::new(client, speaker.clone(), event_tx, config.speak_plain);
    let mut session_task = tokio::spawn(run_session(session, command_rx, None));

    println!("chatstream: ask anything, the answer streams back and is read aloud");
    println!("commands: /stop silences playback, /history reprints the transcript,");
    println!("          /dump prints it as JSON, /quit exits");
    println!();
    println!("Some questions to get you started (type a number):");
    for (i, prompt) in STARTER_PROMPTS.iter().enumerate() {
        println!("  {}) {prompt}", i + 1);
    }
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    let mut console = Console::new();
    let mut chat_started = false;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else { break };
                let input = line.trim();
                match input {
                    "" => {}
                    "/quit" | "/exit" => break,
                    "/stop" => {
                        let _ = command_tx.send(SessionCommand::Stop);
                    }
                    "/history" => {
                        console.clear_meter();
                        console.print_transcript();
                    }
                    "/dump" => {
                        console.clear_meter();
                        console.dump_transcript();
                    }
                    "1" | "2" | "3" | "4" if !chat_started => {
                        let prompt = STARTER_PROMPTS[(input.as_bytes()[0] - b'1') as usize];
                        chat_started = true;
                        let _ = command_tx.send(SessionCommand::Submit(prompt.to_string()));
                    }
                    question => {
                        chat_started = true;
                        let _ = command_tx.send(SessionCommand::Submit(question.to_string()));
                    }
                }
            }
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                console.on_event(event);
            }
            _ = ticker.tick() => {
                console.draw_meter(&speaker);
            }
        }
    }

    console.clear_meter();
    console.close_assistant_line();
    drop(command_tx);

    if tokio::time::timeout(Duration::from_secs(5), speaker.wait_idle())
        .await
        .is_err()
    {
        warn!("playback still busy after 5s, shutting down anyway");
    }
    speaker.close();

    let session = match tokio::time::timeout(Duration::from_secs(10), &mut session_task).await {
        Ok(joined) => joined.context("joining the session loop")?,
        Err(_) => {
            warn!("session loop still busy, aborting it");
            session_task.abort();
            return Ok(());
        }
    };

    info!("done ({} transcript entries)", session.history().len());
    Ok(())
}

/// Terminal state: the local mirror of the transcript plus everything
/// needed to grow the assistant line in place and to draw the playback
/// meter without clobbering text.
struct Console {
    mirror: Vec<Message>,
    phase: SessionPhase,
    assistant_open: bool,
    printed_len: usize,
    meter_drawn: bool,
}

impl Console {
    fn new() -> Self {
        Self {
            mirror: Vec::new(),
            phase: SessionPhase::Idle,
            assistant_open: false,
            printed_len: 0,
            meter_drawn: false,
        }
    }

    fn on_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Phase(phase) => {
                self.phase = phase;
                if phase != SessionPhase::Streaming {
                    self.close_assistant_line();
                }
            }
            SessionEvent::Message(message) => {
                self.clear_meter();
                self.close_assistant_line();
                match message.role {
                    Role::User => println!("you ▸ {}", message.text),
                    Role::Assistant => {
                        print!("bot ▸ ");
                        flush();
                        self.assistant_open = true;
                        self.printed_len = 0;
                    }
                    Role::Error => println!("err ▸ {}", message.text),
                }
                self.mirror.push(message);
            }
            SessionEvent::AssistantRevised { index, text } => {
                if self.assistant_open && text.len() > self.printed_len {
                    print!("{}", &text[self.printed_len..]);
                    flush();
                    self.printed_len = text.len();
                }
                if let Some(entry) = self.mirror.get_mut(index) {
                    entry.text = text;
                }
            }
            SessionEvent::Listening(listening) => {
                if listening {
                    println!("(listening...)");
                }
            }
        }
    }

    fn close_assistant_line(&mut self) {
        if self.assistant_open {
            println!();
            self.assistant_open = false;
        }
    }

    fn clear_meter(&mut self) {
        if self.meter_drawn {
            print!("\r{:width$}\r", "", width = METER_BINS + 2);
            flush();
            self.meter_drawn = false;
        }
    }

    /// Redraw the playback meter. Suppressed while an answer is
    /// streaming so it cannot interleave with the growing text.
    fn draw_meter(&mut self, speaker: &Speaker) {
        if self.phase == SessionPhase::Streaming {
            return;
        }
        if speaker.is_playing() {
            let meter: String = speaker
                .waveform(METER_BINS)
                .into_iter()
                .map(|byte| {
                    let level = (byte as i16 - 128).unsigned_abs() as usize;
                    METER_BARS[level * (METER_BARS.len() - 1) / 128]
                })
                .collect();
            print!("\r♪ {meter}");
            flush();
            self.meter_drawn = true;
        } else {
            self.clear_meter();
        }
    }

    fn print_transcript(&self) {
        for message in &self.mirror {
            match message.role {
                Role::User => println!("you ▸ {}", message.text),
                Role::Assistant => println!("bot ▸ {}", normalize_display(&message.text)),
                Role::Error => println!("err ▸ {}", message.text),
            }
        }
    }

    fn dump_transcript(&self) {
        match serde_json::to_string_pretty(&self.mirror) {
            Ok(json) => println!("{json}"),
            Err(e) => warn!("could not serialize the transcript: {e}"),
        }
    }
}

fn flush() {
    let _ = std::io::stdout().flush();
}
