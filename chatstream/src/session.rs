use std::sync::Arc;

use chat_core::{ChatClient, Message, MessageHistory};
use futures_util::StreamExt;
use speech_core::{Speaker, SpeechCapture};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::text::clean_for_speech;
use crate::validation::{validate_question, QuestionIssue};

/// Error entry appended to the transcript when a turn fails mid-flight
pub const TURN_ERROR_TEXT: &str = "An error occurred while processing your request.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Streaming,
    Errored,
}

/// Input to the session loop
#[derive(Debug)]
pub enum SessionCommand {
    /// Submit a typed question
    Submit(String),
    /// Capture a spoken question and submit its transcript
    Capture,
    /// Silence playback, keeping the transcript as it stands
    Stop,
}

/// Outbound notifications for whatever frontend is attached
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Phase(SessionPhase),
    /// A new transcript entry at this index
    Message(Message),
    /// The streaming assistant entry grew; `text` is the full entry, not
    /// a delta
    AssistantRevised { index: usize, text: String },
    Listening(bool),
}

/// One conversation: a streaming chat client, a speech pipeline, and the
/// transcript both feed.
pub struct ChatSession {
    client: ChatClient,
    speaker: Speaker,
    history: MessageHistory,
    phase: SessionPhase,
    events: UnboundedSender<SessionEvent>,
    speak_plain: bool,
}

impl ChatSession {
    pub fn new(
        client: ChatClient,
        speaker: Speaker,
        events: UnboundedSender<SessionEvent>,
        speak_plain: bool,
    ) -> Self {
        Self {
            client,
            speaker,
            history: MessageHistory::new(),
            phase: SessionPhase::Idle,
            events,
            speak_plain,
        }
    }

    /// Handle onto the speech pipeline this session feeds
    pub fn speaker_handle(&self) -> Speaker {
        self.speaker.clone()
    }

    pub fn history(&self) -> &MessageHistory {
        &self.history
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn set_listening(&self, listening: bool) {
        let _ = self.events.send(SessionEvent::Listening(listening));
    }

    /// Run one question to completion: append the user entry and an
    /// empty assistant entry, then grow the assistant entry with each
    /// increment and hand the increment to the speaker.
    ///
    /// A failed turn appends one error entry and leaves whatever partial
    /// answer already streamed in place. Dropping the returned future
    /// mid-stream abandons the exchange the same way, minus the error
    /// entry.
    pub async fn submit(&mut self, raw: &str) {
        let question = match validate_question(raw) {
            Ok(question) => question.to_string(),
            Err(QuestionIssue::Empty) => {
                debug!("ignoring empty question");
                return;
            }
            Err(issue) => {
                let index = self.history.push_error(issue.to_string());
                self.emit_entry(index);
                return;
            }
        };

        let turn = Uuid::new_v4();
        info!("turn {turn}: asking ({} question chars)", question.len());
        self.set_phase(SessionPhase::Streaming);

        let index = self.history.push_user(question.as_str());
        self.emit_entry(index);
        let assistant = self.history.push_assistant_placeholder();
        self.emit_entry(assistant);

        let mut increments = match self.client.ask(&question).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("turn {turn}: request failed: {e}");
                self.fail_turn();
                return;
            }
        };

        let mut answer = String::new();
        while let Some(item) = increments.next().await {
            match item {
                Ok(increment) => {
                    if !increment.text.is_empty() {
                        answer.push_str(&increment.text);
                        self.history.revise_assistant(assistant, answer.clone());
                        let _ = self.events.send(SessionEvent::AssistantRevised {
                            index: assistant,
                            text: answer.clone(),
                        });

                        let spoken = if self.speak_plain {
                            clean_for_speech(&increment.text)
                        } else {
                            increment.text.clone()
                        };
                        self.speaker.enqueue_text(&spoken);
                    }
                    if increment.is_final {
                        break;
                    }
                }
                Err(e) => {
                    warn!("turn {turn}: stream failed: {e}");
                    self.fail_turn();
                    return;
                }
            }
        }

        info!("turn {turn}: complete ({} answer chars)", answer.len());
        self.set_phase(SessionPhase::Idle);
    }

    fn fail_turn(&mut self) {
        let index = self.history.push_error(TURN_ERROR_TEXT);
        self.emit_entry(index);
        self.set_phase(SessionPhase::Errored);
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        if self.phase != phase {
            self.phase = phase;
            let _ = self.events.send(SessionEvent::Phase(phase));
        }
    }

    fn emit_entry(&self, index: usize) {
        if let Some(message) = self.history.messages().get(index) {
            let _ = self.events.send(SessionEvent::Message(message.clone()));
        }
    }
}

/// Drive a session from a command channel until the channel closes,
/// then hand the session back for inspection.
///
/// A question submitted while an answer is still streaming supersedes
/// it: the running turn is dropped where it stands, playback stops, and
/// the new question begins. Stop only silences playback. Capture is
/// ignored mid-stream.
pub async fn run_session(
    mut session: ChatSession,
    mut commands: UnboundedReceiver<SessionCommand>,
    capture: Option<Arc<dyn SpeechCapture>>,
) -> ChatSession {
    let speaker = session.speaker_handle();

    loop {
        let Some(command) = commands.recv().await else {
            return session;
        };

        let mut pending_question = match command {
            SessionCommand::Submit(question) => Some(question),
            SessionCommand::Capture => capture_transcript(&mut session, capture.as_deref()).await,
            SessionCommand::Stop => {
                speaker.stop();
                None
            }
        };

        let mut closed = false;
        while let Some(question) = pending_question.take() {
            let turn = session.submit(&question);
            tokio::pin!(turn);
            loop {
                tokio::select! {
                    _ = &mut turn => break,
                    command = commands.recv() => match command {
                        Some(SessionCommand::Submit(next)) => {
                            info!("new question supersedes the running turn");
                            speaker.stop();
                            pending_question = Some(next);
                            break;
                        }
                        Some(SessionCommand::Stop) => speaker.stop(),
                        Some(SessionCommand::Capture) => {
                            debug!("capture ignored while an answer is streaming");
                        }
                        None => {
                            (&mut turn).await;
                            closed = true;
                            break;
                        }
                    },
                }
            }
        }
        if closed {
            return session;
        }
    }
}

async fn capture_transcript(
    session: &mut ChatSession,
    capture: Option<&dyn SpeechCapture>,
) -> Option<String> {
    let Some(capture) = capture else {
        warn!("no speech capture is configured");
        return None;
    };

    session.set_listening(true);
    let heard = capture.listen().await;
    session.set_listening(false);

    match heard {
        Ok(transcript) => Some(transcript),
        Err(e) => {
            warn!("speech capture failed: {e}");
            None
        }
    }
}
