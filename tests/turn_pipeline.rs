//! End-to-end turn tests: token stream in, ordered speech + mood + command out.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use wren::config::ConversationConfig;
use wren::conversation::Conversation;
use wren::error::{AssistantError, Result};
use wren::{
    AudioClip, AudioPlayer, MoodSink, PlaybackQueue, Skill, SkillRegistry, SpeechSynthesizer,
    TurnController, TurnOutcome,
};

/// Records every text it is asked to synthesize; optionally fails or
/// delays specific texts. Clips carry their text length so the player can
/// reconstruct what played.
#[derive(Default)]
struct RecordingSynth {
    requests: Mutex<Vec<String>>,
    fail_on: Option<String>,
    /// (text, delay ms) pairs; unlisted texts synthesize instantly.
    delays_ms: Vec<(String, u64)>,
}

#[async_trait]
impl SpeechSynthesizer for RecordingSynth {
    async fn synthesize(&self, text: &str) -> Result<AudioClip> {
        self.requests.lock().unwrap().push(text.to_owned());
        if let Some((_, delay)) = self.delays_ms.iter().find(|(t, _)| t == text) {
            tokio::time::sleep(Duration::from_millis(*delay)).await;
        }
        if self.fail_on.as_deref() == Some(text) {
            return Err(AssistantError::Tts("scripted failure".to_owned()));
        }
        Ok(AudioClip {
            samples: vec![0.0; text.len()],
            sample_rate: 24_000,
        })
    }
}

#[derive(Default)]
struct RecordingPlayer {
    played_lens: Mutex<Vec<usize>>,
}

#[async_trait]
impl AudioPlayer for RecordingPlayer {
    async fn play(&self, clip: AudioClip) -> Result<()> {
        self.played_lens.lock().unwrap().push(clip.samples.len());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSink {
    moods: Mutex<Vec<String>>,
}

#[async_trait]
impl MoodSink for RecordingSink {
    async fn notify_mood(&self, identifier: &str) -> Result<()> {
        self.moods.lock().unwrap().push(identifier.to_owned());
        Ok(())
    }
}

#[derive(Default)]
struct LauncherSkill {
    calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Skill for LauncherSkill {
    fn name(&self) -> &str {
        "launcher"
    }
    fn description(&self) -> &str {
        "opens applications and URLs"
    }
    fn commands(&self) -> &[&str] {
        &["open_app", "open_url"]
    }
    async fn execute(&self, command: &str, param: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((command.to_owned(), param.to_owned()));
        Ok(())
    }
}

struct Harness {
    controller: TurnController,
    synth: Arc<RecordingSynth>,
    player: Arc<RecordingPlayer>,
    sink: Arc<RecordingSink>,
    launcher: Arc<LauncherSkill>,
}

/// Skill wrapper so the test can keep a handle to the registered skill.
struct SharedLauncher(Arc<LauncherSkill>);

#[async_trait]
impl Skill for SharedLauncher {
    fn name(&self) -> &str {
        self.0.name()
    }
    fn description(&self) -> &str {
        self.0.description()
    }
    fn commands(&self) -> &[&str] {
        self.0.commands()
    }
    async fn execute(&self, command: &str, param: &str) -> Result<()> {
        self.0.execute(command, param).await
    }
}

fn harness(synth: RecordingSynth) -> Harness {
    let synth = Arc::new(synth);
    let player = Arc::new(RecordingPlayer::default());
    let sink = Arc::new(RecordingSink::default());
    let launcher = Arc::new(LauncherSkill::default());

    let playback = Arc::new(PlaybackQueue::new(
        Arc::clone(&synth) as Arc<dyn SpeechSynthesizer>,
        Arc::clone(&player) as Arc<dyn AudioPlayer>,
    ));
    let mut skills = SkillRegistry::new();
    skills.register(Box::new(SharedLauncher(Arc::clone(&launcher))));

    let controller = TurnController::new(
        playback,
        Arc::clone(&sink) as Arc<dyn MoodSink>,
        skills,
    );
    Harness {
        controller,
        synth,
        player,
        sink,
        launcher,
    }
}

async fn run_fragments(h: &Harness, fragments: &[&str]) -> TurnOutcome {
    let (tx, rx) = mpsc::channel(16);
    for fragment in fragments {
        tx.send(Ok((*fragment).to_owned())).await.unwrap();
    }
    drop(tx);
    h.controller.run_turn(rx).await.unwrap()
}

#[tokio::test]
async fn command_text_is_never_synthesized() {
    let h = harness(RecordingSynth::default());
    let outcome = run_fragments(&h, &["Sure, done.", "[CMD: open_app, Spotify]"]).await;

    assert_eq!(
        h.synth.requests.lock().unwrap().clone(),
        vec!["Sure, done."]
    );
    let cmd = outcome.command.unwrap();
    assert_eq!((cmd.name.as_str(), cmd.param.as_str()), ("open_app", "Spotify"));
    assert_eq!(
        h.launcher.calls.lock().unwrap().clone(),
        vec![("open_app".to_owned(), "Spotify".to_owned())]
    );
    assert_eq!(h.player.played_lens.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn exactly_one_mood_event_per_turn() {
    let h = harness(RecordingSynth::default());
    let outcome = run_fragments(&h, &["[happy] Hello. ", "[sad] "]).await;

    assert_eq!(h.sink.moods.lock().unwrap().clone(), vec!["happy"]);
    assert_eq!(outcome.mood.as_deref(), Some("happy"));
    // "[sad]" was stripped as a stray tag, not spoken.
    assert_eq!(h.synth.requests.lock().unwrap().clone(), vec!["Hello."]);
}

#[tokio::test]
async fn split_mood_tag_resolves_once_complete() {
    let h = harness(RecordingSynth::default());
    let outcome = run_fragments(&h, &["[hap", "py] Hi there."]).await;

    assert_eq!(h.sink.moods.lock().unwrap().clone(), vec!["happy"]);
    assert_eq!(outcome.spoken_units, 1);
    assert_eq!(h.synth.requests.lock().unwrap().clone(), vec!["Hi there."]);
}

#[tokio::test]
async fn stray_tag_is_stripped_from_speech() {
    let h = harness(RecordingSynth::default());
    run_fragments(&h, &["Okay [neutral] let's go. "]).await;

    assert_eq!(
        h.synth.requests.lock().unwrap().clone(),
        vec!["Okay let's go."]
    );
}

#[tokio::test(start_paused = true)]
async fn synthesis_failure_skips_one_unit_only() {
    let synth = RecordingSynth {
        fail_on: Some("Second one!".to_owned()),
        ..Default::default()
    };
    let h = harness(synth);
    let outcome = run_fragments(&h, &["First one. Second one! Third one? "]).await;

    assert_eq!(outcome.spoken_units, 3);
    // Unit 2 skipped; 1 and 3 play in order.
    assert_eq!(
        h.player.played_lens.lock().unwrap().clone(),
        vec!["First one.".len(), "Third one?".len()]
    );
}

#[tokio::test(start_paused = true)]
async fn turn_waits_for_all_audio_in_reading_order() {
    // First sentence synthesizes slowest: playback must still lead with it.
    let synth = RecordingSynth {
        delays_ms: vec![
            ("Alpha beta.".to_owned(), 50),
            ("Gamma.".to_owned(), 20),
            ("Delta epsilon zeta.".to_owned(), 1),
        ],
        ..Default::default()
    };
    let h = harness(synth);
    let outcome = run_fragments(&h, &["Alpha beta. Gamma. Delta epsilon zeta. "]).await;

    assert_eq!(outcome.spoken_units, 3);
    assert_eq!(
        h.player.played_lens.lock().unwrap().clone(),
        vec![
            "Alpha beta.".len(),
            "Gamma.".len(),
            "Delta epsilon zeta.".len()
        ]
    );
}

#[tokio::test]
async fn full_turn_with_history_recording() {
    let h = harness(RecordingSynth::default());
    let mut history = Conversation::with_system_prompt(
        ConversationConfig::default(),
        "You are a voice assistant.",
    );

    let outcome = run_fragments(
        &h,
        &[
            "[proud] Of course ",
            "I can. Opening it now. ",
            "[CMD: open_url, youtube.com]",
        ],
    )
    .await;

    assert_eq!(outcome.mood.as_deref(), Some("proud"));
    assert_eq!(outcome.spoken_units, 2);
    assert_eq!(outcome.command.as_ref().unwrap().name, "open_url");

    history.record_turn("open youtube", &outcome.raw_response);
    assert_eq!(history.len(), 3);
    assert!(history.entries()[2].content.contains("[CMD: open_url"));
}
