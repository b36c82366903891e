//! The checklist run loop.
//!
//! One pass over the checklist in definition order: each section title is
//! announced, then each question is read aloud and a spoken answer is written
//! into the shared model. Recognition failures re-prompt up to the policy's
//! attempt ceiling; synthesis failures are logged and the run keeps moving.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use rollcall_core::classify::{classify, Decision};
use rollcall_core::model::{Answer, Checklist};
use rollcall_core::types::{RunOutcome, RunPolicy, RunReport, SkippedQuestion};

use crate::error::Result;
use crate::voice::{Listener, Speaker};

pub(crate) const MARKED_YES: &str = "Marked yes";
pub(crate) const MARKED_NO: &str = "Marked no";
pub(crate) const REPEAT_PROMPT: &str = "Repeat please";
pub(crate) const SKIP_NOTICE: &str = "Question skipped";
pub(crate) const COMPLETED_NOTICE: &str = "Checklist completed";

/// Drive one full checklist run against the shared model.
///
/// All answers from previous runs are cleared first. The cancel flag is
/// checked at question boundaries only; a capture already in flight finishes
/// (or times out) before a cancel takes effect.
pub(crate) async fn run_checklist(
    speaker: Arc<dyn Speaker>,
    listener: Arc<dyn Listener>,
    state: watch::Sender<Checklist>,
    cancel: Arc<AtomicBool>,
    policy: RunPolicy,
) -> RunReport {
    state.send_modify(|list| list.reset());

    let sections: Vec<(String, Vec<String>)> = state
        .borrow()
        .sections()
        .iter()
        .map(|s| {
            (
                s.title().to_string(),
                s.items().iter().map(|i| i.question().to_string()).collect(),
            )
        })
        .collect();

    let mut report = RunReport {
        outcome: RunOutcome::Completed,
        answered: 0,
        skipped: Vec::new(),
    };

    for (section_idx, (title, questions)) in sections.iter().enumerate() {
        if cancelled(&cancel) {
            report.outcome = RunOutcome::Cancelled;
            info!(section = %title, "run cancelled");
            return report;
        }
        say(speaker.as_ref(), title).await;

        for (question_idx, question) in questions.iter().enumerate() {
            if cancelled(&cancel) {
                report.outcome = RunOutcome::Cancelled;
                info!(question = %question, "run cancelled");
                return report;
            }

            say(speaker.as_ref(), question).await;

            let mut attempt = 0;
            loop {
                attempt += 1;
                match hear(listener.as_ref()).await {
                    Ok(transcript) => {
                        let decision = classify(&transcript);
                        state.send_modify(|list| {
                            list.set_answer(section_idx, question_idx, Answer::from(decision));
                        });
                        report.answered += 1;
                        info!(
                            question = %question,
                            transcript = %transcript,
                            ?decision,
                            "answer recorded"
                        );
                        say(speaker.as_ref(), confirmation(decision)).await;
                        break;
                    }
                    Err(e) => {
                        warn!(question = %question, attempt, error = %e, "no usable answer");
                        if attempt >= policy.max_attempts {
                            report.skipped.push(SkippedQuestion {
                                section: title.clone(),
                                question: question.clone(),
                            });
                            say(speaker.as_ref(), SKIP_NOTICE).await;
                            break;
                        }
                        say(speaker.as_ref(), REPEAT_PROMPT).await;
                    }
                }
            }
        }
    }

    say(speaker.as_ref(), COMPLETED_NOTICE).await;
    info!(
        answered = report.answered,
        skipped = report.skipped.len(),
        "checklist completed"
    );
    report
}

fn cancelled(cancel: &AtomicBool) -> bool {
    cancel.load(Ordering::Relaxed)
}

/// Speak and keep going. Synthesis failures are logged, not fatal; a silent
/// prompt still falls through to capture, which times out into the normal
/// retry path.
async fn say(speaker: &dyn Speaker, text: &str) {
    if let Err(e) = speaker.speak(text).await {
        warn!(text = %text, error = %e, "synthesis failed");
    }
}

async fn hear(listener: &dyn Listener) -> Result<String> {
    let clip = listener.listen().await?;
    listener.transcribe(clip).await
}

fn confirmation(decision: Decision) -> &'static str {
    match decision {
        Decision::Yes => MARKED_YES,
        Decision::No => MARKED_NO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use rollcall_core::definition::SURGICAL_SAFETY_CHECKLIST;
    use rollcall_core::model::SectionDef;
    use rollcall_core::types::AudioClip;

    use crate::error::Error;

    // ─── Scripted fakes ────────────────────────────────────────────────────

    struct RecordingSpeaker {
        spoken: Mutex<Vec<String>>,
        /// Set the flag when this phrase is spoken.
        trip: Option<(&'static str, Arc<AtomicBool>)>,
    }

    impl RecordingSpeaker {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                spoken: Mutex::new(Vec::new()),
                trip: None,
            })
        }

        fn tripping(phrase: &'static str, flag: Arc<AtomicBool>) -> Arc<Self> {
            Arc::new(Self {
                spoken: Mutex::new(Vec::new()),
                trip: Some((phrase, flag)),
            })
        }

        fn transcript(&self) -> Vec<String> {
            self.spoken.lock().unwrap().clone()
        }

        fn count(&self, phrase: &str) -> usize {
            self.spoken
                .lock()
                .unwrap()
                .iter()
                .filter(|s| *s == phrase)
                .count()
        }
    }

    #[async_trait]
    impl Speaker for RecordingSpeaker {
        async fn speak(&self, text: &str) -> Result<()> {
            self.spoken.lock().unwrap().push(text.to_string());
            if let Some((phrase, flag)) = &self.trip {
                if text == *phrase {
                    flag.store(true, Ordering::Relaxed);
                }
            }
            Ok(())
        }
    }

    struct MuteSpeaker;

    #[async_trait]
    impl Speaker for MuteSpeaker {
        async fn speak(&self, _text: &str) -> Result<()> {
            Err(Error::Synthesis("backend offline".into()))
        }
    }

    enum Reply {
        Say(&'static str),
        Fail,
    }

    struct ScriptedListener {
        script: Mutex<VecDeque<Reply>>,
    }

    impl ScriptedListener {
        fn new(script: Vec<Reply>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
            })
        }
    }

    #[async_trait]
    impl Listener for ScriptedListener {
        async fn listen(&self) -> Result<AudioClip> {
            Ok(AudioClip {
                samples: vec![0; 160],
                sample_rate: 16_000,
            })
        }

        async fn transcribe(&self, _clip: AudioClip) -> Result<String> {
            match self.script.lock().unwrap().pop_front() {
                Some(Reply::Say(text)) => Ok(text.to_string()),
                Some(Reply::Fail) => Err(Error::EmptyTranscript),
                None => Ok("yes".to_string()),
            }
        }
    }

    fn fresh_state(def: &[SectionDef]) -> (watch::Sender<Checklist>, watch::Receiver<Checklist>) {
        watch::channel(Checklist::new(def))
    }

    const TWO_QUESTIONS: &[SectionDef] = &[SectionDef {
        title: "Only Section",
        questions: &["First question?", "Second question?"],
    }];

    const THREE_QUESTIONS: &[SectionDef] = &[SectionDef {
        title: "Only Section",
        questions: &["First?", "Second?", "Third?"],
    }];

    // ─── Tests ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn full_run_marks_every_item_in_order() {
        let total: usize = SURGICAL_SAFETY_CHECKLIST
            .iter()
            .map(|s| s.questions.len())
            .sum();
        let script: Vec<Reply> = (0..total)
            .map(|i| {
                if i % 2 == 0 {
                    Reply::Say("yes")
                } else {
                    Reply::Say("not at this time")
                }
            })
            .collect();

        let speaker = RecordingSpeaker::new();
        let listener = ScriptedListener::new(script);
        let (state, _rx) = fresh_state(SURGICAL_SAFETY_CHECKLIST);

        let report = run_checklist(
            speaker.clone(),
            listener,
            state.clone(),
            Arc::new(AtomicBool::new(false)),
            RunPolicy::default(),
        )
        .await;

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.answered, total);
        assert!(report.skipped.is_empty());

        // Answers land on alternating items, in definition order
        let mut flat_idx = 0;
        for section in state.borrow().status() {
            for q in &section.questions {
                if flat_idx % 2 == 0 {
                    assert!(q.yes && !q.no, "item {flat_idx} should be yes");
                } else {
                    assert!(q.no && !q.yes, "item {flat_idx} should be no");
                }
                flat_idx += 1;
            }
        }
        assert_eq!(flat_idx, total);

        let spoken = speaker.transcript();
        assert_eq!(spoken.first().map(String::as_str), Some("Before Induction of Anaesthesia"));
        assert_eq!(spoken.last().map(String::as_str), Some(COMPLETED_NOTICE));
        assert_eq!(speaker.count(MARKED_YES), total / 2);
        assert_eq!(speaker.count(MARKED_NO), total / 2);
    }

    #[tokio::test]
    async fn recognition_failures_reprompt_then_record() {
        let speaker = RecordingSpeaker::new();
        let listener = ScriptedListener::new(vec![Reply::Fail, Reply::Fail, Reply::Say("yes")]);
        let (state, _rx) = fresh_state(TWO_QUESTIONS);

        let report = run_checklist(
            speaker.clone(),
            listener,
            state.clone(),
            Arc::new(AtomicBool::new(false)),
            RunPolicy { max_attempts: 3 },
        )
        .await;

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.answered, 2);
        assert!(report.skipped.is_empty());
        assert_eq!(state.borrow().answer(0, 0), Answer::Yes);

        // Exactly two re-prompts, both before the first mark
        assert_eq!(speaker.count(REPEAT_PROMPT), 2);
        let spoken = speaker.transcript();
        let first_mark = spoken.iter().position(|s| s == MARKED_YES).unwrap();
        let last_repeat = spoken.iter().rposition(|s| s == REPEAT_PROMPT).unwrap();
        assert!(last_repeat < first_mark);
    }

    #[tokio::test]
    async fn exhausted_attempts_skip_the_question() {
        let speaker = RecordingSpeaker::new();
        let listener = ScriptedListener::new(vec![Reply::Fail, Reply::Fail, Reply::Say("done")]);
        let (state, _rx) = fresh_state(TWO_QUESTIONS);

        let report = run_checklist(
            speaker.clone(),
            listener,
            state.clone(),
            Arc::new(AtomicBool::new(false)),
            RunPolicy { max_attempts: 2 },
        )
        .await;

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.answered, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].question, "First question?");

        // The skipped item stays unanswered; the next one is marked
        assert_eq!(state.borrow().answer(0, 0), Answer::Unanswered);
        assert_eq!(state.borrow().answer(0, 1), Answer::Yes);
        assert_eq!(speaker.count(REPEAT_PROMPT), 1);
        assert_eq!(speaker.count(SKIP_NOTICE), 1);
    }

    #[tokio::test]
    async fn cancel_lands_at_the_next_question_boundary() {
        let flag = Arc::new(AtomicBool::new(false));
        let speaker = RecordingSpeaker::tripping(MARKED_YES, flag.clone());
        let listener = ScriptedListener::new(vec![Reply::Say("yes")]);
        let (state, _rx) = fresh_state(THREE_QUESTIONS);

        let report = run_checklist(
            speaker.clone(),
            listener,
            state.clone(),
            flag,
            RunPolicy::default(),
        )
        .await;

        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert_eq!(report.answered, 1);
        assert_eq!(state.borrow().answer(0, 0), Answer::Yes);
        assert_eq!(state.borrow().answer(0, 1), Answer::Unanswered);

        let spoken = speaker.transcript();
        assert!(!spoken.iter().any(|s| s == "Second?"));
        assert!(!spoken.iter().any(|s| s == COMPLETED_NOTICE));
    }

    #[tokio::test]
    async fn runs_reset_previous_answers() {
        let (state, _rx) = fresh_state(TWO_QUESTIONS);
        state.send_modify(|list| list.set_answer(0, 0, Answer::No));

        // First question is skipped, so only the reset can explain it
        // reading Unanswered afterwards.
        let report = run_checklist(
            RecordingSpeaker::new(),
            ScriptedListener::new(vec![Reply::Fail, Reply::Say("yes")]),
            state.clone(),
            Arc::new(AtomicBool::new(false)),
            RunPolicy { max_attempts: 1 },
        )
        .await;

        assert_eq!(report.answered, 1);
        assert_eq!(state.borrow().answer(0, 0), Answer::Unanswered);
        assert_eq!(state.borrow().answer(0, 1), Answer::Yes);
    }

    #[tokio::test]
    async fn synthesis_failures_do_not_stop_the_run() {
        let listener = ScriptedListener::new(vec![Reply::Say("yes"), Reply::Say("no")]);
        let (state, _rx) = fresh_state(TWO_QUESTIONS);

        let report = run_checklist(
            Arc::new(MuteSpeaker),
            listener,
            state.clone(),
            Arc::new(AtomicBool::new(false)),
            RunPolicy::default(),
        )
        .await;

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.answered, 2);
        assert_eq!(state.borrow().answer(0, 0), Answer::Yes);
        assert_eq!(state.borrow().answer(0, 1), Answer::No);
    }
}
