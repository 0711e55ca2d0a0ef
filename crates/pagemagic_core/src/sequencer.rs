//! Animated replay of a content version.
//!
//! The [`Sequencer`] walks one version through
//! `Idle → Preparing → AnimatingMeta → AnimatingContent → Complete`:
//!
//! | Phase | On entry | Leaves when |
//! |---|---|---|
//! | `Idle` | nothing shown | a version that was never animated is shown |
//! | `Preparing` | diffs computed, scroll request emitted | the settle delay elapses |
//! | `AnimatingMeta` | meta fields revealed one after another | the last meta field finishes |
//! | `AnimatingContent` | body additions revealed in document order | the last addition is shown |
//! | `Complete` | version marked animated, callback fired | another version is shown |
//!
//! Unchanged text is visible as soon as a run starts. Added text appears unit
//! by unit. Removed meta text is struck through for a moment and then
//! dropped; removed body text is never shown.
//!
//! All pacing goes through a [`TickScheduler`] on a virtual clock, and every
//! new run starts a new generation, so ticks from a superseded run can never
//! touch the state of the current one. Call [`Sequencer::advance`] from
//! whatever drives time (a frame loop, a real timer, a test).
//!
//! # Example
//!
//! ```ignore
//! let mut sequencer = Sequencer::new(config.animation.clone());
//! sequencer.show(&history, 2)?;
//! for event in sequencer.run_to_completion() {
//!     println!("{:?}", event);
//! }
//! let html = sequencer.frame().unwrap().to_html(&renderer);
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::{AnimationConfig, RevealUnit};
use crate::diff::{SegmentKind, tokenize};
use crate::error::Result;
use crate::frame::{Frame, Reveal};
use crate::scheduler::{Generation, TickScheduler};
use crate::version::{FieldKey, VersionDiff, VersionHistory};

/// Phase of the replay state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum AnimationPhase {
    /// Nothing to show
    #[default]
    Idle,
    /// Diffs computed, waiting for the settle delay
    Preparing,
    /// Revealing title, meta description and metas
    AnimatingMeta,
    /// Revealing body additions
    AnimatingContent,
    /// Final state shown
    Complete,
}

impl AnimationPhase {
    /// Whether a run is in flight.
    pub fn is_animating(self) -> bool {
        matches!(
            self,
            AnimationPhase::Preparing | AnimationPhase::AnimatingMeta | AnimationPhase::AnimatingContent
        )
    }
}

/// Something the host should react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SequencerEvent {
    /// The state machine moved
    PhaseChanged {
        /// Previous phase
        from: AnimationPhase,
        /// New phase
        to: AnimationPhase,
    },
    /// A new run started; bring the version into view
    ScrollIntoView {
        /// Version being animated
        version: u32,
    },
    /// Added text became visible
    Revealed {
        /// Field that grew
        field: FieldKey,
        /// Text that appeared
        text: String,
    },
    /// Removed meta text is now shown struck through
    Struck {
        /// Field affected
        field: FieldKey,
        /// Struck text
        text: String,
    },
    /// The run finished
    Completed {
        /// History index
        index: usize,
        /// Version number
        version: u32,
    },
}

/// Passed to the completion callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// History index that finished animating
    pub index: usize,
    /// Its version number
    pub version: u32,
}

/// Callback invoked when a run reaches [`AnimationPhase::Complete`].
pub type CompletionCallback = Arc<dyn Fn(&Completion) + Send + Sync>;

#[derive(Debug, Clone, Copy)]
enum Action {
    BeginMeta,
    Reveal { field: usize, segment: usize, end: usize },
    Strike { field: usize, segment: usize },
    Drop { field: usize, segment: usize },
    BeginContent,
    Finish,
}

#[derive(Debug)]
struct Step {
    delay: Duration,
    action: Action,
}

struct Run {
    index: usize,
    diff: VersionDiff,
    progress: Vec<Vec<Reveal>>,
    plan: Vec<Step>,
}

impl Run {
    fn new(index: usize, diff: VersionDiff, plan: Vec<Step>, initial: Reveal) -> Self {
        let progress = diff
            .fields()
            .map(|f| vec![initial; f.segments.len()])
            .collect();
        Self {
            index,
            diff,
            progress,
            plan,
        }
    }

    fn state(&self, field: usize, segment: usize) -> Reveal {
        self.progress
            .get(field)
            .and_then(|p| p.get(segment))
            .copied()
            .unwrap_or(Reveal::Pending)
    }

    fn set_state(&mut self, field: usize, segment: usize, reveal: Reveal) {
        if let Some(slot) = self.progress.get_mut(field).and_then(|p| p.get_mut(segment)) {
            *slot = reveal;
        }
    }

    fn segment_text(&self, field: usize, segment: usize) -> Option<(FieldKey, &str)> {
        let field_diff = self.diff.fields().nth(field)?;
        let value = field_diff.segments.get(segment)?.value.as_str();
        Some((field_diff.field.clone(), value))
    }

    fn frame(&self) -> Frame {
        Frame::project(&self.diff, |f, s| self.state(f, s))
    }
}

/// Replays content versions as a timed reveal.
pub struct Sequencer {
    config: AnimationConfig,
    scheduler: TickScheduler<usize>,
    phase: AnimationPhase,
    run: Option<Run>,
    animated: BTreeSet<usize>,
    events: Vec<SequencerEvent>,
    on_complete: Option<CompletionCallback>,
}

impl std::fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequencer")
            .field("phase", &self.phase)
            .field("index", &self.current_index())
            .field("animated", &self.animated)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

impl Sequencer {
    /// Create an idle sequencer.
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            scheduler: TickScheduler::new(),
            phase: AnimationPhase::Idle,
            run: None,
            animated: BTreeSet::new(),
            events: Vec::new(),
            on_complete: None,
        }
    }

    /// Pacing in use.
    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Register the completion callback, replacing any previous one.
    pub fn on_complete(&mut self, callback: CompletionCallback) {
        self.on_complete = Some(callback);
    }

    /// Current phase.
    pub fn phase(&self) -> AnimationPhase {
        self.phase
    }

    /// Current generation token.
    pub fn generation(&self) -> Generation {
        self.scheduler.generation()
    }

    /// Virtual time.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Time of the next pending tick, if any.
    pub fn next_due(&self) -> Option<Duration> {
        self.scheduler.next_due()
    }

    /// History index being shown.
    pub fn current_index(&self) -> Option<usize> {
        self.run.as_ref().map(|r| r.index)
    }

    /// Whether the version at `index` has finished animating at least once.
    pub fn is_animated(&self, index: usize) -> bool {
        self.animated.contains(&index)
    }

    /// Every index that has finished animating, ascending.
    pub fn animated(&self) -> impl Iterator<Item = usize> + '_ {
        self.animated.iter().copied()
    }

    /// Diff of the version being shown.
    pub fn diff(&self) -> Option<&VersionDiff> {
        self.run.as_ref().map(|r| &r.diff)
    }

    /// Number of added or removed segments whose reveal has finished.
    pub fn completed_segments(&self) -> usize {
        let Some(run) = &self.run else {
            return 0;
        };
        run.diff
            .fields()
            .zip(&run.progress)
            .map(|(field, progress)| {
                field
                    .segments
                    .iter()
                    .zip(progress)
                    .filter(|(seg, state)| seg.kind != SegmentKind::Unchanged && **state == Reveal::Done)
                    .count()
            })
            .sum()
    }

    /// Show the version at `index`.
    ///
    /// Starts a new run unless the version is already animating (no-op), was
    /// animated before, or is its own baseline; those two render their final
    /// state at once without firing the callback.
    pub fn show(&mut self, history: &VersionHistory, index: usize) -> Result<()> {
        if let Some(run) = &self.run
            && run.index == index
            && (self.phase.is_animating() || self.phase == AnimationPhase::Complete)
        {
            log::trace!("Version index {} already shown, ignoring", index);
            return Ok(());
        }

        let diff = history.diff(index, self.config.baseline)?;

        let dropped = self.scheduler.cancel_pending();
        let generation = self.scheduler.begin_generation();
        if dropped > 0 {
            log::debug!("Cancelled {} pending ticks", dropped);
        }
        self.set_phase(AnimationPhase::Idle);

        let baseline_index = self.config.baseline.baseline_index(index);
        if self.animated.contains(&index) || index == baseline_index {
            log::debug!(
                "Showing final state of version {} (index {})",
                diff.version,
                index
            );
            self.run = Some(Run::new(index, diff, Vec::new(), Reveal::Done));
            self.set_phase(AnimationPhase::Complete);
            return Ok(());
        }

        log::debug!(
            "Animating version {} against version {} (generation {})",
            diff.version,
            diff.baseline_version,
            generation.value()
        );
        let plan = build_plan(&self.config, &diff, index);
        let version = diff.version;
        self.run = Some(Run::new(index, diff, plan, Reveal::Pending));
        self.set_phase(AnimationPhase::Preparing);
        self.events.push(SequencerEvent::ScrollIntoView { version });
        self.schedule_step(0);
        Ok(())
    }

    /// Move the clock forward by `elapsed` and apply every tick that came due.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<SequencerEvent> {
        let until = self.scheduler.now() + elapsed;
        self.advance_to(until)
    }

    fn advance_to(&mut self, until: Duration) -> Vec<SequencerEvent> {
        while let Some((_, step)) = self.scheduler.pop_due(until) {
            self.fire(step);
        }
        self.scheduler.settle(until);
        std::mem::take(&mut self.events)
    }

    /// Advance until nothing is left to do.
    pub fn run_to_completion(&mut self) -> Vec<SequencerEvent> {
        let mut events = std::mem::take(&mut self.events);
        while let Some(due) = self.scheduler.next_due() {
            events.extend(self.advance_to(due));
        }
        events
    }

    /// Jump an in-flight run straight to its final state.
    pub fn skip_to_end(&mut self) -> Vec<SequencerEvent> {
        if self.phase.is_animating() {
            self.scheduler.cancel_pending();
            self.scheduler.begin_generation();
            self.finish();
        }
        std::mem::take(&mut self.events)
    }

    /// Abandon the current run and go idle. Animated versions stay animated.
    pub fn cancel(&mut self) {
        self.scheduler.cancel_pending();
        self.scheduler.begin_generation();
        self.run = None;
        self.set_phase(AnimationPhase::Idle);
    }

    /// Events produced since the last call that returned events.
    pub fn take_events(&mut self) -> Vec<SequencerEvent> {
        std::mem::take(&mut self.events)
    }

    /// What is displayed right now.
    pub fn frame(&self) -> Option<Frame> {
        self.run.as_ref().map(Run::frame)
    }

    /// What will be displayed once the current run completes.
    pub fn final_frame(&self) -> Option<Frame> {
        self.run.as_ref().map(|r| Frame::final_for(&r.diff))
    }

    fn set_phase(&mut self, to: AnimationPhase) {
        if self.phase != to {
            log::trace!("Phase {:?} -> {:?}", self.phase, to);
            self.events.push(SequencerEvent::PhaseChanged {
                from: self.phase,
                to,
            });
            self.phase = to;
        }
    }

    fn schedule_step(&mut self, step: usize) {
        if let Some(delay) = self
            .run
            .as_ref()
            .and_then(|r| r.plan.get(step))
            .map(|s| s.delay)
        {
            self.scheduler.schedule(delay, step);
        }
    }

    fn fire(&mut self, step: usize) {
        let Some(action) = self.run.as_ref().and_then(|r| r.plan.get(step)).map(|s| s.action) else {
            return;
        };
        self.apply(action);
        if !matches!(action, Action::Finish) {
            self.schedule_step(step + 1);
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::BeginMeta => self.set_phase(AnimationPhase::AnimatingMeta),
            Action::BeginContent => self.set_phase(AnimationPhase::AnimatingContent),
            Action::Finish => self.finish(),
            Action::Reveal {
                field,
                segment,
                end,
            } => {
                let Some(run) = self.run.as_mut() else {
                    return;
                };
                let start = match run.state(field, segment) {
                    Reveal::Partial(shown) => shown,
                    _ => 0,
                };
                let Some((key, value)) = run.segment_text(field, segment) else {
                    return;
                };
                let text = value.get(start..end).unwrap_or_default().to_string();
                let reveal = if end >= value.len() {
                    Reveal::Done
                } else {
                    Reveal::Partial(end)
                };
                run.set_state(field, segment, reveal);
                self.events.push(SequencerEvent::Revealed { field: key, text });
            }
            Action::Strike { field, segment } => {
                let Some(run) = self.run.as_mut() else {
                    return;
                };
                let Some((key, value)) = run.segment_text(field, segment) else {
                    return;
                };
                let text = value.to_string();
                run.set_state(field, segment, Reveal::Struck);
                self.events.push(SequencerEvent::Struck { field: key, text });
            }
            Action::Drop { field, segment } => {
                if let Some(run) = self.run.as_mut() {
                    run.set_state(field, segment, Reveal::Done);
                }
            }
        }
    }

    fn finish(&mut self) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        for state in run.progress.iter_mut().flatten() {
            *state = Reveal::Done;
        }
        let completion = Completion {
            index: run.index,
            version: run.diff.version,
        };

        self.animated.insert(completion.index);
        self.set_phase(AnimationPhase::Complete);
        self.events.push(SequencerEvent::Completed {
            index: completion.index,
            version: completion.version,
        });
        log::debug!("Version {} animated", completion.version);

        if let Some(callback) = &self.on_complete {
            callback(&completion);
        }
    }
}

/// Byte offsets at which each reveal unit of `text` ends.
fn unit_ends(text: &str, unit: RevealUnit) -> Vec<usize> {
    if text.is_empty() {
        return Vec::new();
    }
    match unit {
        RevealUnit::Character => text.char_indices().map(|(i, c)| i + c.len_utf8()).collect(),
        RevealUnit::Word => {
            let mut end = 0;
            tokenize(text)
                .into_iter()
                .map(|token| {
                    end += token.len();
                    end
                })
                .collect()
        }
        RevealUnit::Segment => vec![text.len()],
    }
}

fn unit_delay(config: &AnimationConfig, unit: RevealUnit, tick: Duration, rng: &mut StdRng) -> Duration {
    match unit {
        RevealUnit::Segment => {
            let (min, max) = config.segment_delay_range_ms();
            Duration::from_millis(rng.gen_range(min..=max))
        }
        RevealUnit::Character | RevealUnit::Word => tick,
    }
}

fn build_plan(config: &AnimationConfig, diff: &VersionDiff, index: usize) -> Vec<Step> {
    // Seeded per index so a version always replays with the same rhythm
    let mut rng = StdRng::seed_from_u64(config.seed ^ index as u64);
    let mut plan = vec![Step {
        delay: config.settle_delay(),
        action: Action::BeginMeta,
    }];

    for (field, field_diff) in diff.meta.iter().enumerate() {
        for (segment, seg) in field_diff.segments.iter().enumerate() {
            match seg.kind {
                SegmentKind::Unchanged => {}
                SegmentKind::Added => {
                    for end in unit_ends(&seg.value, config.meta_unit) {
                        plan.push(Step {
                            delay: unit_delay(config, config.meta_unit, config.meta_tick(), &mut rng),
                            action: Action::Reveal {
                                field,
                                segment,
                                end,
                            },
                        });
                    }
                }
                SegmentKind::Removed => {
                    plan.push(Step {
                        delay: Duration::ZERO,
                        action: Action::Strike { field, segment },
                    });
                    plan.push(Step {
                        delay: config.strike_hold(),
                        action: Action::Drop { field, segment },
                    });
                }
            }
        }
    }

    plan.push(Step {
        delay: Duration::ZERO,
        action: Action::BeginContent,
    });

    let body = diff.meta.len();
    for (segment, seg) in diff.body.segments.iter().enumerate() {
        if seg.kind != SegmentKind::Added {
            continue;
        }
        for end in unit_ends(&seg.value, config.content_unit) {
            plan.push(Step {
                delay: unit_delay(config, config.content_unit, config.content_tick(), &mut rng),
                action: Action::Reveal {
                    field: body,
                    segment,
                    end,
                },
            });
        }
    }

    plan.push(Step {
        delay: Duration::ZERO,
        action: Action::Finish,
    });
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PageMagicError;
    use crate::frame::SpanKind;
    use crate::test_utils::{counting_callback, sample_history};
    use std::sync::atomic::Ordering;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn phases(events: &[SequencerEvent]) -> Vec<AnimationPhase> {
        events
            .iter()
            .filter_map(|e| match e {
                SequencerEvent::PhaseChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_full_run_reaches_final_frame() {
        let history = sample_history();
        let mut sequencer = Sequencer::new(AnimationConfig::default());
        let (callback, count) = counting_callback();
        sequencer.on_complete(callback);

        sequencer.show(&history, 1).unwrap();
        assert_eq!(sequencer.phase(), AnimationPhase::Preparing);

        // Unchanged text is visible before any tick fires
        let frame = sequencer.frame().unwrap();
        let body = frame.body().unwrap();
        assert!(body.spans.iter().all(|s| s.kind == SpanKind::Unchanged));
        assert_eq!(body.text(), "The cat sat.");

        let events = sequencer.run_to_completion();
        assert!(events.contains(&SequencerEvent::ScrollIntoView { version: 1 }));
        assert_eq!(
            phases(&events),
            vec![
                AnimationPhase::Preparing,
                AnimationPhase::AnimatingMeta,
                AnimationPhase::AnimatingContent,
                AnimationPhase::Complete,
            ]
        );
        assert_eq!(sequencer.phase(), AnimationPhase::Complete);
        assert!(sequencer.is_animated(1));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let expected = Frame::final_for(&history.diff(1, Default::default()).unwrap());
        assert_eq!(sequencer.frame(), Some(expected.clone()));
        assert_eq!(sequencer.final_frame(), Some(expected));
    }

    #[test]
    fn test_settle_delay_holds_preparing() {
        let history = sample_history();
        let mut sequencer = Sequencer::new(AnimationConfig::default());
        sequencer.show(&history, 1).unwrap();
        sequencer.take_events();

        assert!(sequencer.advance(ms(299)).is_empty());
        assert_eq!(sequencer.phase(), AnimationPhase::Preparing);

        let events = sequencer.advance(ms(1));
        assert_eq!(phases(&events), vec![AnimationPhase::AnimatingMeta]);
    }

    #[test]
    fn test_meta_reveals_precede_body_in_document_order() {
        let history = sample_history();
        let config = AnimationConfig {
            content_unit: RevealUnit::Word,
            ..AnimationConfig::default()
        };
        let mut sequencer = Sequencer::new(config);
        sequencer.show(&history, 1).unwrap();

        let revealed: Vec<(FieldKey, String)> = sequencer
            .run_to_completion()
            .into_iter()
            .filter_map(|e| match e {
                SequencerEvent::Revealed { field, text } => Some((field, text)),
                _ => None,
            })
            .collect();

        let first_body = revealed
            .iter()
            .position(|(f, _)| *f == FieldKey::Body)
            .unwrap();
        assert!(revealed[..first_body].iter().all(|(f, _)| f.is_meta()));
        assert!(revealed[first_body..].iter().all(|(f, _)| *f == FieldKey::Body));

        let body_text: String = revealed[first_body..].iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(body_text, "black  on the mat");
    }

    #[test]
    fn test_removed_meta_is_struck_then_dropped() {
        let history = sample_history();
        let mut sequencer = Sequencer::new(AnimationConfig::default());
        sequencer.show(&history, 1).unwrap();

        let mut saw_struck = false;
        while sequencer.phase() != AnimationPhase::Complete {
            for event in sequencer.advance(ms(10)) {
                if let SequencerEvent::Struck { field, text } = event {
                    assert_eq!(field, FieldKey::MetaDescription);
                    assert_eq!(text, "Shoes for cats");
                    let frame = sequencer.frame().unwrap();
                    assert!(frame.has_struck());
                    saw_struck = true;
                }
            }
        }
        assert!(saw_struck);

        let frame = sequencer.frame().unwrap();
        assert!(!frame.has_struck());
        assert!(frame.field(&FieldKey::MetaDescription).is_none());
    }

    #[test]
    fn test_revisit_animated_version_is_instant() {
        let history = sample_history();
        let mut sequencer = Sequencer::new(AnimationConfig::default());
        let (callback, count) = counting_callback();
        sequencer.on_complete(callback);

        sequencer.show(&history, 2).unwrap();
        sequencer.run_to_completion();
        sequencer.show(&history, 1).unwrap();
        assert_eq!(sequencer.phase(), AnimationPhase::Preparing);
        sequencer.take_events();

        sequencer.show(&history, 2).unwrap();
        assert_eq!(sequencer.phase(), AnimationPhase::Complete);
        assert_eq!(sequencer.next_due(), None);
        let events = sequencer.take_events();
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, SequencerEvent::ScrollIntoView { .. }))
        );
        assert_eq!(sequencer.frame(), sequencer.final_frame());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_showing_baseline_is_instant_without_callback() {
        let history = sample_history();
        let mut sequencer = Sequencer::new(AnimationConfig::default());
        let (callback, count) = counting_callback();
        sequencer.on_complete(callback);

        sequencer.show(&history, 0).unwrap();
        assert_eq!(sequencer.phase(), AnimationPhase::Complete);
        assert!(!sequencer.is_animated(0));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(
            sequencer.frame().unwrap().body().unwrap().text(),
            "The cat sat."
        );
    }

    #[test]
    fn test_reshowing_running_version_is_noop() {
        let history = sample_history();
        let mut sequencer = Sequencer::new(AnimationConfig::default());
        sequencer.show(&history, 1).unwrap();
        sequencer.advance(ms(350));
        let generation = sequencer.generation();
        let frame = sequencer.frame();

        sequencer.show(&history, 1).unwrap();
        assert_eq!(sequencer.generation(), generation);
        assert_eq!(sequencer.frame(), frame);
    }

    #[test]
    fn test_restart_never_shows_cancelled_spans() {
        let history = sample_history();
        let config = AnimationConfig {
            content_unit: RevealUnit::Character,
            ..AnimationConfig::default()
        };
        let mut sequencer = Sequencer::new(config);
        sequencer.show(&history, 1).unwrap();
        sequencer.advance(ms(1_000));
        assert!(sequencer.completed_segments() > 0);
        let before = sequencer.generation();

        sequencer.show(&history, 2).unwrap();
        assert!(sequencer.generation() > before);
        let frame = sequencer.frame().unwrap();
        assert!(
            frame
                .fields
                .iter()
                .flat_map(|f| &f.spans)
                .all(|s| s.kind == SpanKind::Unchanged)
        );

        sequencer.run_to_completion();
        assert_eq!(sequencer.frame(), sequencer.final_frame());
        assert!(!sequencer.is_animated(1));
        assert!(sequencer.is_animated(2));
    }

    #[test]
    fn test_segment_jitter_is_seeded_and_bounded() {
        let history = sample_history();
        let finish_time = |seed: u64| {
            let mut sequencer = Sequencer::new(AnimationConfig {
                seed,
                ..AnimationConfig::default()
            });
            sequencer.show(&history, 1).unwrap();
            sequencer.run_to_completion();
            sequencer.now()
        };

        assert_eq!(finish_time(7), finish_time(7));

        // Settle, title characters and strike hold, then two body segments jittered in [80, 240]
        let config = AnimationConfig::default();
        let total = finish_time(7);
        assert!(total >= config.settle_delay() + ms(80 * 2));
        assert!(total <= config.settle_delay() + ms(240 * 2) + ms(50 * 8) + config.strike_hold());
    }

    #[test]
    fn test_skip_to_end_completes() {
        let history = sample_history();
        let mut sequencer = Sequencer::new(AnimationConfig::default());
        let (callback, count) = counting_callback();
        sequencer.on_complete(callback);

        sequencer.show(&history, 1).unwrap();
        sequencer.advance(ms(320));
        let events = sequencer.skip_to_end();
        assert!(events.contains(&SequencerEvent::Completed {
            index: 1,
            version: 1,
        }));
        assert_eq!(sequencer.frame(), sequencer.final_frame());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(sequencer.next_due(), None);
    }

    #[test]
    fn test_cancel_goes_idle() {
        let history = sample_history();
        let mut sequencer = Sequencer::new(AnimationConfig::default());
        sequencer.show(&history, 1).unwrap();
        sequencer.cancel();
        assert_eq!(sequencer.phase(), AnimationPhase::Idle);
        assert!(sequencer.frame().is_none());
        assert_eq!(sequencer.next_due(), None);
    }

    #[test]
    fn test_unknown_index_is_error() {
        let history = sample_history();
        let mut sequencer = Sequencer::new(AnimationConfig::default());
        let err = sequencer.show(&history, 9).unwrap_err();
        assert!(matches!(err, PageMagicError::VersionNotFound(9)));
        assert_eq!(sequencer.phase(), AnimationPhase::Idle);
    }

    #[test]
    fn test_unit_ends() {
        assert_eq!(unit_ends("héllo", RevealUnit::Character), vec![1, 3, 4, 5, 6]);
        assert_eq!(unit_ends("on the mat", RevealUnit::Word), vec![2, 3, 6, 7, 10]);
        assert_eq!(unit_ends("on the mat", RevealUnit::Segment), vec![10]);
        assert!(unit_ends("", RevealUnit::Segment).is_empty());
    }
}
