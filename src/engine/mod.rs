//! The engine splits in two at construction time.
//!
//! [`SynthEngine`] is the control handle: it owns the authoritative
//! [`Settings`], builds voices and reverb kernels, and sends them across a
//! lock-free ring. [`EngineRenderer`] is the render half: it is moved into the
//! audio callback and only ever drains that ring, renders and hands spent
//! boxes back.
//!
//! ```text
//!   control thread                         audio thread
//!   ──────────────                         ────────────
//!   SynthEngine ── SynthMessage ring ───→  EngineRenderer
//!        ↑                                   │ PolyphonyManager
//!        └──────── RenderNotice ring ─────── │ Scheduler
//!                  (retired voices,          │ MasterBus
//!                   spent kernels)           ↓
//!                                          output
//! ```

pub mod master;
pub mod scheduler;

use rand::{rngs::SmallRng, SeedableRng};
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{debug, info, trace, warn};

use self::{
    master::MasterBus,
    scheduler::{Deadline, DeadlineKind, Scheduler},
};
use crate::{
    config::EngineConfig,
    dsp::reverb::{ConvolutionKernel, ImpulseResponse},
    error::{EngineError, Result},
    patch::{
        param::{self, ParamScope},
        presets, ParamValue, Settings,
    },
    synth::{
        factory::{GraphFactory, VoiceFactory},
        message::{MessageReceiver, NoticeSink, RenderNotice, RetireReason, SynthMessage},
        note::NoteId,
        poly::PolyphonyManager,
        voice::Voice,
    },
    MAX_BLOCK_SIZE,
};

/// Control handle. All entry points are cheap apart from note starts and
/// room-size changes, which build graphs and reverb kernels.
pub struct SynthEngine {
    config: EngineConfig,
    settings: Settings,
    tx: Producer<SynthMessage>,
    notices: Consumer<RenderNotice>,
    factory: GraphFactory,
    impulse_rng: SmallRng,
    next_voice_id: u64,
}

impl SynthEngine {
    /// Build an engine and its renderer. The renderer goes to the audio
    /// callback; the engine stays with the caller.
    pub fn new(config: EngineConfig) -> Result<(SynthEngine, EngineRenderer)> {
        config.validate()?;

        let settings = Settings::default();
        let (tx, rx) = RingBuffer::new(config.command_capacity);
        let (notice_tx, notices) =
            RingBuffer::new(config.command_capacity + 2 * config.max_voices);

        let impulse_rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(1)),
            None => SmallRng::from_entropy(),
        };

        let mut engine = SynthEngine {
            factory: GraphFactory::new(&config),
            config,
            settings,
            tx,
            notices,
            impulse_rng,
            next_voice_id: 0,
        };

        let kernel = engine.build_kernel(settings.reverb.room_size);
        let renderer = EngineRenderer {
            rx,
            notices: notice_tx,
            poly: PolyphonyManager::new(engine.config.max_voices),
            scheduler: Scheduler::new(2 * engine.config.max_voices),
            master: MasterBus::new(&settings, kernel, engine.config.sample_rate),
            now: 0,
            sample_rate: engine.config.sample_rate,
            release_margin: engine.config.release_margin,
            watchdog_frames: engine.config.frames(engine.config.watchdog_seconds),
            scratch_left: vec![0.0; MAX_BLOCK_SIZE],
            scratch_right: vec![0.0; MAX_BLOCK_SIZE],
        };

        info!(
            sample_rate = engine.config.sample_rate,
            max_voices = engine.config.max_voices,
            "synth engine ready"
        );
        Ok((engine, renderer))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current settings snapshot.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn build_kernel(&mut self, room_size: f32) -> Box<ConvolutionKernel> {
        let ir =
            ImpulseResponse::for_room(room_size, self.config.sample_rate, &mut self.impulse_rng);
        debug!(
            room_size,
            seconds = ir.duration(),
            decay = ir.decay(),
            "impulse response generated"
        );
        Box::new(ConvolutionKernel::new(&ir, self.config.reverb_partition))
    }

    fn send(&mut self, message: SynthMessage) -> Result<()> {
        self.tx.push(message).map_err(|_| EngineError::QueueFull)
    }

    fn ensure_slots(&self, needed: usize) -> Result<()> {
        if self.tx.slots() < needed {
            return Err(EngineError::QueueFull);
        }
        Ok(())
    }

    /// Start (or restart) a voice for `note` at `frequency` Hz.
    ///
    /// A voice already sounding for the same label is cut off immediately,
    /// without a release. Call [`stop_note`](Self::stop_note) first to avoid
    /// the click.
    pub fn play_note(&mut self, frequency: f32, note: &str) -> Result<()> {
        let note: NoteId = note.parse()?;
        self.start_voice(note, frequency)
    }

    /// Start a voice at the note's equal-tempered pitch.
    pub fn play(&mut self, note: NoteId) -> Result<()> {
        self.start_voice(note, note.frequency())
    }

    fn start_voice(&mut self, note: NoteId, frequency: f32) -> Result<()> {
        self.collect();
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(EngineError::InvalidValue {
                path: "frequency".into(),
                value: frequency.to_string(),
            });
        }
        self.ensure_slots(1)?;

        let graph = self.factory.create_voice(&self.settings, frequency);
        let id = self.next_voice_id;
        self.next_voice_id += 1;

        let voice = Voice::new(id, note, frequency, graph, self.config.sample_rate);
        debug!(%note, frequency, voice = id, "note on");
        self.send(SynthMessage::Start(Box::new(voice)))
    }

    /// Release `note`. A note that isn't sounding is ignored, and so is a
    /// label that names no note at all, since nothing can be sounding under it.
    pub fn stop_note(&mut self, note: &str) -> Result<()> {
        match note.parse::<NoteId>() {
            Ok(note) => self.stop(note),
            Err(_) => {
                trace!(note, "stop for unparsable note ignored");
                Ok(())
            }
        }
    }

    pub fn stop(&mut self, note: NoteId) -> Result<()> {
        self.collect();
        debug!(%note, "note off");
        self.send(SynthMessage::Stop(note))
    }

    /// Release every sounding voice.
    pub fn stop_all_notes(&mut self) -> Result<()> {
        self.collect();
        self.send(SynthMessage::StopAll)
    }

    /// Change one setting by path, e.g. `("filter.cutoff", 800.0)` or
    /// `("osc1.waveform", "square")`.
    ///
    /// Oscillator, noise, envelope and FM changes apply to notes started
    /// afterwards. Bus changes reach the renderer on its next block.
    pub fn set_parameter<'a>(
        &mut self,
        path: &str,
        value: impl Into<ParamValue<'a>>,
    ) -> Result<()> {
        self.collect();

        let mut next = self.settings;
        let scope = param::apply(&mut next, path, value.into())?;

        match scope {
            ParamScope::Voice => {}
            ParamScope::Bus => {
                self.ensure_slots(1)?;
                self.send(SynthMessage::Settings(next))?;
            }
            ParamScope::Room => {
                self.ensure_slots(2)?;
                let kernel = self.build_kernel(next.reverb.room_size);
                self.send(SynthMessage::Settings(next))?;
                self.send(SynthMessage::ReverbKernel(kernel))?;
            }
        }

        self.settings = next;
        Ok(())
    }

    /// Replace the whole settings snapshot. Every note is released first so
    /// a topology change (filter type, FM routing) can't glitch a sounding
    /// voice.
    pub fn load_preset(&mut self, mut settings: Settings) -> Result<()> {
        self.collect();
        param::sanitize(&mut settings);

        let new_room = settings.reverb.room_size != self.settings.reverb.room_size;
        self.ensure_slots(if new_room { 3 } else { 2 })?;

        self.send(SynthMessage::StopAll)?;
        self.send(SynthMessage::Settings(settings))?;
        if new_room {
            let kernel = self.build_kernel(settings.reverb.room_size);
            self.send(SynthMessage::ReverbKernel(kernel))?;
        }

        self.settings = settings;
        Ok(())
    }

    /// Load one of the built-in presets by name.
    pub fn load_factory_preset(&mut self, name: &str) -> Result<()> {
        let settings = presets::by_name(name).ok_or_else(|| EngineError::InvalidValue {
            path: "preset".into(),
            value: name.to_string(),
        })?;
        info!(preset = name, "loading factory preset");
        self.load_preset(settings)
    }

    /// Drain notices from the renderer: log them and free what they carry.
    /// Every control call does this first; call it directly when idle.
    ///
    /// Returns how many notices were handled.
    pub fn collect(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(notice) = self.notices.pop() {
            handled += 1;
            match notice {
                RenderNotice::Retired {
                    note,
                    reason,
                    voice,
                } => match reason {
                    RetireReason::Watchdog => {
                        warn!(%note, voice = voice.id(), "force stopping stuck note")
                    }
                    RetireReason::Fault => {
                        warn!(%note, voice = voice.id(), "voice produced non-finite output, silenced")
                    }
                    RetireReason::Stolen => debug!(%note, voice = voice.id(), "voice stolen"),
                    RetireReason::Retrigger | RetireReason::Teardown => {
                        debug!(%note, voice = voice.id(), ?reason, "voice retired")
                    }
                },
                RenderNotice::Kernel(_) => debug!("reverb kernel released"),
            }
        }
        handled
    }
}

/// Render half. Lives in the audio callback; never allocates, locks or logs.
pub struct EngineRenderer {
    rx: Consumer<SynthMessage>,
    notices: Producer<RenderNotice>,
    poly: PolyphonyManager,
    scheduler: Scheduler,
    master: MasterBus,
    now: u64,
    sample_rate: f32,
    release_margin: f32,
    watchdog_frames: u64,
    scratch_left: Vec<f32>,
    scratch_right: Vec<f32>,
}

impl EngineRenderer {
    /// Frames rendered so far.
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn voices(&self) -> &PolyphonyManager {
        &self.poly
    }

    /// Number of pending teardown and watchdog deadlines.
    pub fn pending_deadlines(&self) -> usize {
        self.scheduler.len()
    }

    fn frames(&self, seconds: f32) -> u64 {
        (seconds.max(0.0) as f64 * self.sample_rate as f64).round() as u64
    }

    fn drain_commands(&mut self) {
        while let Some(message) = MessageReceiver::pop(&mut self.rx) {
            match message {
                SynthMessage::Start(voice) => {
                    let id = voice.id();
                    if let Some(displaced) = self.poly.start(voice, self.now, &mut self.notices) {
                        self.scheduler.cancel_voice(displaced);
                    }
                    let queued = self.scheduler.enqueue(Deadline {
                        at: self.now + self.watchdog_frames,
                        voice: id,
                        kind: DeadlineKind::Watchdog,
                    });
                    debug_assert!(queued, "deadline queue sized for every voice");
                }
                SynthMessage::Stop(note) => {
                    if let Some((id, release)) = self.poly.release(note) {
                        self.schedule_teardown(id, release);
                    }
                }
                SynthMessage::StopAll => {
                    let now = self.now;
                    let margin = self.release_margin;
                    let sample_rate = self.sample_rate as f64;
                    let scheduler = &mut self.scheduler;
                    self.poly.release_all(|id, release| {
                        let frames = ((release + margin) as f64 * sample_rate).round() as u64;
                        let teardown = Deadline {
                            at: now + frames,
                            voice: id,
                            kind: DeadlineKind::Teardown,
                        };
                        let queued = scheduler.supersede(teardown, DeadlineKind::Watchdog);
                        debug_assert!(queued, "deadline queue sized for every voice");
                    });
                }
                SynthMessage::Settings(settings) => self.master.apply_settings(&settings),
                SynthMessage::ReverbKernel(kernel) => {
                    if let Some(spent) = self.master.replace_kernel(kernel) {
                        self.notices.notify(RenderNotice::Kernel(spent));
                    }
                }
            }
        }
    }

    fn schedule_teardown(&mut self, id: u64, release: f32) {
        let at = self.now + self.frames(release + self.release_margin);
        let teardown = Deadline {
            at,
            voice: id,
            kind: DeadlineKind::Teardown,
        };
        // on failure the watchdog stays and retires the voice instead
        let queued = self.scheduler.supersede(teardown, DeadlineKind::Watchdog);
        debug_assert!(queued, "deadline queue sized for every voice");
    }

    fn fire_deadlines(&mut self) {
        while let Some(deadline) = self.scheduler.pop_due(self.now) {
            let reason = match deadline.kind {
                DeadlineKind::Teardown => RetireReason::Teardown,
                DeadlineKind::Watchdog => RetireReason::Watchdog,
            };
            self.poly.retire_id(deadline.voice, reason, &mut self.notices);
        }
    }

    fn render_chunk(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.drain_commands();
        self.fire_deadlines();

        let faults = self.poly.render(left, right, &mut self.notices);
        if faults > 0 {
            let poly = &self.poly;
            self.scheduler.retain_voices(|id| poly.contains_id(id));
        }

        self.master.process(left, right);
        if let Some(spent) = self.master.take_retired_kernel() {
            self.notices.notify(RenderNotice::Kernel(spent));
        }

        self.now += left.len() as u64;
    }

    /// Render into a pair of channel buffers, overwriting them.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        let mut offset = 0;
        while offset < frames {
            let end = (offset + MAX_BLOCK_SIZE).min(frames);
            self.render_chunk(&mut left[offset..end], &mut right[offset..end]);
            offset = end;
        }
    }

    /// Render into an interleaved buffer with `channels` channels, as handed
    /// out by host audio callbacks. Mono gets the average of both sides;
    /// channels past the second are silent.
    pub fn render_interleaved(&mut self, out: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }

        let mut left = std::mem::take(&mut self.scratch_left);
        let mut right = std::mem::take(&mut self.scratch_right);

        for block in out.chunks_mut(MAX_BLOCK_SIZE * channels) {
            let frames = block.len() / channels;
            let (l, r) = (&mut left[..frames], &mut right[..frames]);
            self.render_chunk(l, r);

            for (i, frame) in block.chunks_exact_mut(channels).enumerate() {
                if channels == 1 {
                    frame[0] = 0.5 * (l[i] + r[i]);
                } else {
                    frame[0] = l[i];
                    frame[1] = r[i];
                    frame[2..].fill(0.0);
                }
            }
        }

        self.scratch_left = left;
        self.scratch_right = right;
    }
}
