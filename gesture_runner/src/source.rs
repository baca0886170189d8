//! Landmark sources: where each frame's keypoints come from.
//!
//! Every source answers one question per rendered frame, "what is the newest
//! snapshot?", and never blocks.  Live sources run their device or helper
//! process on a background thread and push frames over an `mpsc` channel; the
//! frame loop drains the channel and keeps the newest.
//!
//! ```text
//! helper process ──stdout──► reader thread ──mpsc──► LandmarkFeed::poll ──► Frame
//! LeapC device   ──poll────► device thread ──mpsc──┘
//! ```

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use gesture_engine::{Frame, FrameMessage, Unavailable};

use crate::error::AppError;

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait
// ════════════════════════════════════════════════════════════════════════════

pub trait LandmarkSource {
    /// Newest frame.  Failures are values, never panics.
    fn next_frame(&mut self) -> Frame;

    /// Short name for the status line and logs.
    fn name(&self) -> &str;
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkFeed: the receiving end of a background source
// ════════════════════════════════════════════════════════════════════════════

/// Producer half of a feed.  `send` fails once the feed is dropped, and
/// `is_stopped` lets a polling loop notice that without sending anything.
pub struct FeedSender {
    tx:   Sender<Frame>,
    stop: Arc<AtomicBool>,
}

impl FeedSender {
    /// `false` when nobody is listening any more.
    pub fn send(&self, frame: Frame) -> bool {
        !self.is_stopped() && self.tx.send(frame).is_ok()
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

/// Keeps the newest frame a background thread has sent.  Until the first
/// frame arrives, and after the sender hangs up, the camera counts as
/// unavailable.  Dropping the feed tells its producer to stop.
pub struct LandmarkFeed {
    rx:     Receiver<Frame>,
    latest: Frame,
    closed: bool,
    stop:   Arc<AtomicBool>,
}

impl LandmarkFeed {
    fn channel() -> (FeedSender, LandmarkFeed) {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let feed = LandmarkFeed {
            rx,
            latest: Err(Unavailable::CameraUnavailable),
            closed: false,
            stop:   stop.clone(),
        };
        (FeedSender { tx, stop }, feed)
    }

    /// Drain everything queued and return the newest frame.
    pub fn poll(&mut self) -> Frame {
        loop {
            match self.rx.try_recv() {
                Ok(frame) => self.latest = frame,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.closed {
                        log::warn!("landmark feed closed; falling back to keyboard");
                        self.closed = true;
                    }
                    self.latest = Err(Unavailable::CameraUnavailable);
                    break;
                }
            }
        }
        self.latest.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for LandmarkFeed {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// Run `producer` on its own thread and return the feed it writes to.
pub fn spawn_feed<F>(name: &str, producer: F) -> io::Result<LandmarkFeed>
where
    F: FnOnce(FeedSender) + Send + 'static,
{
    let (tx, feed) = LandmarkFeed::channel();
    thread::Builder::new()
        .name(format!("landmarks-{name}"))
        .spawn(move || producer(tx))?;
    Ok(feed)
}

// ════════════════════════════════════════════════════════════════════════════
// JsonLinesSource: external helper process
// ════════════════════════════════════════════════════════════════════════════

/// Decode one protocol line.  Anything unparseable is an unreadable frame.
pub fn parse_line(line: &str) -> Frame {
    match serde_json::from_str::<FrameMessage>(line) {
        Ok(msg) => msg.into_frame(),
        Err(e) => {
            log::debug!("bad landmark line: {e}");
            Err(Unavailable::FrameUnreadable)
        }
    }
}

/// Landmarks from a helper process that prints one JSON frame per line.
pub struct JsonLinesSource {
    command: String,
    child:   Child,
    feed:    LandmarkFeed,
}

impl JsonLinesSource {
    /// Spawn `command` (split on whitespace, no shell) and start reading it.
    pub fn spawn(command: &str) -> Result<Self, AppError> {
        let source_err = |source: io::Error| AppError::Source { command: command.to_string(), source };
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| source_err(io::Error::new(io::ErrorKind::InvalidInput, "empty command")))?;

        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(source_err)?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| source_err(io::Error::new(io::ErrorKind::BrokenPipe, "no stdout")))?;

        let feed = spawn_feed("json", move |tx| {
            for line in BufReader::new(stdout).lines() {
                let frame = match line {
                    Ok(line) if line.trim().is_empty() => continue,
                    Ok(line) => parse_line(&line),
                    Err(e) => {
                        log::warn!("landmark helper read failed: {e}");
                        break;
                    }
                };
                if !tx.send(frame) {
                    return;
                }
            }
            log::info!("landmark helper stream ended");
        })
        .map_err(source_err)?;

        log::info!("landmark helper started: {command} (pid {})", child.id());
        Ok(JsonLinesSource { command: command.to_string(), child, feed })
    }
}

impl LandmarkSource for JsonLinesSource {
    fn next_frame(&mut self) -> Frame {
        self.feed.poll()
    }

    fn name(&self) -> &str {
        &self.command
    }
}

impl Drop for JsonLinesSource {
    fn drop(&mut self) {
        if let Err(e) = self.child.kill() {
            log::debug!("landmark helper already gone: {e}");
        }
        let _ = self.child.wait();
        log::info!("landmark helper stopped");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// NullSource and ScriptedSource
// ════════════════════════════════════════════════════════════════════════════

/// No camera at all: keyboard-only play.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSource;

impl LandmarkSource for NullSource {
    fn next_frame(&mut self) -> Frame {
        Err(Unavailable::CameraUnavailable)
    }

    fn name(&self) -> &str {
        "keyboard"
    }
}

/// Replays a fixed list of frames, then reports no landmarks.
#[derive(Clone, Debug, Default)]
pub struct ScriptedSource {
    frames: VecDeque<Frame>,
}

impl ScriptedSource {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        ScriptedSource { frames: frames.into_iter().collect() }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkSource for ScriptedSource {
    fn next_frame(&mut self) -> Frame {
        self.frames.pop_front().unwrap_or(Err(Unavailable::NoLandmarks))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapLandmarkSource: LeapMotion hands (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Hand landmarks from a LeapMotion controller, reshaped into the 21-point
/// hand topology in normalised image coordinates.
#[cfg(feature = "leap")]
pub struct LeapLandmarkSource {
    feed: LandmarkFeed,
}

#[cfg(feature = "leap")]
impl LeapLandmarkSource {
    pub fn start() -> Result<Self, AppError> {
        let feed = spawn_feed("leap", leap::run)
            .map_err(|source| AppError::Source { command: "leapc".to_string(), source })?;
        Ok(LeapLandmarkSource { feed })
    }
}

#[cfg(feature = "leap")]
impl LandmarkSource for LeapLandmarkSource {
    fn next_frame(&mut self) -> Frame {
        self.feed.poll()
    }

    fn name(&self) -> &str {
        "leap"
    }
}

#[cfg(feature = "leap")]
mod leap {
    use gesture_engine::{HandSnapshot, Handedness, Landmark, LandmarkSnapshot, Unavailable};
    use leaprs::*;

    use super::FeedSender;

    // Interaction box above the device, millimetres.
    const X_HALF_RANGE: f32 = 200.0;
    const Y_MIN:        f32 = 50.0;
    const Y_RANGE:      f32 = 450.0;

    pub fn run(tx: FeedSender) {
        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("LeapC connection failed: {e:?}");
                tx.send(Err(Unavailable::CameraUnavailable));
                return;
            }
        };
        if let Err(e) = connection.open() {
            log::warn!("LeapMotion device failed to open: {e:?}");
            tx.send(Err(Unavailable::CameraUnavailable));
            return;
        }
        log::info!("LeapMotion hand source started");

        // Poll times out every 100 ms, so a dropped feed is noticed even
        // when no tracking events arrive.
        while !tx.is_stopped() {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };
            if let Event::Tracking(frame) = msg.event() {
                let hands: Vec<HandSnapshot> = frame.hands().map(|h| snapshot(&h)).collect();
                let out = if hands.is_empty() {
                    Err(Unavailable::NoLandmarks)
                } else {
                    Ok(LandmarkSnapshot { pose: None, hands })
                };
                if !tx.send(out) {
                    break;
                }
            }
        }
        log::info!("LeapMotion hand source stopped");
    }

    /// Millimetres above the device to mirrored image coordinates.
    fn normalise(mm_x: f32, mm_y: f32) -> Landmark {
        let x = 0.5 + mm_x / (2.0 * X_HALF_RANGE);
        let y = 1.0 - (mm_y - Y_MIN) / Y_RANGE;
        Landmark::new(x.clamp(0.0, 1.0), y.clamp(0.0, 1.0), 1.0)
    }

    fn snapshot(hand: &Hand) -> HandSnapshot {
        let handedness = if hand.hand_type() == HandType::Left {
            Handedness::Left
        } else {
            Handedness::Right
        };
        let digits: Vec<_> = hand.digits().collect();
        let mut points = Vec::with_capacity(21);
        // Wrist: base of the middle metacarpal.
        let wrist = match digits.get(2) {
            Some(d) => d.metacarpal().prev_joint(),
            None    => hand.palm().position(),
        };
        points.push(normalise(wrist.x, wrist.y));
        for d in &digits {
            for joint in [
                d.metacarpal().next_joint(),
                d.proximal().next_joint(),
                d.intermediate().next_joint(),
                d.distal().next_joint(),
            ] {
                points.push(normalise(joint.x, joint.y));
            }
        }
        HandSnapshot { handedness, score: 1.0, points }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_engine::LandmarkSnapshot;

    use std::time::Duration;

    fn feed() -> (FeedSender, LandmarkFeed) {
        LandmarkFeed::channel()
    }

    #[test]
    fn feed_starts_unavailable_and_keeps_the_newest_frame() {
        let (tx, mut feed) = feed();
        assert_eq!(feed.poll(), Err(Unavailable::CameraUnavailable));

        assert!(tx.send(Err(Unavailable::NoLandmarks)));
        assert!(tx.send(Ok(LandmarkSnapshot::default())));
        assert_eq!(feed.poll(), Ok(LandmarkSnapshot::default()));
        // Nothing new: the same frame again.
        assert_eq!(feed.poll(), Ok(LandmarkSnapshot::default()));
        assert!(!feed.is_closed());
    }

    #[test]
    fn closed_feed_reports_camera_unavailable() {
        let (tx, mut feed) = feed();
        assert!(tx.send(Err(Unavailable::NoLandmarks)));
        drop(tx);
        assert_eq!(feed.poll(), Err(Unavailable::CameraUnavailable));
        assert!(feed.is_closed());
    }

    #[test]
    fn dropping_the_feed_stops_an_idle_producer() {
        let (done_tx, done_rx) = mpsc::channel();
        let feed = spawn_feed("idle", move |tx| {
            // Never sends: only the stop flag can end this loop.
            while !tx.is_stopped() {
                thread::sleep(Duration::from_millis(2));
            }
            assert!(!tx.send(Err(Unavailable::NoLandmarks)));
            let _ = done_tx.send(());
        })
        .unwrap();
        assert!(!feed.stop.load(Ordering::Relaxed));
        drop(feed);
        assert!(done_rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn protocol_lines_decode_or_become_unreadable() {
        assert_eq!(parse_line(r#"{"status":"no_landmarks"}"#), Err(Unavailable::NoLandmarks));
        assert_eq!(parse_line(r#"{"status":"camera_unavailable"}"#), Err(Unavailable::CameraUnavailable));
        assert_eq!(parse_line("not json"), Err(Unavailable::FrameUnreadable));
        assert!(parse_line(r#"{"status":"ok","hands":[{"handedness":"left","points":[]}]}"#).is_ok());
    }

    #[test]
    fn scripted_source_replays_then_runs_dry() {
        let mut src = ScriptedSource::new([Err(Unavailable::FrameUnreadable), Ok(LandmarkSnapshot::default())]);
        assert_eq!(src.remaining(), 2);
        assert_eq!(src.next_frame(), Err(Unavailable::FrameUnreadable));
        assert!(src.next_frame().is_ok());
        assert_eq!(src.next_frame(), Err(Unavailable::NoLandmarks));
        assert_eq!(NullSource.next_frame(), Err(Unavailable::CameraUnavailable));
    }

    #[test]
    fn helper_spawn_failures_are_source_errors() {
        assert!(matches!(JsonLinesSource::spawn("   "), Err(AppError::Source { .. })));
        assert!(matches!(
            JsonLinesSource::spawn("gesture-runner-no-such-helper --fps 30"),
            Err(AppError::Source { .. })
        ));
    }
}
