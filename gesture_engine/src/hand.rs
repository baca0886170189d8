//! Hand shape and left/right side resolution for the hand profiles.
//!
//! The estimator's handedness label is unreliable when a hand crosses the
//! body or two detections overlap, so the side is decided by where the palm
//! sits in the (mirrored) image.  The label only breaks ties.

use crate::landmarks::{hand_index as H, HandSnapshot, Handedness};

/// Squared-distance slack for index..pinky.
pub const FINGER_SLACK: f32 = 1.13;
/// Squared-distance slack for the thumb, judged against its own MCP.
pub const THUMB_SLACK:  f32 = 1.12;

const FINGERS: [(usize, usize); 4] = [
    (H::INDEX_TIP,  H::INDEX_MCP),
    (H::MIDDLE_TIP, H::MIDDLE_MCP),
    (H::RING_TIP,   H::RING_MCP),
    (H::PINKY_TIP,  H::PINKY_MCP),
];

/// Expected palm x for each side of the frame.
const LEFT_CENTER:  f32 = 0.25;
const RIGHT_CENTER: f32 = 0.75;

// ════════════════════════════════════════════════════════════════════════════
// Shape
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandShape {
    Open,
    Fist,
    /// Two extended fingers: neither open nor a fist.
    Partial,
}

fn finger_extended(hand: &HandSnapshot, tip: usize, knuckle: usize, slack: f32) -> bool {
    let wrist = hand.wrist();
    hand.point(tip).dist2(&wrist) > hand.point(knuckle).dist2(&wrist) * slack
}

/// Number of extended digits, thumb included (0..=5).
pub fn extended_fingers(hand: &HandSnapshot) -> u8 {
    let fingers = FINGERS
        .iter()
        .filter(|&&(tip, mcp)| finger_extended(hand, tip, mcp, FINGER_SLACK))
        .count() as u8;
    fingers + finger_extended(hand, H::THUMB_TIP, H::THUMB_MCP, THUMB_SLACK) as u8
}

pub fn hand_shape(hand: &HandSnapshot) -> HandShape {
    match extended_fingers(hand) {
        n if n >= 3 => HandShape::Open,
        n if n <= 1 => HandShape::Fist,
        _           => HandShape::Partial,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Side resolution
// ════════════════════════════════════════════════════════════════════════════

/// At most one hand per side of the frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct SideHands<'a> {
    pub left:  Option<&'a HandSnapshot>,
    pub right: Option<&'a HandSnapshot>,
}

impl<'a> SideHands<'a> {
    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn both(&self) -> Option<(&'a HandSnapshot, &'a HandSnapshot)> {
        self.left.zip(self.right)
    }

    pub fn count(&self) -> usize {
        self.left.is_some() as usize + self.right.is_some() as usize
    }
}

struct Candidate<'a> {
    hand:     &'a HandSnapshot,
    extended: u8,
    x:        f32,
}

/// Pick the better of two candidates for a side: more extended fingers, then
/// nearer the side's centre.
fn better<'a, 'b>(a: &'b Candidate<'a>, b: &'b Candidate<'a>, center: f32) -> bool {
    a.extended > b.extended
        || (a.extended == b.extended && (a.x - center).abs() < (b.x - center).abs())
}

/// Assign detected hands to the left and right side of the frame.
///
/// Hands at or below `min_score`, or without the full point set, are ignored.
pub fn resolve_hands(hands: &[HandSnapshot], min_score: f32) -> SideHands<'_> {
    let mut left:  Option<Candidate> = None;
    let mut right: Option<Candidate> = None;
    let mut losers: Vec<Candidate> = Vec::new();

    for hand in hands.iter().filter(|h| h.score > min_score && h.is_complete()) {
        let (x, _) = hand.palm_center();
        let cand = Candidate { hand, extended: extended_fingers(hand), x };
        let (slot, center) = if x < 0.5 { (&mut left, LEFT_CENTER) } else { (&mut right, RIGHT_CENTER) };
        match slot.take() {
            None => *slot = Some(cand),
            Some(held) => {
                if better(&cand, &held, center) {
                    *slot = Some(cand);
                    losers.push(held);
                } else {
                    *slot = Some(held);
                    losers.push(cand);
                }
            }
        }
    }

    for loser in losers {
        match loser.hand.handedness {
            Handedness::Left if left.is_none()   => left = Some(loser),
            Handedness::Right if right.is_none() => right = Some(loser),
            _ => {}
        }
    }

    SideHands {
        left:  left.map(|c| c.hand),
        right: right.map(|c| c.hand),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::landmarks::Landmark;

    /// Synthetic upright hand with its wrist at (`x`, `y`).  `open` fingers
    /// reach well past their knuckles; closed ones fold back toward the wrist.
    pub(crate) fn synthetic_hand(handedness: Handedness, x: f32, y: f32, open: bool) -> HandSnapshot {
        let mut pts = vec![Landmark::new(x, y, 1.0); H::COUNT];
        let reach = if open { 0.16 } else { 0.06 };
        pts[H::THUMB_MCP]  = Landmark::new(x - 0.04, y - 0.04, 1.0);
        pts[H::THUMB_TIP]  = Landmark::new(x - 0.04 - if open { 0.06 } else { 0.0 }, y - 0.04, 1.0);
        for (i, (tip, mcp)) in FINGERS.iter().enumerate() {
            let fx = x - 0.03 + i as f32 * 0.02;
            pts[*mcp] = Landmark::new(fx, y - 0.09, 1.0);
            pts[*tip] = Landmark::new(fx, y - reach, 1.0);
        }
        HandSnapshot { handedness, score: 0.9, points: pts }
    }

    #[test]
    fn open_and_fist_shapes() {
        assert_eq!(extended_fingers(&synthetic_hand(Handedness::Left, 0.3, 0.6, true)), 5);
        assert_eq!(hand_shape(&synthetic_hand(Handedness::Left, 0.3, 0.6, true)), HandShape::Open);
        assert_eq!(extended_fingers(&synthetic_hand(Handedness::Left, 0.3, 0.6, false)), 0);
        assert_eq!(hand_shape(&synthetic_hand(Handedness::Left, 0.3, 0.6, false)), HandShape::Fist);
    }

    #[test]
    fn sides_follow_image_position_not_label() {
        // Labels swapped relative to position
        let hands = [
            synthetic_hand(Handedness::Right, 0.2, 0.6, true),
            synthetic_hand(Handedness::Left,  0.8, 0.6, true),
        ];
        let sides = resolve_hands(&hands, 0.4);
        assert_eq!(sides.left.map(|h| h.handedness), Some(Handedness::Right));
        assert_eq!(sides.right.map(|h| h.handedness), Some(Handedness::Left));
    }

    #[test]
    fn competing_hands_prefer_more_fingers() {
        let hands = [
            synthetic_hand(Handedness::Left, 0.25, 0.6, false),
            synthetic_hand(Handedness::Left, 0.40, 0.6, true),
        ];
        let sides = resolve_hands(&hands, 0.4);
        assert_eq!(sides.left.map(extended_fingers), Some(5));
        assert!(sides.right.is_none(), "loser labelled left cannot take the right side");
    }

    #[test]
    fn tie_goes_to_hand_nearer_side_centre_and_loser_may_switch_by_label() {
        let hands = [
            synthetic_hand(Handedness::Right, 0.42, 0.6, true),
            synthetic_hand(Handedness::Left,  0.22, 0.6, true),
        ];
        let sides = resolve_hands(&hands, 0.4);
        assert_eq!(sides.left.map(|h| h.handedness), Some(Handedness::Left));
        assert_eq!(sides.right.map(|h| h.handedness), Some(Handedness::Right));
    }

    #[test]
    fn low_score_hands_are_ignored() {
        let mut weak = synthetic_hand(Handedness::Left, 0.2, 0.6, true);
        weak.score = 0.3;
        assert!(resolve_hands(&[weak], 0.4).is_empty());
    }
}
