use std::f64::consts::{FRAC_PI_2, PI, TAU};

use super::track::Track;

/// Lower edge of the folded delta-phi window.
pub const DELTA_PHI_MIN: f64 = -FRAC_PI_2;
/// Upper (exclusive) edge of the folded delta-phi window.
pub const DELTA_PHI_MAX: f64 = 1.5 * PI;

/// Folds a raw azimuthal difference into [-pi/2, 3pi/2), keeping the near-side
/// peak at zero and the away-side peak at pi.
pub fn fold_delta_phi(raw: f64) -> f64 {
    // the min/max guards catch rounding of values one ulp past a window edge
    if raw < DELTA_PHI_MIN {
        let shifted = raw + TAU;
        if shifted < DELTA_PHI_MAX { shifted } else { DELTA_PHI_MIN }
    } else if raw >= DELTA_PHI_MAX {
        (raw - TAU).max(DELTA_PHI_MIN)
    } else {
        raw
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pair<'a> {
    pub trigger: &'a Track,
    pub associate: &'a Track,
    pub delta_eta: f64,
    pub delta_phi: f64,
}

impl<'a> Pair<'a> {
    fn new(trigger: &'a Track, associate: &'a Track) -> Self {
        Self {
            trigger,
            associate,
            delta_eta: trigger.eta - associate.eta,
            delta_phi: fold_delta_phi(associate.phi - trigger.phi),
        }
    }
}

/// Every valid trigger/associate combination of two track collections.
///
/// Pairs with `associate.pt >= trigger.pt` are never produced, and with
/// `exclude_self` neither are pairs sharing a track id. The iterator is lazy
/// and can be cloned to restart from the current position.
#[derive(Debug, Clone)]
pub struct Pairs<'a> {
    triggers: &'a [Track],
    associates: &'a [Track],
    exclude_self: bool,
    trigger_index: usize,
    associate_index: usize,
}

pub fn correlate<'a>(
    triggers: &'a [Track],
    associates: &'a [Track],
    exclude_self: bool,
) -> Pairs<'a> {
    Pairs {
        triggers,
        associates,
        exclude_self,
        trigger_index: 0,
        associate_index: 0,
    }
}

impl Pairs<'_> {
    fn accepts(&self, trigger: &Track, associate: &Track) -> bool {
        if self.exclude_self && trigger.id == associate.id {
            return false;
        }
        associate.pt < trigger.pt
    }
}

impl<'a> Iterator for Pairs<'a> {
    type Item = Pair<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (triggers, associates) = (self.triggers, self.associates);
        while let Some(trigger) = triggers.get(self.trigger_index) {
            while let Some(associate) = associates.get(self.associate_index) {
                self.associate_index += 1;
                if self.accepts(trigger, associate) {
                    return Some(Pair::new(trigger, associate));
                }
            }
            self.trigger_index += 1;
            self.associate_index = 0;
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.trigger_index >= self.triggers.len() {
            return (0, Some(0));
        }
        let remaining = (self.triggers.len() - self.trigger_index - 1) * self.associates.len()
            + (self.associates.len() - self.associate_index);
        (0, Some(remaining))
    }
}
