use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::buffer::PixelBuffer;

/// The current target image plus the pixel indices it actually specifies.
/// Replaced wholesale whenever a new target is announced; never patched.
#[derive(Debug, Clone)]
pub struct TargetState {
    pub target: PixelBuffer,
    pub real_work: Vec<u32>,
}

impl TargetState {
    pub fn new(target: PixelBuffer) -> Self {
        let real_work = real_work(&target);
        TargetState { target, real_work }
    }
}

/// All pixel indices the target specifies a color for (alpha != 0),
/// shuffled so concurrently-scheduled accounts do not all race for the
/// lowest indices.
pub fn real_work(target: &PixelBuffer) -> Vec<u32> {
    let mut work: Vec<u32> = (0..target.pixel_count())
        .filter(|&index| target.alpha(index) != 0)
        .collect();
    work.shuffle(&mut thread_rng());
    work
}

/// Filters the real-work list down to indices where the live canvas
/// disagrees with the target. Colors are compared as canonical hex so
/// alpha differences between the two buffers cannot cause false
/// mismatches. Recomputed fresh every scheduling cycle.
pub fn pending_work(real: &[u32], target: &PixelBuffer, live: &PixelBuffer) -> Vec<u32> {
    real.iter()
        .copied()
        .filter(|&index| index < live.pixel_count() && target.hex(index) != live.hex(index))
        .collect()
}
